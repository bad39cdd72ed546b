//! Crossing classification and the crossing record.
//!
//! Not every place two contours meet is a crossing. Touching without
//! passing through (tangency, or a vertex resting on the other contour)
//! must not produce one, or the result walk would switch contours where the
//! outlines never actually swap sides.

use crate::algorithms::contour::EdgeView;
use crate::geometry::cubic::CubicBezier;
use crate::geometry::intersect::{IntersectRange, Intersection};
use crate::geometry::math::{tangents_ambiguous, tangents_cross, TangentPair};
use crate::geometry::tolerance::{values_close, EPS_PARAM, TANGENT_PROBE_STEPS};
use crate::model::Vec2;

/// Which operand graph a handle points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operand {
    Subject,
    Clip,
}

impl Operand {
    #[inline]
    pub fn slot(self) -> usize {
        match self {
            Operand::Subject => 0,
            Operand::Clip => 1,
        }
    }

    pub fn other(self) -> Operand {
        match self {
            Operand::Subject => Operand::Clip,
            Operand::Clip => Operand::Subject,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContourKey {
    pub operand: Operand,
    pub contour: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub operand: Operand,
    pub contour: usize,
    pub edge: usize,
}

impl EdgeKey {
    pub fn new(contour: ContourKey, edge: usize) -> Self {
        Self { operand: contour.operand, contour: contour.contour, edge }
    }

    pub fn contour_key(&self) -> ContourKey {
        ContourKey { operand: self.operand, contour: self.contour }
    }
}

/// Index into an operation's crossing arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrossingId(pub usize);

/// One side of a crossing: the point where `edge` passes through another
/// contour. Crossings always come in pairs linked through `counterpart`.
#[derive(Clone, Debug)]
pub struct Crossing {
    pub edge: EdgeKey,
    pub curve: CubicBezier,
    pub parameter: f64,
    pub location: Vec2,
    pub counterpart: CrossingId,
    pub entry: bool,
    pub processed: bool,
    pub self_crossing: bool,
    pub from_overlap: bool,
}

impl Crossing {
    pub fn is_at_start(&self) -> bool {
        values_close(self.parameter, 0.0, EPS_PARAM) || self.curve.is_point()
    }

    pub fn is_at_end(&self) -> bool {
        values_close(self.parameter, 1.0, EPS_PARAM) || self.curve.is_point()
    }

    /// Part of the edge before the crossing; none when the crossing sits on
    /// the start.
    pub fn left_curve(&self) -> Option<CubicBezier> {
        (!self.is_at_start()).then(|| self.curve.split_at(self.parameter).0)
    }

    /// Part of the edge after the crossing; none when it sits on the end.
    pub fn right_curve(&self) -> Option<CubicBezier> {
        (!self.is_at_end()).then(|| self.curve.split_at(self.parameter).1)
    }
}

/// Pieces on either side of a point intersection, per curve.
fn point_tangent_curves(view: &EdgeView, t: f64, at_start: bool, at_stop: bool) -> (CubicBezier, CubicBezier) {
    if at_start {
        (view.previous_nonpoint(), *view.curve())
    } else if at_stop {
        (*view.curve(), view.next_nonpoint())
    } else {
        view.curve().split_at(t)
    }
}

/// Does `edge1` pass through `edge2` at `hit`? `hit.curve1` belongs to
/// `edge1`.
pub fn crosses_at_point(edge1: &EdgeView, edge2: &EdgeView, hit: &Intersection) -> bool {
    if hit.is_tangent() {
        return false;
    }
    // Strictly inside both curves: a transversal crossing
    if !hit.is_at_endpoint() {
        return true;
    }
    let (l1, r1) = point_tangent_curves(edge1, hit.t1, hit.is_at_start_of_curve1(), hit.is_at_stop_of_curve1());
    let (l2, r2) = point_tangent_curves(edge2, hit.t2, hit.is_at_start_of_curve2(), hit.is_at_stop_of_curve2());
    let (t1, t2, ambiguous) = probe_tangents(&l1, &r1, &l2, &r2);
    // Directions that never separate mean the curves run along each other
    // here; a coincident run settles whether that stretch is a crossing.
    !ambiguous && tangents_cross(&t1, &t2)
}

/// Curves leading into and out of a coincident stretch, per side.
fn range_tangent_curves(
    view: &EdgeView,
    at_start: bool,
    at_stop: bool,
    left: impl FnOnce() -> CubicBezier,
    right: impl FnOnce() -> CubicBezier,
) -> (CubicBezier, CubicBezier) {
    let l = if at_start { view.previous_nonpoint() } else { left() };
    let r = if at_stop { view.next_nonpoint() } else { right() };
    (l, r)
}

/// Does `edge1` pass through `edge2` across the coincident stretch `range`,
/// treating the stretch as a single point?
pub fn crosses_at_range(edge1: &EdgeView, edge2: &EdgeView, range: &IntersectRange) -> bool {
    let (l1, r1) = range_tangent_curves(
        edge1,
        range.is_at_start_of_curve1(),
        range.is_at_stop_of_curve1(),
        || range.curve1_left(),
        || range.curve1_right(),
    );
    let (l2, r2) = range_tangent_curves(
        edge2,
        range.is_at_start_of_curve2(),
        range.is_at_stop_of_curve2(),
        || range.curve2_left(),
        || range.curve2_right(),
    );
    let (t1, t2, ambiguous) = probe_tangents(&l1, &r1, &l2, &r2);
    !ambiguous && tangents_cross(&t1, &t2)
}

/// Tangents of two left/right curve pairs meeting at a point, moved
/// further from the point while the directions are too close to compare.
/// The probe never goes past the shortest of the four curves, and takes a
/// fixed number of steps to get there whatever the coordinate scale. The
/// flag says whether the final pair is still ambiguous.
pub fn probe_tangents(
    l1: &CubicBezier,
    r1: &CubicBezier,
    l2: &CubicBezier,
    r2: &CubicBezier,
) -> (TangentPair, TangentPair, bool) {
    let max_offset = l1.length().min(r1.length()).min(l2.length()).min(r2.length());
    let tangents_at = |offset: f64| {
        let t1 = TangentPair { left: l1.tangent_from_right_offset(offset), right: r1.tangent_from_left_offset(offset) };
        let t2 = TangentPair { left: l2.tangent_from_right_offset(offset), right: r2.tangent_from_left_offset(offset) };
        (t1, t2)
    };
    let (mut t1, mut t2) = tangents_at(0.0);
    for step in 1..=TANGENT_PROBE_STEPS {
        if !tangents_ambiguous(&t1, &t2) {
            return (t1, t2, false);
        }
        (t1, t2) = tangents_at(max_offset * f64::from(step) / f64::from(TANGENT_PROBE_STEPS));
    }
    let ambiguous = tangents_ambiguous(&t1, &t2);
    (t1, t2, ambiguous)
}
