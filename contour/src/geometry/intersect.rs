//! Pairwise cubic intersection.
//!
//! Two curves either meet at isolated points (`Intersection`) or share a
//! coincident stretch (`IntersectRange`). The search runs in this order:
//! 1. Bounding boxes reject
//! 2. Endpoint contacts: an endpoint of one curve lying on the other, with
//!    exact end parameters
//! 3. Two distinct contacts whose span lies on both curves form a range
//! 4. Otherwise recursive subdivision down to flat pieces, chord-chord
//!    intersection, then a Newton polish of the parameter pair

use super::cubic::CubicBezier;
use super::math::ParamRange;
use super::tolerance::{
    clamp01, values_close, EPS_BOUNDS, EPS_DENOM, EPS_FLAT, EPS_INTERSECT, EPS_PARAM, EPS_POINT,
    EPS_TANGENT,
};
use crate::model::Vec2;

const MAX_DEPTH: u32 = 64;
const CALL_BUDGET: usize = 20_000;
const NEWTON_ITERS: usize = 8;
const COINCIDENT_SAMPLES: [f64; 3] = [0.25, 0.5, 0.75];

// Robust segment-segment intersection with tolerances.
// Classifies proper crossings, endpoint touches, and collinear overlaps.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegIntersection {
    None,
    // Proper interior intersection (not at endpoints within tolerance)
    Proper { t: f64, u: f64 },
    // Touch at endpoints (may be both endpoints). t/u may be 0 or 1 within tolerance
    Touch { t: f64, u: f64 },
    // Collinear overlapping span: parameter ranges on each segment (inclusive, ordered)
    CollinearOverlap { t0: f64, t1: f64, u0: f64, u1: f64 },
}

#[inline]
fn orient(a: Vec2, b: Vec2, c: Vec2) -> f64 {
    (b - a).cross(c - a)
}

#[inline]
fn within_eps(x: f64, eps: f64) -> bool { x.abs() <= eps }

// Project AB and CD onto the dominant axis of AB and compute parameter ranges for overlap.
fn collinear_overlap(a: Vec2, b: Vec2, c: Vec2, d: Vec2, eps: f64) -> SegIntersection {
    let x_major = (b.x - a.x).abs() >= (b.y - a.y).abs();
    let axis = |p: Vec2| if x_major { p.x } else { p.y };
    let len_ab = axis(b) - axis(a);
    let len_cd = axis(d) - axis(c);
    if within_eps(len_ab, eps) {
        // AB is a point: touch if it projects onto CD
        let u = if within_eps(len_cd, eps) { 0.0 } else { (axis(a) - axis(c)) / len_cd };
        if u < -eps || u > 1.0 + eps {
            return SegIntersection::None;
        }
        return SegIntersection::Touch { t: 0.0, u: clamp01(u) };
    }
    let t_c = (axis(c) - axis(a)) / len_ab; // where C/D project onto AB in t-space
    let t_d = (axis(d) - axis(a)) / len_ab;
    let lo = t_c.min(t_d);
    let hi = t_c.max(t_d);
    if hi < -eps || lo > 1.0 + eps {
        return SegIntersection::None;
    }
    let (lo, hi) = (lo.max(0.0), hi.min(1.0));
    if hi < lo {
        return SegIntersection::None;
    }
    // Map back to u-range linearly along CD
    let to_u = |t: f64| {
        if within_eps(len_cd, eps) { 0.0 } else { (axis(a) + t * len_ab - axis(c)) / len_cd }
    };
    let (u0, u1) = (to_u(lo), to_u(hi));
    SegIntersection::CollinearOverlap { t0: lo, t1: hi, u0: u0.min(u1), u1: u0.max(u1) }
}

/// Intersect segments AB and CD. `eps_pos` is a distance; orientation
/// tests are scaled by segment length.
pub fn intersect_segments(a: Vec2, b: Vec2, c: Vec2, d: Vec2, eps_pos: f64, eps_denom: f64) -> SegIntersection {
    let scale = (b - a).length().max((d - c).length()).max(1.0);
    let eps = eps_pos * scale;

    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);

    // Collinear cases: all orientations ~ 0
    if within_eps(o1, eps) && within_eps(o2, eps) && within_eps(o3, eps) && within_eps(o4, eps) {
        return collinear_overlap(a, b, c, d, eps_pos);
    }

    // o1 and o2 have opposite signs (or zero), and o3, o4 too
    let inter1 = (o1 > 0.0 && o2 < 0.0) || (o1 < 0.0 && o2 > 0.0) || within_eps(o1, eps) || within_eps(o2, eps);
    let inter2 = (o3 > 0.0 && o4 < 0.0) || (o3 < 0.0 && o4 > 0.0) || within_eps(o3, eps) || within_eps(o4, eps);
    if !(inter1 && inter2) {
        return SegIntersection::None;
    }

    let r = b - a;
    let s = d - c;
    let rxs = r.cross(s);
    if within_eps(rxs, eps_denom) {
        // Parallel but not collinear (already handled)
        return SegIntersection::None;
    }
    let qp = c - a;
    let t = qp.cross(s) / rxs;
    let u = qp.cross(r) / rxs;

    let is_touch = within_eps(t, eps_pos) || within_eps(1.0 - t, eps_pos) || within_eps(u, eps_pos) || within_eps(1.0 - u, eps_pos);
    if is_touch {
        SegIntersection::Touch { t: clamp01(t), u: clamp01(u) }
    } else if t >= -eps_pos && t <= 1.0 + eps_pos && u >= -eps_pos && u <= 1.0 + eps_pos {
        SegIntersection::Proper { t, u }
    } else {
        SegIntersection::None
    }
}

/// A single point where two curves meet.
#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub curve1: CubicBezier,
    pub t1: f64,
    pub curve2: CubicBezier,
    pub t2: f64,
}

impl Intersection {
    pub fn new(curve1: CubicBezier, t1: f64, curve2: CubicBezier, t2: f64) -> Self {
        Self { curve1, t1, curve2, t2 }
    }

    pub fn location(&self) -> Vec2 {
        self.curve1.eval(self.t1)
    }

    pub fn is_at_start_of_curve1(&self) -> bool {
        values_close(self.t1, 0.0, EPS_PARAM) || self.curve1.is_point()
    }

    pub fn is_at_stop_of_curve1(&self) -> bool {
        values_close(self.t1, 1.0, EPS_PARAM) || self.curve1.is_point()
    }

    pub fn is_at_start_of_curve2(&self) -> bool {
        values_close(self.t2, 0.0, EPS_PARAM) || self.curve2.is_point()
    }

    pub fn is_at_stop_of_curve2(&self) -> bool {
        values_close(self.t2, 1.0, EPS_PARAM) || self.curve2.is_point()
    }

    pub fn is_at_endpoint_of_curve1(&self) -> bool {
        self.is_at_start_of_curve1() || self.is_at_stop_of_curve1()
    }

    pub fn is_at_endpoint_of_curve2(&self) -> bool {
        self.is_at_start_of_curve2() || self.is_at_stop_of_curve2()
    }

    pub fn is_at_endpoint(&self) -> bool {
        self.is_at_endpoint_of_curve1() || self.is_at_endpoint_of_curve2()
    }

    /// Pieces of the first curve before and after the intersection.
    pub fn curve1_pieces(&self) -> (CubicBezier, CubicBezier) {
        self.curve1.split_at(self.t1)
    }

    pub fn curve2_pieces(&self) -> (CubicBezier, CubicBezier) {
        self.curve2.split_at(self.t2)
    }

    /// Interior touch: the curves share a direction at the point. Meeting at
    /// an endpoint is never tangent here; the crossing test looks at the
    /// neighbouring edges instead.
    pub fn is_tangent(&self) -> bool {
        if self.is_at_endpoint() {
            return false;
        }
        let (l1, r1) = self.curve1_pieces();
        let (l2, r2) = self.curve2_pieces();
        let a = [l1.tangent_from_right_offset(0.0).normalized(), r1.tangent_from_left_offset(0.0).normalized()];
        let b = [l2.tangent_from_right_offset(0.0).normalized(), r2.tangent_from_left_offset(0.0).normalized()];
        a.iter().any(|x| b.iter().any(|y| x.is_close(*y, EPS_TANGENT)))
    }
}

/// Coincident stretch shared by two curves. Both ranges are stored
/// ascending; `reversed` says the second curve runs the other way.
#[derive(Clone, Copy, Debug)]
pub struct IntersectRange {
    pub curve1: CubicBezier,
    pub range1: ParamRange,
    pub curve2: CubicBezier,
    pub range2: ParamRange,
    pub reversed: bool,
}

impl IntersectRange {
    pub fn curve1_left(&self) -> CubicBezier {
        self.curve1.subcurve(ParamRange::new(0.0, self.range1.min))
    }

    pub fn curve1_right(&self) -> CubicBezier {
        self.curve1.subcurve(ParamRange::new(self.range1.max, 1.0))
    }

    pub fn curve2_left(&self) -> CubicBezier {
        self.curve2.subcurve(ParamRange::new(0.0, self.range2.min))
    }

    pub fn curve2_right(&self) -> CubicBezier {
        self.curve2.subcurve(ParamRange::new(self.range2.max, 1.0))
    }

    pub fn is_at_start_of_curve1(&self) -> bool {
        values_close(self.range1.min, 0.0, EPS_PARAM)
    }

    pub fn is_at_stop_of_curve1(&self) -> bool {
        values_close(self.range1.max, 1.0, EPS_PARAM)
    }

    pub fn is_at_start_of_curve2(&self) -> bool {
        values_close(self.range2.min, 0.0, EPS_PARAM)
    }

    pub fn is_at_stop_of_curve2(&self) -> bool {
        values_close(self.range2.max, 1.0, EPS_PARAM)
    }

    /// Parameter on the second curve matching `range1.min` on the first.
    pub fn curve2_param_at_range1_start(&self) -> f64 {
        if self.reversed { self.range2.max } else { self.range2.min }
    }
}

/// Everything two curves have in common.
#[derive(Clone, Debug, Default)]
pub struct CurveIntersections {
    pub points: Vec<Intersection>,
    pub range: Option<IntersectRange>,
}

impl CurveIntersections {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.range.is_none()
    }
}

/// Find where `c1` and `c2` meet.
pub fn intersect_curves(c1: &CubicBezier, c2: &CubicBezier) -> CurveIntersections {
    let mut out = CurveIntersections::default();
    if !c1.bounding_rect().overlaps(&c2.bounding_rect()) {
        return out;
    }

    let contacts = endpoint_contacts(c1, c2);
    if let Some(range) = coincident_range(c1, c2, &contacts) {
        out.range = Some(range);
        return out;
    }

    let mut hits = contacts;
    if !(c1.is_point() || c2.is_point()) {
        let mut search = Subdivision::default();
        search.run(c1, ParamRange::FULL, c2, ParamRange::FULL, 0);
        if search.exhausted {
            tracing::warn!(calls = search.calls, "curve intersection budget exhausted; keeping partial result");
        }
        for (t1, t2) in search.hits {
            if let Some(hit) = polish(c1, c2, t1, t2) {
                push_unique(&mut hits, hit);
            }
        }
    }

    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    out.points = hits
        .into_iter()
        .map(|(t1, t2)| Intersection::new(*c1, t1, *c2, t2))
        .collect();
    out
}

fn push_unique(hits: &mut Vec<(f64, f64)>, hit: (f64, f64)) {
    let dup = hits
        .iter()
        .any(|h| values_close(h.0, hit.0, EPS_PARAM) && values_close(h.1, hit.1, EPS_PARAM));
    if !dup {
        hits.push(hit);
    }
}

#[inline]
fn snap01(t: f64) -> f64 {
    if values_close(t, 0.0, 1e-9) {
        0.0
    } else if values_close(t, 1.0, 1e-9) {
        1.0
    } else {
        t
    }
}

/// Parameter of `p` on `c` when `p` lies on the curve.
fn param_on(c: &CubicBezier, p: Vec2) -> Option<f64> {
    if p.is_close(c.p0, EPS_POINT) {
        return Some(0.0);
    }
    if p.is_close(c.p3, EPS_POINT) {
        return Some(1.0);
    }
    if !c.bounding_rect().contains_point(p, EPS_INTERSECT) {
        return None;
    }
    let (t, d) = c.closest_location(p);
    (d <= EPS_INTERSECT).then_some(snap01(t))
}

fn endpoint_contacts(c1: &CubicBezier, c2: &CubicBezier) -> Vec<(f64, f64)> {
    let mut contacts = Vec::new();
    for (t1, p) in [(0.0, c1.p0), (1.0, c1.p3)] {
        if let Some(t2) = param_on(c2, p) {
            push_unique(&mut contacts, (t1, t2));
        }
    }
    for (t2, p) in [(0.0, c2.p0), (1.0, c2.p3)] {
        if let Some(t1) = param_on(c1, p) {
            push_unique(&mut contacts, (t1, t2));
        }
    }
    contacts
}

/// The contacts bracket a stretch where the curves coincide.
fn coincident_range(c1: &CubicBezier, c2: &CubicBezier, contacts: &[(f64, f64)]) -> Option<IntersectRange> {
    if contacts.len() < 2 {
        return None;
    }
    let lo = contacts.iter().copied().min_by(|a, b| a.0.total_cmp(&b.0))?;
    let hi = contacts.iter().copied().max_by(|a, b| a.0.total_cmp(&b.0))?;
    if hi.0 - lo.0 <= EPS_PARAM || (hi.1 - lo.1).abs() <= EPS_PARAM {
        return None;
    }
    let range2 = ParamRange::new(lo.1.min(hi.1), lo.1.max(hi.1));
    let range1 = ParamRange::new(lo.0, hi.0);

    for s in COINCIDENT_SAMPLES {
        let (t2, d) = c2.closest_location(c1.eval(range1.scale(s)));
        if d > EPS_BOUNDS || t2 < range2.min - EPS_PARAM || t2 > range2.max + EPS_PARAM {
            return None;
        }
        let (t1, d) = c1.closest_location(c2.eval(range2.scale(s)));
        if d > EPS_BOUNDS || t1 < range1.min - EPS_PARAM || t1 > range1.max + EPS_PARAM {
            return None;
        }
    }

    Some(IntersectRange { curve1: *c1, range1, curve2: *c2, range2, reversed: lo.1 > hi.1 })
}

/// Newton iterations on `c1(t1) - c2(t2) = 0`, then acceptance by distance.
fn polish(c1: &CubicBezier, c2: &CubicBezier, t1: f64, t2: f64) -> Option<(f64, f64)> {
    let (mut t1, mut t2) = (t1, t2);
    let mut dist = c1.eval(t1).distance(c2.eval(t2));
    for _ in 0..NEWTON_ITERS {
        if dist <= EPS_DENOM {
            break;
        }
        let f = c1.eval(t1) - c2.eval(t2);
        let d1 = c1.tangent(t1);
        let d2 = -c2.tangent(t2);
        let det = d1.cross(d2);
        if det.abs() <= EPS_DENOM {
            break;
        }
        let b = -f;
        let n1 = clamp01(t1 + b.cross(d2) / det);
        let n2 = clamp01(t2 + d1.cross(b) / det);
        let nd = c1.eval(n1).distance(c2.eval(n2));
        if nd >= dist {
            break;
        }
        t1 = n1;
        t2 = n2;
        dist = nd;
    }
    (dist <= EPS_INTERSECT).then(|| (snap01(t1), snap01(t2)))
}

#[derive(Default)]
struct Subdivision {
    calls: usize,
    exhausted: bool,
    hits: Vec<(f64, f64)>,
}

impl Subdivision {
    fn run(&mut self, a: &CubicBezier, ra: ParamRange, b: &CubicBezier, rb: ParamRange, depth: u32) {
        if self.exhausted {
            return;
        }
        self.calls += 1;
        if self.calls > CALL_BUDGET {
            self.exhausted = true;
            return;
        }
        let ba = a.bounding_rect();
        let bb = b.bounding_rect();
        if !ba.overlaps_within(&bb, EPS_POINT) {
            return;
        }
        let flat = a.flatness() <= EPS_FLAT && b.flatness() <= EPS_FLAT;
        if flat || depth >= MAX_DEPTH {
            self.chord_hits(a, ra, b, rb);
            return;
        }
        let diag_a = ba.width() + ba.height();
        let diag_b = bb.width() + bb.height();
        if diag_a >= diag_b {
            let (l, r) = a.split_at(0.5);
            let mid = ra.average();
            self.run(&l, ParamRange::new(ra.min, mid), b, rb, depth + 1);
            self.run(&r, ParamRange::new(mid, ra.max), b, rb, depth + 1);
        } else {
            let (l, r) = b.split_at(0.5);
            let mid = rb.average();
            self.run(a, ra, &l, ParamRange::new(rb.min, mid), depth + 1);
            self.run(a, ra, &r, ParamRange::new(mid, rb.max), depth + 1);
        }
    }

    fn chord_hits(&mut self, a: &CubicBezier, ra: ParamRange, b: &CubicBezier, rb: ParamRange) {
        match intersect_segments(a.p0, a.p3, b.p0, b.p3, EPS_POINT, EPS_DENOM) {
            SegIntersection::Proper { t, u } | SegIntersection::Touch { t, u } => {
                self.hits.push((ra.scale(t), rb.scale(u)));
            }
            SegIntersection::CollinearOverlap { t0, t1, u0, u1 } => {
                self.hits.push((ra.scale((t0 + t1) * 0.5), rb.scale((u0 + u1) * 0.5)));
            }
            SegIntersection::None => {}
        }
    }
}
