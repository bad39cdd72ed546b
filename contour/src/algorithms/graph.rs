//! `BezierGraph`: the contours of one operand, built from a path.

use crate::algorithms::contour::{Contour, EdgeView};
use crate::algorithms::crossing::{ContourKey, EdgeKey, Operand};
use crate::error::{BooleanError, Result};
use crate::geometry::cubic::CubicBezier;
use crate::geometry::intersect::intersect_curves;
use crate::geometry::limits::{self, MAX_SUBPATHS};
use crate::geometry::math::Rect;
use crate::geometry::tolerance::{
    greater_than, greater_or_close, less_or_close, less_than, EPS_POINT, RAY_OVERHANG,
};
use crate::model::{FillRule, Path, PathCommand, Vec2};
use crate::options::{BooleanOptions, QuadraticPolicy};

// Upper bound on rays cast by `contains_contour` before giving up
const MAX_CONTAINMENT_RAYS: usize = 4096;

/// Nearest point on a graph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveLocation {
    pub contour: usize,
    pub edge: usize,
    pub parameter: f64,
    pub distance: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BezierGraph {
    contours: Vec<Contour>,
    bounds: Rect,
}

impl BezierGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contours(contours: Vec<Contour>) -> Self {
        let mut g = BezierGraph::new();
        for c in contours {
            g.add_contour(c);
        }
        g
    }

    pub fn add_contour(&mut self, contour: Contour) {
        self.bounds = self.bounds.union(&contour.bounds());
        self.contours.push(contour);
    }

    /// Build with the default options (quadratic segments rejected).
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_path_with(path, &BooleanOptions::default())
    }

    pub fn from_path_with(path: &Path, options: &BooleanOptions) -> Result<Self> {
        validate_path(path, options)?;

        let mut graph = BezierGraph::new();
        let mut current: Option<Contour> = None;
        let mut first_point = Vec2::default();
        let mut last_point = Vec2::default();
        let mut subpaths = 0usize;

        for (index, cmd) in path.commands.iter().enumerate() {
            let curve = match *cmd {
                PathCommand::MoveTo { to } => {
                    if let Some(done) = current.take() {
                        graph.finish_contour(done);
                    }
                    subpaths += 1;
                    if subpaths > MAX_SUBPATHS {
                        return Err(BooleanError::TooManySubpaths { limit: MAX_SUBPATHS });
                    }
                    current = Some(Contour::new());
                    first_point = to;
                    last_point = to;
                    continue;
                }
                PathCommand::LineTo { to } => {
                    if to.is_close(last_point, EPS_POINT) {
                        continue;
                    }
                    CubicBezier::line(last_point, to)
                }
                PathCommand::QuadTo { ctrl, to } => match options.quadratics {
                    QuadraticPolicy::Reject => return Err(BooleanError::UnsupportedQuadratic { index }),
                    QuadraticPolicy::Drop => {
                        tracing::warn!(index, "dropping unsupported quadratic segment");
                        continue;
                    }
                    QuadraticPolicy::Elevate => CubicBezier::from_quadratic(last_point, ctrl, to),
                },
                PathCommand::CubicTo { ctrl1, ctrl2, to } => CubicBezier::new(last_point, ctrl1, ctrl2, to),
                PathCommand::Close => {
                    if let Some(done) = current.take() {
                        graph.finish_contour(done);
                    }
                    last_point = first_point;
                    continue;
                }
            };
            if curve.is_point() {
                continue;
            }
            last_point = curve.p3;
            current
                .get_or_insert_with(|| {
                    first_point = curve.p0;
                    Contour::new()
                })
                .add_curve(curve);
        }
        if let Some(done) = current.take() {
            graph.finish_contour(done);
        }
        Ok(graph)
    }

    fn finish_contour(&mut self, mut contour: Contour) {
        contour.close();
        if contour.is_empty() {
            return;
        }
        if contour.is_degenerate() {
            tracing::debug!(edges = contour.len(), "skipping subpath that encloses no area");
            return;
        }
        self.add_contour(contour);
    }

    /// Path with one cubic per edge, even-odd filled.
    pub fn to_path(&self) -> Path {
        let mut commands = Vec::new();
        for c in &self.contours {
            c.append_path_commands(&mut commands);
        }
        Path { commands, fill_rule: FillRule::EvenOdd }
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn contour(&self, index: usize) -> &Contour {
        &self.contours[index]
    }

    pub fn contour_count(&self) -> usize {
        self.contours.len()
    }

    pub fn edge_count(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Tight box around every contour.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn closest_location(&self, point: Vec2) -> Option<CurveLocation> {
        let mut best: Option<CurveLocation> = None;
        for (ci, c) in self.contours.iter().enumerate() {
            if let Some((edge, parameter, distance)) = c.closest_location(point) {
                if best.map_or(true, |b| distance < b.distance) {
                    best = Some(CurveLocation { contour: ci, edge, parameter, distance });
                }
            }
        }
        best
    }

    /// Whether `test` (a contour with no crossings against this graph) lies
    /// inside the region this graph fills.
    ///
    /// Rays are cast across `test` at increasing density. Each ray discards
    /// candidate containers it shows cannot enclose `test`, and the answer
    /// is the parity of the candidates left once a ray settles anything.
    /// When no ray settles anything the contour is reported as not contained.
    pub fn contains_contour(&self, test: &Contour) -> bool {
        let tb = test.bounds();
        if !self.bounds.overlaps(&tb) {
            return false;
        }
        let mut containers: Vec<usize> = (0..self.contours.len()).collect();
        let count = tb.width().ceil().max(tb.height().ceil()).max(1.0) as usize;
        let mut rays = 0usize;

        for fraction in 2..=count.saturating_mul(2).max(2) {
            let mut eliminated = false;

            // Rays at whole fractions of the extent; an axis the test
            // contour has no extent along gets none
            let steps = fraction as f64;
            if tb.height() > EPS_POINT {
                for k in 1..fraction {
                    let y = tb.min_y + tb.height() * k as f64 / steps;
                    let start = Vec2::new(self.bounds.min_x.min(tb.min_x) - RAY_OVERHANG, y);
                    let end = Vec2::new(self.bounds.max_x.max(tb.max_x) + RAY_OVERHANG, y);
                    eliminated |= self.eliminate_containers(&mut containers, test, &CubicBezier::line(start, end), true);
                    rays += 1;
                }
            }
            if tb.width() > EPS_POINT {
                for k in 1..fraction {
                    let x = tb.min_x + tb.width() * k as f64 / steps;
                    let start = Vec2::new(x, self.bounds.min_y.min(tb.min_y) - RAY_OVERHANG);
                    let end = Vec2::new(x, self.bounds.max_y.max(tb.max_y) + RAY_OVERHANG);
                    eliminated |= self.eliminate_containers(&mut containers, test, &CubicBezier::line(start, end), false);
                    rays += 1;
                }
            }

            if containers.is_empty() {
                return false;
            }
            if eliminated {
                return containers.len() % 2 == 1;
            }
            if rays >= MAX_CONTAINMENT_RAYS {
                break;
            }
        }
        tracing::warn!(rays, candidates = containers.len(), "containment scan exhausted; treating contour as not contained");
        false
    }

    /// Narrow `containers` using one axis-aligned ray. Returns false when the
    /// ray tells nothing (it misses `test`, or grazes a container vertex).
    fn eliminate_containers(&self, containers: &mut Vec<usize>, test: &Contour, ray: &CubicBezier, horizontal: bool) -> bool {
        let along = |p: Vec2| if horizontal { p.x } else { p.y };

        // Extent of the test contour along the ray
        let mut extent: Option<(Vec2, Vec2)> = None;
        for edge in test.edges() {
            for hit in intersect_curves(ray, edge).points {
                let p = hit.location();
                extent = Some(match extent {
                    None => (p, p),
                    Some((lo, hi)) => (
                        if along(p) < along(lo) { p } else { lo },
                        if along(p) > along(hi) { p } else { hi },
                    ),
                });
            }
        }
        let Some((test_min, test_max)) = extent else {
            return false;
        };

        // Crossings of the ray with each candidate, outside the test extent
        let mut before: Vec<usize> = Vec::new();
        let mut after: Vec<usize> = Vec::new();
        let mut ambiguous: Vec<usize> = Vec::new();
        for &ci in containers.iter() {
            let container = &self.contours[ci];
            for edge in container.edges() {
                for hit in intersect_curves(ray, edge).points {
                    if hit.is_tangent() {
                        continue;
                    }
                    if hit.is_at_endpoint_of_curve2() {
                        return false;
                    }
                    let v = along(hit.location());
                    if less_than(v, along(test_max), EPS_POINT) && greater_than(v, along(test_min), EPS_POINT) {
                        continue;
                    }
                    if test_min.is_close(test_max, EPS_POINT) && test_max.is_close(hit.location(), EPS_POINT) {
                        ambiguous.push(ci);
                        continue;
                    }
                    if less_or_close(v, along(test_min), EPS_POINT) {
                        before.push(ci);
                    }
                    if greater_or_close(v, along(test_max), EPS_POINT) {
                        after.push(ci);
                    }
                }
            }
        }
        for ci in ambiguous {
            let n_before = before.iter().filter(|&&c| c == ci).count();
            let n_after = after.iter().filter(|&&c| c == ci).count();
            if n_before < n_after {
                before.push(ci);
            } else {
                after.push(ci);
            }
        }

        // A container must be crossed an odd number of times on each side
        remove_even_counts(&mut before);
        remove_even_counts(&mut after);
        let before_only: Vec<usize> = before.iter().copied().filter(|c| !after.contains(c)).collect();
        let after_only: Vec<usize> = after.iter().copied().filter(|c| !before.contains(c)).collect();
        before.retain(|c| !before_only.contains(c));
        after.retain(|c| !after_only.contains(c));

        let mut remaining: Vec<usize> = Vec::new();
        for c in before {
            if !remaining.contains(&c) {
                remaining.push(c);
            }
        }
        *containers = remaining;
        true
    }
}

fn remove_even_counts(crossings: &mut Vec<usize>) {
    let even: Vec<usize> = crossings
        .iter()
        .copied()
        .filter(|c| crossings.iter().filter(|&&o| o == *c).count() % 2 == 0)
        .collect();
    crossings.retain(|c| !even.contains(c));
}

pub(crate) fn validate_path(path: &Path, options: &BooleanOptions) -> Result<()> {
    if path.commands.len() > options.max_commands {
        return Err(BooleanError::TooManyCommands { limit: options.max_commands });
    }
    for (index, cmd) in path.commands.iter().enumerate() {
        for p in cmd.points() {
            for value in [p.x, p.y] {
                if !value.is_finite() {
                    return Err(BooleanError::NonFiniteCoordinate { index });
                }
                if !limits::in_coord_bounds(value) {
                    return Err(BooleanError::CoordinateOutOfRange { index, value });
                }
            }
        }
    }
    Ok(())
}

/// The two graphs of one operation, addressed through handles.
#[derive(Clone, Copy, Debug)]
pub struct Operands<'a> {
    pub subject: &'a BezierGraph,
    pub clip: &'a BezierGraph,
}

impl<'a> Operands<'a> {
    pub fn new(subject: &'a BezierGraph, clip: &'a BezierGraph) -> Self {
        Self { subject, clip }
    }

    pub fn graph(&self, operand: Operand) -> &'a BezierGraph {
        match operand {
            Operand::Subject => self.subject,
            Operand::Clip => self.clip,
        }
    }

    pub fn contour(&self, key: ContourKey) -> &'a Contour {
        self.graph(key.operand).contour(key.contour)
    }

    pub fn curve(&self, key: EdgeKey) -> &'a CubicBezier {
        &self.contour(key.contour_key()).edges()[key.edge]
    }

    pub fn view(&self, key: EdgeKey) -> EdgeView<'a> {
        EdgeView::of(self.contour(key.contour_key()), key.edge)
    }

    pub fn next_edge(&self, key: EdgeKey) -> EdgeKey {
        let edge = self.contour(key.contour_key()).next_index(key.edge);
        EdgeKey { edge, ..key }
    }

    pub fn previous_edge(&self, key: EdgeKey) -> EdgeKey {
        let edge = self.contour(key.contour_key()).previous_index(key.edge);
        EdgeKey { edge, ..key }
    }

    /// Every contour handle of one operand.
    pub fn contour_keys(&self, operand: Operand) -> impl Iterator<Item = ContourKey> + 'a {
        (0..self.graph(operand).contour_count()).map(move |contour| ContourKey { operand, contour })
    }

    /// Every edge handle of one contour.
    pub fn edge_keys(&self, key: ContourKey) -> impl Iterator<Item = EdgeKey> + 'a {
        (0..self.contour(key).len()).map(move |edge| EdgeKey::new(key, edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }

    #[test]
    fn rect_becomes_four_edges() {
        let g = BezierGraph::from_path(&Path::rect(0.0, 0.0, 10.0, 5.0)).unwrap();
        assert_eq!(g.contour_count(), 1);
        assert_eq!(g.edge_count(), 4);
        let b = g.bounds();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 10.0, 5.0));
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0)
            .line_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .cubic_to(10.0, 0.0, 10.0, 0.0, 10.0, 0.0)
            .line_to(10.0, 10.0)
            .close();
        let g = BezierGraph::from_path(&p).unwrap();
        assert_eq!(g.edge_count(), 3);
    }

    #[test]
    fn zero_area_subpaths_are_skipped() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).line_to(10.0, 0.0).close();
        p.move_to(0.0, 5.0).line_to(10.0, 5.0).line_to(4.0, 5.0).close();
        p.commands.extend(Path::rect(0.0, 20.0, 1.0, 1.0).commands);
        let g = BezierGraph::from_path(&p).unwrap();
        assert_eq!(g.contour_count(), 1);
        assert_eq!(g.contour(0).len(), 4);
    }

    #[test]
    fn thin_contour_is_checked_for_containment() {
        // Nearly flat contour whose height is below any useful ray spacing
        let outer = BezierGraph::from_path(&Path::rect(0.0, 0.0, 20.0, 20.0)).unwrap();
        let sliver = Contour::from_edges([
            CubicBezier::line(vec2(2.0, 9.0), vec2(12.0, 9.0)),
            CubicBezier::line(vec2(12.0, 9.0), vec2(12.0, 9.0 + 1e-15)),
            CubicBezier::line(vec2(12.0, 9.0 + 1e-15), vec2(2.0, 9.0)),
        ]);
        assert!(outer.contains_contour(&sliver));
    }

    #[test]
    fn move_closes_previous_contour() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).line_to(10.0, 0.0).line_to(10.0, 10.0);
        p.move_to(20.0, 0.0).line_to(30.0, 0.0).line_to(30.0, 10.0).close();
        let g = BezierGraph::from_path(&p).unwrap();
        assert_eq!(g.contour_count(), 2);
        assert_eq!(g.contour(0).len(), 3);
        assert!(g.contour(0).edges()[2].p3.is_close(vec2(0.0, 0.0), 1e-12));
    }

    #[test]
    fn quadratics_follow_policy() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).quad_to(5.0, 10.0, 10.0, 0.0).close();
        assert_eq!(
            BezierGraph::from_path(&p).unwrap_err(),
            BooleanError::UnsupportedQuadratic { index: 1 }
        );
        let dropped = BezierGraph::from_path_with(&p, &BooleanOptions::default().with_quadratics(QuadraticPolicy::Drop)).unwrap();
        assert_eq!(dropped.contour_count(), 0);
        let elevated = BezierGraph::from_path_with(&p, &BooleanOptions::default().with_quadratics(QuadraticPolicy::Elevate)).unwrap();
        assert_eq!(elevated.edge_count(), 2);
    }

    #[test]
    fn non_finite_rejected() {
        let mut p = Path::new();
        p.move_to(0.0, 0.0).line_to(f64::NAN, 1.0);
        assert_eq!(BezierGraph::from_path(&p).unwrap_err(), BooleanError::NonFiniteCoordinate { index: 1 });
    }

    #[test]
    fn to_path_is_cubic_even_odd() {
        let g = BezierGraph::from_path(&Path::rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        let p = g.to_path();
        assert_eq!(p.fill_rule, FillRule::EvenOdd);
        assert!(p.commands.iter().all(|c| !matches!(c, PathCommand::LineTo { .. })));
        assert_eq!(p.commands.len(), 6);
    }

    #[test]
    fn contains_contour_nested_and_disjoint() {
        let outer = BezierGraph::from_path(&Path::rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let inner = BezierGraph::from_path(&Path::rect(2.0, 2.0, 4.0, 4.0)).unwrap();
        let far = BezierGraph::from_path(&Path::rect(20.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(outer.contains_contour(inner.contour(0)));
        assert!(!inner.contains_contour(outer.contour(0)));
        assert!(!outer.contains_contour(far.contour(0)));
    }

    #[test]
    fn contains_contour_inside_hole_is_not_contained() {
        let mut p = Path::rect(0.0, 0.0, 20.0, 20.0);
        p.commands.extend(Path::rect(5.0, 5.0, 10.0, 10.0).commands);
        let ring = BezierGraph::from_path(&p).unwrap();
        let island = BezierGraph::from_path(&Path::rect(8.0, 8.0, 2.0, 2.0)).unwrap();
        assert!(!ring.contains_contour(island.contour(0)));
    }

    #[test]
    fn closest_location_reports_contour() {
        let mut p = Path::rect(0.0, 0.0, 10.0, 10.0);
        p.commands.extend(Path::rect(20.0, 0.0, 10.0, 10.0).commands);
        let g = BezierGraph::from_path(&p).unwrap();
        let loc = g.closest_location(vec2(31.0, 5.0)).unwrap();
        assert_eq!(loc.contour, 1);
        assert!((loc.distance - 1.0).abs() < 1e-6);
    }
}
