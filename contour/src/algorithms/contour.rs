//! Contours: closed, cyclic chains of cubic edges.
//!
//! A contour is immutable once built. Everything an operation learns about
//! it (crossings, overlaps, inside classification) lives in the operation's
//! own tables, keyed by edge handles.

use crate::algorithms::crossing::{crosses_at_point, crosses_at_range};
use crate::algorithms::winding::polygon_signed_area;
use crate::geometry::cubic::CubicBezier;
use crate::geometry::flatten::flatten_curves;
use crate::geometry::intersect::intersect_curves;
use crate::geometry::math::Rect;
use crate::geometry::tolerance::{EPS_AREA, EPS_POINT, RAY_OVERHANG};
use crate::model::{PathCommand, Vec2};

// Flattening tolerance for area and orientation, relative to the contour's extent
const AREA_FLATNESS: f64 = 1e-4;

/// Whether a contour adds material or cuts it away, judged against the
/// other contours of its own graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inside {
    Filled,
    Hole,
}

/// Winding of a contour in y-down path space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContourDirection {
    Clockwise,
    AntiClockwise,
}

/// One edge of a contour together with its neighbours. A standalone curve
/// (a test ray) is its own neighbour on both sides.
#[derive(Clone, Copy, Debug)]
pub struct EdgeView<'a> {
    contour: Option<&'a Contour>,
    index: usize,
    curve: CubicBezier,
}

impl<'a> EdgeView<'a> {
    pub fn of(contour: &'a Contour, index: usize) -> Self {
        Self { contour: Some(contour), index, curve: contour.edges[index] }
    }

    pub fn standalone(curve: CubicBezier) -> EdgeView<'static> {
        EdgeView { contour: None, index: 0, curve }
    }

    pub fn curve(&self) -> &CubicBezier {
        &self.curve
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn previous_nonpoint(&self) -> CubicBezier {
        match self.contour {
            Some(c) => c.edges[c.previous_nonpoint(self.index)],
            None => self.curve,
        }
    }

    pub fn next_nonpoint(&self) -> CubicBezier {
        match self.contour {
            Some(c) => c.edges[c.next_nonpoint(self.index)],
            None => self.curve,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    edges: Vec<CubicBezier>,
    bounds: Rect,
    bounding_rect: Rect,
}

impl Contour {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges<I: IntoIterator<Item = CubicBezier>>(edges: I) -> Self {
        let mut c = Contour::new();
        for e in edges {
            c.add_curve(e);
        }
        c
    }

    pub fn add_curve(&mut self, curve: CubicBezier) {
        self.bounds = self.bounds.union(&curve.bounds());
        self.bounding_rect = self.bounding_rect.union(&curve.bounding_rect());
        self.edges.push(curve);
    }

    /// Join the last edge back to the first with a straight edge when they
    /// don't already meet.
    pub fn close(&mut self) {
        let (Some(first), Some(last)) = (self.edges.first(), self.edges.last()) else {
            return;
        };
        if !first.p0.is_close(last.p3, EPS_POINT) {
            let closing = CubicBezier::line(last.p3, first.p0);
            self.add_curve(closing);
        }
    }

    pub fn edges(&self) -> &[CubicBezier] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    #[inline]
    pub fn next_index(&self, i: usize) -> usize {
        if i + 1 >= self.edges.len() { 0 } else { i + 1 }
    }

    #[inline]
    pub fn previous_index(&self, i: usize) -> usize {
        if i == 0 { self.edges.len().saturating_sub(1) } else { i - 1 }
    }

    /// Next edge that isn't collapsed to a point (or `i` itself when every
    /// other edge is).
    pub fn next_nonpoint(&self, i: usize) -> usize {
        let mut j = self.next_index(i);
        for _ in 0..self.edges.len() {
            if !self.edges[j].is_point() {
                return j;
            }
            j = self.next_index(j);
        }
        j
    }

    pub fn previous_nonpoint(&self, i: usize) -> usize {
        let mut j = self.previous_index(i);
        for _ in 0..self.edges.len() {
            if !self.edges[j].is_point() {
                return j;
            }
            j = self.previous_index(j);
        }
        j
    }

    /// Tight box around the curves.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Box around every control point.
    pub fn bounding_rect(&self) -> Rect {
        self.bounding_rect
    }

    pub fn first_point(&self) -> Option<Vec2> {
        self.edges.first().map(|e| e.p0)
    }

    /// Signed area of the flattened outline; positive when clockwise.
    pub fn signed_area(&self) -> f64 {
        let extent = self.bounds.width().max(self.bounds.height());
        if self.edges.is_empty() || !extent.is_finite() {
            return 0.0;
        }
        polygon_signed_area(&flatten_curves(&self.edges, extent * AREA_FLATNESS))
    }

    /// Encloses no area worth keeping: a point, a line traced there and
    /// back, or a sliver far thinner than its own extent.
    pub fn is_degenerate(&self) -> bool {
        let extent = self.bounds.width().max(self.bounds.height());
        if self.edges.is_empty() || !(extent > EPS_POINT) {
            return true;
        }
        self.signed_area().abs() <= EPS_AREA * extent * extent
    }

    pub fn direction(&self) -> ContourDirection {
        if self.signed_area() >= 0.0 { ContourDirection::Clockwise } else { ContourDirection::AntiClockwise }
    }

    /// Same outline traversed the other way.
    pub fn reversed(&self) -> Contour {
        Contour::from_edges(self.edges.iter().rev().map(|e| e.reversed()))
    }

    pub fn made_clockwise(&self) -> Contour {
        match self.direction() {
            ContourDirection::Clockwise => self.clone(),
            ContourDirection::AntiClockwise => self.reversed(),
        }
    }

    /// Even-odd test against this contour alone.
    pub fn contains_point(&self, point: Vec2) -> bool {
        if !self.bounding_rect.contains_point(point, 0.0) || !self.bounds.contains_point(point, 0.0) {
            return false;
        }
        let ray = horizontal_ray(point, &self.bounds);
        self.intersections_with_ray(&ray) % 2 == 1
    }

    /// Number of times `ray` truly crosses this contour. A crossing through a
    /// vertex shared by two edges counts once; a coincident stretch counts
    /// once when the ray passes through it.
    pub fn intersections_with_ray(&self, ray: &CubicBezier) -> usize {
        let ray_view = EdgeView::standalone(*ray);
        let mut count = 0;
        // (edge index, hit was at the start of that edge)
        let mut first: Option<(usize, bool)> = None;
        // (edge index, hit was at either end of that edge)
        let mut previous: Option<(usize, bool)> = None;

        for (i, edge) in self.edges.iter().enumerate() {
            let view = EdgeView::of(self, i);
            let found = intersect_curves(ray, edge);
            for hit in &found.points {
                if edge.is_point() || !crosses_at_point(&ray_view, &view, hit) {
                    continue;
                }
                // Through a vertex: the neighbouring edge already counted it
                if let (true, Some((prev_edge, prev_at_end))) = (hit.is_at_start_of_curve2(), previous) {
                    if prev_at_end && prev_edge == self.previous_index(i) {
                        continue;
                    }
                } else if let (true, Some((first_edge, first_at_start))) = (hit.is_at_endpoint_of_curve2(), first) {
                    if first_at_start && first_edge == self.next_index(i) {
                        continue;
                    }
                }
                count += 1;
                if first.is_none() {
                    first = Some((i, hit.is_at_start_of_curve2()));
                }
                previous = Some((i, hit.is_at_endpoint_of_curve2()));
            }
            if let Some(range) = found.range {
                if crosses_at_range(&ray_view, &view, &range) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Nearest point on the contour: (edge index, parameter, distance).
    pub fn closest_location(&self, point: Vec2) -> Option<(usize, f64, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (i, e) in self.edges.iter().enumerate() {
            let (t, d) = e.closest_location(point);
            if best.map_or(true, |b| d < b.2) {
                best = Some((i, t, d));
            }
        }
        best
    }

    pub(crate) fn append_path_commands(&self, out: &mut Vec<PathCommand>) {
        let Some(first) = self.edges.first() else {
            return;
        };
        out.push(PathCommand::MoveTo { to: first.p0 });
        for e in &self.edges {
            out.push(PathCommand::CubicTo { ctrl1: e.p1, ctrl2: e.p2, to: e.p3 });
        }
        out.push(PathCommand::Close);
    }
}

/// Straight ray from `point` to just outside `bounds`, leaving towards the
/// nearer horizontal side.
pub(crate) fn horizontal_ray(point: Vec2, bounds: &Rect) -> CubicBezier {
    let x = if point.x > bounds.min_x { bounds.min_x - RAY_OVERHANG } else { bounds.max_x + RAY_OVERHANG };
    CubicBezier::line(point, Vec2::new(x, point.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }

    fn square(x: f64, y: f64, s: f64) -> Contour {
        let pts = [vec2(x, y), vec2(x + s, y), vec2(x + s, y + s), vec2(x, y + s)];
        Contour::from_edges((0..4).map(|i| CubicBezier::line(pts[i], pts[(i + 1) % 4])))
    }

    #[test]
    fn adjacency_wraps() {
        let c = square(0.0, 0.0, 10.0);
        assert_eq!(c.next_index(3), 0);
        assert_eq!(c.previous_index(0), 3);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn close_adds_missing_edge() {
        let mut c = Contour::from_edges([
            CubicBezier::line(vec2(0.0, 0.0), vec2(10.0, 0.0)),
            CubicBezier::line(vec2(10.0, 0.0), vec2(10.0, 10.0)),
        ]);
        c.close();
        assert_eq!(c.len(), 3);
        assert!(c.edges()[2].p3.is_close(vec2(0.0, 0.0), 1e-12));
        c.close();
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn direction_and_reverse() {
        let c = square(0.0, 0.0, 10.0);
        assert_eq!(c.direction(), ContourDirection::Clockwise);
        let r = c.reversed();
        assert_eq!(r.direction(), ContourDirection::AntiClockwise);
        assert!(r.edges()[0].p3.is_close(r.edges()[1].p0, 1e-12));
        assert_eq!(r.made_clockwise().direction(), ContourDirection::Clockwise);
    }

    #[test]
    fn two_edge_lens_has_a_direction() {
        // Both edges bow out, so the end points alone enclose nothing
        let lens = Contour::from_edges([
            CubicBezier::new(vec2(0.0, 0.0), vec2(3.0, -4.0), vec2(7.0, -4.0), vec2(10.0, 0.0)),
            CubicBezier::new(vec2(10.0, 0.0), vec2(7.0, 4.0), vec2(3.0, 4.0), vec2(0.0, 0.0)),
        ]);
        assert!(lens.signed_area() > 0.0);
        assert_eq!(lens.direction(), ContourDirection::Clockwise);
        assert!(lens.reversed().signed_area() < 0.0);
        assert_eq!(lens.reversed().direction(), ContourDirection::AntiClockwise);
        assert!(!lens.is_degenerate());
    }

    #[test]
    fn flat_loops_are_degenerate() {
        // Single edge folded back onto its start
        let folded = Contour::from_edges([CubicBezier::new(
            vec2(6.0, 9.0),
            vec2(6.0 + 2.0 / 3.0, 9.0),
            vec2(6.0 - 2.0 / 3.0, 9.0),
            vec2(6.0, 9.0),
        )]);
        assert!(folded.is_degenerate());
        let there_and_back = Contour::from_edges([
            CubicBezier::line(vec2(0.0, 0.0), vec2(10.0, 0.0)),
            CubicBezier::line(vec2(10.0, 0.0), vec2(0.0, 0.0)),
        ]);
        assert!(there_and_back.is_degenerate());
        assert!(Contour::new().is_degenerate());
        assert!(!square(0.0, 0.0, 1e-3).is_degenerate());
    }

    #[test]
    fn contains_point_even_odd() {
        let c = square(0.0, 0.0, 10.0);
        assert!(c.contains_point(vec2(5.0, 5.0)));
        assert!(c.contains_point(vec2(0.5, 9.5)));
        assert!(!c.contains_point(vec2(15.0, 5.0)));
        assert!(!c.contains_point(vec2(-1.0, 5.0)));
    }

    #[test]
    fn ray_through_vertex_counts_once() {
        // Diamond; a ray through the left vertex passes the contour once
        let pts = [vec2(0.0, 5.0), vec2(5.0, 0.0), vec2(10.0, 5.0), vec2(5.0, 10.0)];
        let c = Contour::from_edges((0..4).map(|i| CubicBezier::line(pts[i], pts[(i + 1) % 4])));
        let ray = CubicBezier::line(vec2(5.0, 5.0), vec2(-10.0, 5.0));
        assert_eq!(c.intersections_with_ray(&ray), 1);
        assert!(c.contains_point(vec2(5.0, 5.0)));
    }

    #[test]
    fn closest_location_on_square() {
        let c = square(0.0, 0.0, 10.0);
        let (edge, t, d) = c.closest_location(vec2(5.0, -2.0)).unwrap();
        assert_eq!(edge, 0);
        assert!((t - 0.5).abs() < 1e-6);
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn path_commands_are_cubic() {
        let c = square(0.0, 0.0, 1.0);
        let mut out = Vec::new();
        c.append_path_commands(&mut out);
        assert_eq!(out.len(), 6);
        assert!(matches!(out[1], PathCommand::CubicTo { .. }));
        assert_eq!(out[5], PathCommand::Close);
    }
}
