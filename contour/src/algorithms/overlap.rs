//! Coincident stretches between two contours.
//!
//! Every `IntersectRange` found between an edge of one contour and an edge
//! of another becomes an `EdgeOverlap`. Overlaps that follow on from each
//! other along the first contour are chained into an `OverlapRun`, and all
//! runs between one contour pair live in a `ContourOverlap`. A run that
//! wraps all the way round means the two contours are the same outline.

use crate::algorithms::crossing::{ContourKey, Crossing, EdgeKey};
use crate::algorithms::graph::Operands;
use crate::geometry::cubic::CubicBezier;
use crate::geometry::intersect::IntersectRange;
use crate::geometry::math::{side_of_corner, ParamRange};
use crate::geometry::tolerance::{greater_than, less_than, values_close, EPS_OVERLAP, EPS_PARAM, TANGENT_PROBE_STEPS};
use crate::model::Vec2;
use tracing::debug;

/// One coincident stretch between `edge1` (first contour) and `edge2`.
#[derive(Clone, Copy, Debug)]
pub struct EdgeOverlap {
    pub edge1: EdgeKey,
    pub edge2: EdgeKey,
    pub range: IntersectRange,
}

impl EdgeOverlap {
    pub fn new(range: IntersectRange, edge1: EdgeKey, edge2: EdgeKey) -> Self {
        Self { edge1, edge2, range }
    }

    /// `next` carries on directly from where this overlap stops.
    pub fn fits_before(&self, next: &EdgeOverlap, ops: &Operands) -> bool {
        if values_close(self.range.range1.max, 1.0, EPS_OVERLAP) {
            return next.edge1 == ops.next_edge(self.edge1) && values_close(next.range.range1.min, 0.0, EPS_OVERLAP);
        }
        next.edge1 == self.edge1 && values_close(next.range.range1.min, self.range.range1.max, EPS_OVERLAP)
    }

    /// This overlap carries on directly from where `previous` stops.
    pub fn fits_after(&self, previous: &EdgeOverlap, ops: &Operands) -> bool {
        if values_close(self.range.range1.min, 0.0, EPS_OVERLAP) {
            return previous.edge1 == ops.previous_edge(self.edge1)
                && values_close(previous.range.range1.max, 1.0, EPS_OVERLAP);
        }
        previous.edge1 == self.edge1 && values_close(previous.range.range1.max, self.range.range1.min, EPS_OVERLAP)
    }

    /// Whether `parameter` on `edge` lies inside the stretch. A side that
    /// the run continues past is open to the end of the edge; a side that
    /// ends the run excludes its boundary.
    pub fn does_contain_parameter(&self, parameter: f64, edge: EdgeKey, extends_before: bool, extends_after: bool) -> bool {
        let range = if edge == self.edge1 {
            self.range.range1
        } else if edge == self.edge2 {
            self.range.range2
        } else {
            return false;
        };
        contains_parameter(range, parameter, extends_before, extends_after)
    }
}

fn contains_parameter(range: ParamRange, parameter: f64, extends_before: bool, extends_after: bool) -> bool {
    if extends_before && extends_after {
        return true;
    }
    let in_left = if extends_before { parameter >= 0.0 } else { greater_than(parameter, range.min, EPS_PARAM) };
    let in_right = if extends_after { parameter <= 1.0 } else { less_than(parameter, range.max, EPS_PARAM) };
    in_left && in_right
}

/// Overlaps chained end to end along the first contour.
#[derive(Clone, Debug, Default)]
pub struct OverlapRun {
    overlaps: Vec<EdgeOverlap>,
}

impl OverlapRun {
    pub fn overlaps(&self) -> &[EdgeOverlap] {
        &self.overlaps
    }

    /// Add `overlap` at either end of the run if it fits there.
    pub fn insert_overlap(&mut self, overlap: EdgeOverlap, ops: &Operands) -> bool {
        let (Some(first), Some(last)) = (self.overlaps.first(), self.overlaps.last()) else {
            self.overlaps.push(overlap);
            return true;
        };
        if overlap.fits_after(last, ops) {
            self.overlaps.push(overlap);
            return true;
        }
        if overlap.fits_before(first, ops) {
            self.overlaps.insert(0, overlap);
            return true;
        }
        false
    }

    /// The run wraps round the whole first contour.
    pub fn is_complete(&self, ops: &Operands) -> bool {
        match (self.overlaps.first(), self.overlaps.last()) {
            (Some(first), Some(last)) => first.fits_after(last, ops),
            _ => false,
        }
    }

    pub fn contour1(&self) -> Option<ContourKey> {
        self.overlaps.first().map(|o| o.edge1.contour_key())
    }

    pub fn contour2(&self) -> Option<ContourKey> {
        self.overlaps.first().map(|o| o.edge2.contour_key())
    }

    /// Where the run begins along the first contour, as
    /// `(edge1, parameter1, edge2, parameter2)`.
    pub fn start(&self) -> Option<(EdgeKey, f64, EdgeKey, f64)> {
        let first = self.overlaps.first()?;
        Some((first.edge1, first.range.range1.min, first.edge2, first.range.curve2_param_at_range1_start()))
    }

    /// Treating the whole run as one point, do the two contours swap sides
    /// across it? The second contour must leave the first on one side at
    /// the run's start and on the other side at its end.
    pub fn is_crossing(&self, ops: &Operands) -> bool {
        let (Some(first), Some(last)) = (self.overlaps.first(), self.overlaps.last()) else {
            return false;
        };

        let before1 = if first.range.is_at_start_of_curve1() {
            ops.view(first.edge1).previous_nonpoint()
        } else {
            first.range.curve1_left()
        };
        let after1 = if last.range.is_at_stop_of_curve1() {
            ops.view(last.edge1).next_nonpoint()
        } else {
            last.range.curve1_right()
        };
        let head = first.range.curve1.subcurve(first.range.range1);
        let tail = last.range.curve1.subcurve(last.range.range1);

        let before2 = |o: &EdgeOverlap| {
            if o.range.is_at_start_of_curve2() {
                ops.view(o.edge2).previous_nonpoint()
            } else {
                o.range.curve2_left()
            }
        };
        let after2 = |o: &EdgeOverlap| {
            if o.range.is_at_stop_of_curve2() {
                ops.view(o.edge2).next_nonpoint()
            } else {
                o.range.curve2_right()
            }
        };
        // Where the second contour comes off the run, at each end of it
        let (off_start, off_end) = if first.range.reversed {
            (Arm::Leaving(after2(first)), Arm::Arriving(before2(last)))
        } else {
            (Arm::Arriving(before2(first)), Arm::Leaving(after2(last)))
        };

        let at_start = side_at(Arm::Arriving(before1), Arm::Leaving(head), off_start);
        let at_end = side_at(Arm::Arriving(tail), Arm::Leaving(after1), off_end);
        match (at_start, at_end) {
            (Some(a), Some(b)) => a != b,
            _ => {
                debug!(contour1 = ?first.edge1.contour_key(), contour2 = ?first.edge2.contour_key(), "run ends stay tangent, treating run as a touch");
                false
            }
        }
    }

    pub fn does_contain_crossing(&self, crossing: &Crossing) -> bool {
        self.does_contain_parameter(crossing.parameter, crossing.edge)
    }

    pub fn does_contain_parameter(&self, parameter: f64, edge: EdgeKey) -> bool {
        let last = self.overlaps.len().saturating_sub(1);
        self.overlaps.iter().enumerate().any(|(i, o)| {
            let (before, after) = if edge == o.edge1 || !o.range.reversed { (i > 0, i < last) } else { (i < last, i > 0) };
            o.does_contain_parameter(parameter, edge, before, after)
        })
    }
}

/// A curve meeting a run end, leaving from its start or arriving at its end.
#[derive(Clone, Copy)]
enum Arm {
    Leaving(CubicBezier),
    Arriving(CubicBezier),
}

impl Arm {
    fn curve(&self) -> &CubicBezier {
        match self {
            Arm::Leaving(c) | Arm::Arriving(c) => c,
        }
    }

    /// Direction away from the run end, sampled `offset` along the curve.
    fn direction(&self, offset: f64) -> Vec2 {
        match self {
            Arm::Leaving(c) => c.tangent_from_left_offset(offset),
            Arm::Arriving(c) => c.tangent_from_right_offset(offset),
        }
    }
}

/// Side of the first contour's corner (`back`, `forward`) that `other`
/// comes off on, sampling further along the curves while they run together.
fn side_at(back: Arm, forward: Arm, other: Arm) -> Option<bool> {
    let reach = back.curve().length().min(forward.curve().length()).min(other.curve().length());
    (0..=TANGENT_PROBE_STEPS).find_map(|step| {
        let offset = reach * f64::from(step) / f64::from(TANGENT_PROBE_STEPS);
        side_of_corner(back.direction(offset), forward.direction(offset), other.direction(offset))
    })
}

/// Every run between one pair of contours.
#[derive(Clone, Debug, Default)]
pub struct ContourOverlap {
    runs: Vec<OverlapRun>,
}

impl ContourOverlap {
    pub fn add_overlap(&mut self, range: IntersectRange, edge1: EdgeKey, edge2: EdgeKey, ops: &Operands) {
        let overlap = EdgeOverlap::new(range, edge1, edge2);
        let inserted = match self.runs.len() {
            0 => false,
            1 => self.runs[0].insert_overlap(overlap, ops),
            n => self.runs[n - 1].insert_overlap(overlap, ops) || self.runs[0].insert_overlap(overlap, ops),
        };
        if !inserted {
            let mut run = OverlapRun::default();
            run.insert_overlap(overlap, ops);
            self.runs.push(run);
        }
    }

    /// Join runs that turn out to continue one another, which happens when
    /// a run wraps past the first contour's start edge or its pieces were
    /// found out of order.
    pub fn join_runs(&mut self, ops: &Operands) {
        loop {
            let joinable = (0..self.runs.len()).find_map(|i| {
                let last = self.runs[i].overlaps.last()?;
                (0..self.runs.len()).find(|&j| {
                    j != i && self.runs[j].overlaps.first().is_some_and(|first| last.fits_before(first, ops))
                })
                .map(|j| (i, j))
            });
            let Some((i, j)) = joinable else {
                return;
            };
            let tail = std::mem::take(&mut self.runs[j].overlaps);
            self.runs[i].overlaps.extend(tail);
            self.runs.remove(j);
        }
    }

    pub fn runs(&self) -> &[OverlapRun] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The two contours coincide all the way round.
    pub fn is_complete(&self, ops: &Operands) -> bool {
        self.runs.len() == 1 && self.runs[0].is_complete(ops)
    }

    pub fn contour1(&self) -> Option<ContourKey> {
        self.runs.first().and_then(OverlapRun::contour1)
    }

    pub fn contour2(&self) -> Option<ContourKey> {
        self.runs.first().and_then(OverlapRun::contour2)
    }

    pub fn is_between(&self, a: ContourKey, b: ContourKey) -> bool {
        match (self.contour1(), self.contour2()) {
            (Some(c1), Some(c2)) => (c1 == a && c2 == b) || (c1 == b && c2 == a),
            _ => false,
        }
    }

    pub fn does_contain_crossing(&self, crossing: &Crossing) -> bool {
        self.runs.iter().any(|r| r.does_contain_crossing(crossing))
    }

    pub fn does_contain_parameter(&self, parameter: f64, edge: EdgeKey) -> bool {
        self.runs.iter().any(|r| r.does_contain_parameter(parameter, edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::crossing::Operand;
    use crate::algorithms::graph::BezierGraph;
    use crate::geometry::intersect::intersect_curves;
    use crate::model::Path;

    fn overlap_between(ops: &Operands) -> ContourOverlap {
        let c1 = ContourKey { operand: Operand::Subject, contour: 0 };
        let c2 = ContourKey { operand: Operand::Clip, contour: 0 };
        let mut overlap = ContourOverlap::default();
        for e1 in ops.edge_keys(c1) {
            for e2 in ops.edge_keys(c2) {
                if let Some(range) = intersect_curves(ops.curve(e1), ops.curve(e2)).range {
                    overlap.add_overlap(range, e1, e2, ops);
                }
            }
        }
        overlap
    }

    fn graphs(a: Path, b: Path) -> (BezierGraph, BezierGraph) {
        (BezierGraph::from_path(&a).unwrap(), BezierGraph::from_path(&b).unwrap())
    }

    #[test]
    fn shared_partial_edge_is_one_crossing_run() {
        let (a, b) = graphs(Path::rect(0.0, 0.0, 10.0, 13.0), Path::rect(5.0, 0.0, 7.0, 8.0));
        let ops = Operands::new(&a, &b);
        let overlap = overlap_between(&ops);
        assert_eq!(overlap.runs().len(), 1);
        assert!(!overlap.is_complete(&ops));
        let run = &overlap.runs()[0];
        assert!(run.is_crossing(&ops));

        let (e1, t1, e2, t2) = run.start().unwrap();
        assert!(ops.curve(e1).eval(t1).is_close(Vec2::new(5.0, 0.0), 1e-6));
        assert!(ops.curve(e2).eval(t2).is_close(Vec2::new(5.0, 0.0), 1e-6));
    }

    #[test]
    fn outside_touch_is_not_crossing() {
        let (a, b) = graphs(Path::rect(0.0, 0.0, 10.0, 10.0), Path::rect(2.0, -5.0, 4.0, 5.0));
        let ops = Operands::new(&a, &b);
        let overlap = overlap_between(&ops);
        assert_eq!(overlap.runs().len(), 1);
        assert!(overlap.runs()[0].overlaps()[0].range.reversed);
        assert!(!overlap.runs()[0].is_crossing(&ops));
    }

    #[test]
    fn identical_contours_are_complete() {
        let (a, b) = graphs(Path::rect(0.0, 0.0, 10.0, 10.0), Path::rect(0.0, 0.0, 10.0, 10.0));
        let ops = Operands::new(&a, &b);
        let overlap = overlap_between(&ops);
        assert!(overlap.is_complete(&ops));
        assert!(overlap.is_between(
            ContourKey { operand: Operand::Clip, contour: 0 },
            ContourKey { operand: Operand::Subject, contour: 0 },
        ));
    }

    #[test]
    fn reversed_identical_contours_are_complete() {
        let a = BezierGraph::from_path(&Path::rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = BezierGraph::with_contours(vec![a.contour(0).reversed()]);
        let ops = Operands::new(&a, &b);
        assert!(overlap_between(&ops).is_complete(&ops));
    }

    #[test]
    fn run_interior_contains_parameters_but_not_boundaries() {
        let (a, b) = graphs(Path::rect(0.0, 0.0, 10.0, 13.0), Path::rect(5.0, 0.0, 7.0, 8.0));
        let ops = Operands::new(&a, &b);
        let overlap = overlap_between(&ops);
        let top = EdgeKey { operand: Operand::Subject, contour: 0, edge: 0 };
        assert!(overlap.does_contain_parameter(0.75, top));
        assert!(!overlap.does_contain_parameter(0.5, top));
        assert!(!overlap.does_contain_parameter(0.25, top));
        assert!(!overlap.does_contain_parameter(1.0, top));
    }

    #[test]
    fn contains_parameter_rules() {
        let r = ParamRange::new(0.25, 0.75);
        assert!(contains_parameter(r, 0.5, false, false));
        assert!(!contains_parameter(r, 0.25, false, false));
        assert!(contains_parameter(r, 0.1, true, false));
        assert!(contains_parameter(r, 0.9, false, true));
        assert!(contains_parameter(r, 0.0, true, true));
    }
}
