//! Boolean operations on shapes (union, intersect, difference, XOR).
//!
//! Each operation:
//! 1. Finds the crossings and coincident runs between the two graphs
//! 2. Classifies every contour as filled or hole within its own graph
//! 3. Marks each crossing as entry or exit for the region being kept
//! 4. Walks the crossings to build the contours that intersect
//! 5. Merges in the contours that cross nothing, by containment
//!
//! Operand graphs are never modified, so one graph can feed any number of
//! operations.

use crate::algorithms::annotate::Annotations;
use crate::algorithms::contour::{Contour, ContourDirection};
use crate::algorithms::crossing::{ContourKey, Operand};
use crate::algorithms::graph::{BezierGraph, Operands};
use crate::algorithms::walk::assemble;
use crate::error::Result;
use crate::geometry::tolerance::EPS_BOUNDS;
use crate::model::{Path, Vec2};
use crate::options::BooleanOptions;
use serde::{Deserialize, Serialize};

/// Boolean operation type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    /// A ∪ B - areas in A or B or both
    Union,
    /// A ∩ B - areas in both A and B
    Intersect,
    /// A - B - areas in A but not in B
    Difference,
    /// A ⊕ B - areas in A or B but not both
    Xor,
}

impl BoolOp {
    /// Whether the walk keeps the parts of (subject, clip) inside the
    /// other operand.
    fn marks(self) -> (bool, bool) {
        match self {
            BoolOp::Union | BoolOp::Xor => (false, false),
            BoolOp::Intersect => (true, true),
            BoolOp::Difference => (false, true),
        }
    }
}

impl BezierGraph {
    pub fn union(&self, other: &BezierGraph) -> BezierGraph {
        self.boolean(other, BoolOp::Union)
    }

    pub fn intersect(&self, other: &BezierGraph) -> BezierGraph {
        self.boolean(other, BoolOp::Intersect)
    }

    /// `self` minus `other`.
    pub fn difference(&self, other: &BezierGraph) -> BezierGraph {
        self.boolean(other, BoolOp::Difference)
    }

    pub fn xor(&self, other: &BezierGraph) -> BezierGraph {
        self.boolean(other, BoolOp::Xor)
    }

    pub fn boolean(&self, other: &BezierGraph, op: BoolOp) -> BezierGraph {
        tracing::debug!(
            ?op,
            subject_contours = self.contour_count(),
            clip_contours = other.contour_count(),
            "boolean operation"
        );
        let contours = match op {
            BoolOp::Xor => {
                // Everything covered, minus what both cover
                let all = BezierGraph::with_contours(combine(self, other, BoolOp::Union));
                let common = BezierGraph::with_contours(combine(self, other, BoolOp::Intersect));
                combine(&all, &common, BoolOp::Difference)
            }
            _ => combine(self, other, op),
        };
        let result = BezierGraph::with_contours(normalize_orientation(contours));
        tracing::debug!(?op, contours = result.contour_count(), "boolean operation done");
        result
    }
}

/// Walk and merge for union, intersect or difference.
fn combine(subject: &BezierGraph, clip: &BezierGraph, op: BoolOp) -> Vec<Contour> {
    let mut ann = Annotations::new(Operands::new(subject, clip));
    ann.insert_crossings();
    ann.insert_self_crossings(Operand::Subject);
    ann.insert_self_crossings(Operand::Clip);
    ann.cleanup();

    let (subject_inside, clip_inside) = op.marks();
    ann.mark_entry_exit(Operand::Subject, subject_inside);
    ann.mark_entry_exit(Operand::Clip, clip_inside);
    tracing::debug!(
        ?op,
        crossings = ann.crossing_count(),
        overlaps = ann.overlaps().len(),
        "crossings marked"
    );

    let mut contours = assemble(&mut ann);
    let walked = contours.len();
    let merged = merge_nonintersecting(&ann, op);
    tracing::debug!(walked, merged = merged.len(), "assembled contours");
    contours.extend(merged.into_iter().map(|k| ann.ops().contour(k).clone()));
    contours
}

/// Remove equivalent (fully coincident) pairs from both lists.
fn take_equivalents(ann: &Annotations, ours: &mut Vec<ContourKey>, theirs: &mut Vec<ContourKey>) -> Vec<(ContourKey, ContourKey)> {
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < ours.len() {
        match theirs.iter().position(|&t| ann.is_equivalent(ours[i], t)) {
            Some(j) => {
                pairs.push((ours.remove(i), theirs.remove(j)));
            }
            None => i += 1,
        }
    }
    pairs
}

/// Contours that cross nothing on the other side, kept per operation.
fn merge_nonintersecting(ann: &Annotations, op: BoolOp) -> Vec<ContourKey> {
    let ops = ann.ops();
    let mut ours = ann.nonintersecting_contours(Operand::Subject);
    let mut theirs = ann.nonintersecting_contours(Operand::Clip);
    let equivalents = take_equivalents(ann, &mut ours, &mut theirs);

    // An outline both operands share survives when it still separates the
    // result from the rest: for union and intersection when both sides
    // agree on which side is filled, for difference when they disagree.
    let mut keep = Vec::new();
    for (o, t) in equivalents {
        let same_inside = ann.inside(o) == ann.inside(t);
        let kept = match op {
            BoolOp::Union | BoolOp::Xor | BoolOp::Intersect => same_inside,
            BoolOp::Difference => !same_inside,
        };
        if kept {
            keep.push(o);
        }
    }

    let keep_ours_when_contained = op == BoolOp::Intersect;
    let keep_theirs_when_contained = op != BoolOp::Union && op != BoolOp::Xor;
    for o in ours {
        if ops.clip.contains_contour(ops.contour(o)) == keep_ours_when_contained {
            keep.push(o);
        }
    }
    for t in theirs {
        if ops.subject.contains_contour(ops.contour(t)) == keep_theirs_when_contained {
            keep.push(t);
        }
    }
    keep
}

/// Filled contours clockwise, holes anticlockwise, judged by how many of
/// the other result contours enclose each one.
fn normalize_orientation(contours: Vec<Contour>) -> Vec<Contour> {
    let samples: Vec<_> = (0..contours.len()).map(|i| boundary_point_off_others(&contours, i)).collect();
    contours
        .iter()
        .zip(&samples)
        .enumerate()
        .map(|(i, (contour, sample))| {
            let depth = sample.map_or(0, |p| {
                contours
                    .iter()
                    .enumerate()
                    .filter(|(j, other)| *j != i && other.contains_point(p))
                    .count()
            });
            let wanted = if depth % 2 == 1 { ContourDirection::AntiClockwise } else { ContourDirection::Clockwise };
            if contour.direction() == wanted {
                contour.clone()
            } else {
                contour.reversed()
            }
        })
        .collect()
}

// Where along each edge to look for a point clear of the other contours
const BOUNDARY_SAMPLES: [f64; 5] = [0.5, 0.25, 0.75, 0.125, 0.875];

/// A point on contour `i` that no other contour passes through. Result
/// contours never cross, so every such point sits on the same side of each
/// of them; points on a shared boundary say nothing.
fn boundary_point_off_others(contours: &[Contour], i: usize) -> Option<Vec2> {
    let on_other = |p: Vec2| {
        contours.iter().enumerate().any(|(j, other)| {
            j != i
                && other.bounds().contains_point(p, EPS_BOUNDS)
                && other.closest_location(p).is_some_and(|(_, _, distance)| distance <= EPS_BOUNDS)
        })
    };
    let edges = contours[i].edges();
    edges
        .iter()
        .flat_map(|e| BOUNDARY_SAMPLES.iter().map(move |&t| e.eval(t)))
        .find(|&p| !on_other(p))
        .or_else(|| {
            tracing::debug!(contour = i, "contour lies along other result contours; orientation may be off");
            edges.first().map(|e| e.eval(0.5))
        })
}

/// Run `op` on two paths with default options.
pub fn boolean(op: BoolOp, a: &Path, b: &Path) -> Result<Path> {
    boolean_with(op, a, b, &BooleanOptions::default())
}

pub fn boolean_with(op: BoolOp, a: &Path, b: &Path, options: &BooleanOptions) -> Result<Path> {
    let subject = BezierGraph::from_path_with(a, options)?;
    let clip = BezierGraph::from_path_with(b, options)?;
    Ok(subject.boolean(&clip, op).to_path())
}

pub fn union(a: &Path, b: &Path) -> Result<Path> {
    boolean(BoolOp::Union, a, b)
}

pub fn union_with(a: &Path, b: &Path, options: &BooleanOptions) -> Result<Path> {
    boolean_with(BoolOp::Union, a, b, options)
}

pub fn intersect(a: &Path, b: &Path) -> Result<Path> {
    boolean(BoolOp::Intersect, a, b)
}

pub fn intersect_with(a: &Path, b: &Path, options: &BooleanOptions) -> Result<Path> {
    boolean_with(BoolOp::Intersect, a, b, options)
}

/// `a` minus `b`.
pub fn difference(a: &Path, b: &Path) -> Result<Path> {
    boolean(BoolOp::Difference, a, b)
}

pub fn difference_with(a: &Path, b: &Path, options: &BooleanOptions) -> Result<Path> {
    boolean_with(BoolOp::Difference, a, b, options)
}

pub fn xor(a: &Path, b: &Path) -> Result<Path> {
    boolean(BoolOp::Xor, a, b)
}

pub fn xor_with(a: &Path, b: &Path, options: &BooleanOptions) -> Result<Path> {
    boolean_with(BoolOp::Xor, a, b, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> BezierGraph {
        BezierGraph::from_path(&Path::rect(x, y, w, h)).unwrap()
    }

    #[test]
    fn op_marks() {
        assert_eq!(BoolOp::Union.marks(), (false, false));
        assert_eq!(BoolOp::Intersect.marks(), (true, true));
        assert_eq!(BoolOp::Difference.marks(), (false, true));
    }

    #[test]
    fn nested_union_keeps_outer() {
        let out = rect(0.0, 0.0, 10.0, 10.0).union(&rect(2.0, 2.0, 4.0, 4.0));
        assert_eq!(out.contour_count(), 1);
        assert_eq!(out.bounds(), rect(0.0, 0.0, 10.0, 10.0).bounds());
    }

    #[test]
    fn nested_difference_punches_hole() {
        let out = rect(0.0, 0.0, 10.0, 10.0).difference(&rect(2.0, 2.0, 4.0, 4.0));
        assert_eq!(out.contour_count(), 2);
        let outer = out.contours().iter().find(|c| c.bounds().width() > 9.0).unwrap();
        let hole = out.contours().iter().find(|c| c.bounds().width() < 5.0).unwrap();
        assert_eq!(outer.direction(), ContourDirection::Clockwise);
        assert_eq!(hole.direction(), ContourDirection::AntiClockwise);
        assert!(!out.to_path().is_empty());
    }

    #[test]
    fn equivalent_contours_collapse() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.union(&a).contour_count(), 1);
        assert_eq!(a.intersect(&a).contour_count(), 1);
        assert_eq!(a.difference(&a).contour_count(), 0);
        assert_eq!(a.xor(&a).contour_count(), 0);
    }

    fn ring() -> BezierGraph {
        let mut p = Path::rect(0.0, 0.0, 30.0, 30.0);
        p.commands.extend(Path::rect(10.0, 10.0, 10.0, 10.0).commands);
        BezierGraph::from_path(&p).unwrap()
    }

    fn signed_area(g: &BezierGraph) -> f64 {
        g.contours().iter().map(Contour::signed_area).sum()
    }

    #[test]
    fn hole_and_matching_fill_cancel() {
        // The clip is exactly the ring's hole
        let (ring, plug) = (ring(), rect(10.0, 10.0, 10.0, 10.0));
        assert_eq!(ring.intersect(&plug).contour_count(), 0);
        assert_eq!(plug.intersect(&ring).contour_count(), 0);

        let union = ring.union(&plug);
        assert_eq!(union.contour_count(), 1);
        assert!((signed_area(&union) - 900.0).abs() < 1e-6);

        let xor = ring.xor(&plug);
        assert!((signed_area(&xor) - 900.0).abs() < 1e-6);

        assert!((signed_area(&ring.difference(&plug)) - 800.0).abs() < 1e-6);
        assert!((signed_area(&plug.difference(&ring)) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn matching_holes_survive_intersect_but_not_difference() {
        let ring = ring();
        assert!((signed_area(&ring.intersect(&ring)) - 800.0).abs() < 1e-6);
        assert_eq!(ring.difference(&ring).contour_count(), 0);
    }

    #[test]
    fn hole_sharing_the_outer_boundary_winds_backwards() {
        // b sits in a's corner, so the result is a with a notch cut out
        let out = rect(0.0, 0.0, 10.0, 10.0).difference(&rect(0.0, 0.0, 5.0, 5.0));
        assert!((signed_area(&out) - 75.0).abs() < 1e-6, "{:?}", out.contours());
    }

    #[test]
    fn normalize_flips_hole_and_fill() {
        let outer = Contour::from_edges(rect(0.0, 0.0, 10.0, 10.0).contour(0).reversed().edges().iter().copied());
        let inner = rect(2.0, 2.0, 2.0, 2.0).contour(0).clone();
        let out = normalize_orientation(vec![outer, inner]);
        assert_eq!(out[0].direction(), ContourDirection::Clockwise);
        assert_eq!(out[1].direction(), ContourDirection::AntiClockwise);
        assert!(out[0].contains_point(Vec2::new(1.0, 1.0)));
    }
}
