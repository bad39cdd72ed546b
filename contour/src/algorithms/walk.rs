//! Result assembly: walk crossings to build the output contours.
//!
//! Starting at an unprocessed crossing of the subject, output the edge
//! pieces forward (entry) or backward (exit) until the next crossing, jump
//! to its counterpart on the other operand and carry on the same way. The
//! contour closes when the walk comes back to a processed crossing. A shared
//! run counts as a single crossing point, so the walk can trace a run out
//! and straight back; those spurs are folded away before the contour is
//! kept.

use crate::algorithms::annotate::Annotations;
use crate::algorithms::contour::Contour;
use crate::algorithms::crossing::{Crossing, CrossingId, Operand};
use crate::geometry::cubic::CubicBezier;
use crate::geometry::math::ParamRange;
use crate::geometry::tolerance::{EPS_INTERSECT, EPS_PARAM};

/// Output contour under construction. Each piece is moved onto the end of
/// the previous one so the contour closes exactly.
#[derive(Default)]
struct ContourBuilder {
    edges: Vec<CubicBezier>,
}

impl ContourBuilder {
    fn push(&mut self, mut curve: CubicBezier) {
        if curve.is_point() {
            return;
        }
        if let Some(last) = self.edges.last() {
            let delta = last.p3 - curve.p0;
            curve.p0 = last.p3;
            curve.p1 = curve.p1 + delta;
        }
        self.edges.push(curve);
    }

    fn push_reversed(&mut self, curve: CubicBezier) {
        self.push(curve.reversed());
    }

    /// Close the contour. Stretches the walk traced out and straight back
    /// again are folded away first; a contour left with no area is dropped.
    fn finish(self) -> Option<Contour> {
        let mut edges = self.edges;
        collapse_spurs(&mut edges);
        let mut snapped = ContourBuilder::default();
        for edge in edges {
            snapped.push(edge);
        }
        let first = snapped.edges.first()?.p0;
        if let Some(last) = snapped.edges.last_mut() {
            let delta = first - last.p3;
            last.p3 = first;
            last.p2 = last.p2 + delta;
        }
        let contour = Contour::from_edges(snapped.edges);
        if contour.is_degenerate() {
            tracing::debug!(edges = contour.len(), "dropping result contour without area");
            return None;
        }
        Some(contour)
    }
}

/// How two consecutive edges that double back on each other simplify.
#[derive(Debug)]
enum Fold {
    /// The second edge retraces the first exactly; both go.
    Both,
    /// The pair reduces to this one curve.
    Into(CubicBezier),
}

fn curves_match(a: &CubicBezier, b: &CubicBezier, eps: f64) -> bool {
    a.p0.is_close(b.p0, eps) && a.p1.is_close(b.p1, eps) && a.p2.is_close(b.p2, eps) && a.p3.is_close(b.p3, eps)
}

/// Does `b`, which starts where `a` ends, head straight back along `a`?
fn fold_back(a: &CubicBezier, b: &CubicBezier) -> Option<Fold> {
    let extent = a.bounding_rect().union(&b.bounding_rect());
    let eps = EPS_INTERSECT * extent.width().max(extent.height()).max(1.0);
    if curves_match(&b.reversed(), a, eps) {
        return Some(Fold::Both);
    }

    if a.is_straight_line() && b.is_straight_line() {
        let along = a.p3 - a.p0;
        let back = b.p3 - b.p0;
        if along.dot(back) >= 0.0 || along.cross(b.p3 - a.p0).abs() > eps * along.length() {
            return None;
        }
        if a.p0.is_close(b.p3, eps) {
            return Some(Fold::Both);
        }
        return Some(Fold::Into(CubicBezier::line(a.p0, b.p3)));
    }

    let interior = |t: f64| t > EPS_PARAM && t < 1.0 - EPS_PARAM;
    let (t, distance) = a.closest_location(b.p3);
    if distance <= eps && interior(t) {
        let (head, tail) = a.split_at(t);
        if curves_match(&tail.reversed(), b, eps) {
            return Some(Fold::Into(head));
        }
    }
    let (t, distance) = b.closest_location(a.p0);
    if distance <= eps && interior(t) {
        let (head, tail) = b.split_at(t);
        if curves_match(&head.reversed(), a, eps) {
            return Some(Fold::Into(tail));
        }
    }
    None
}

/// Fold away every pair of consecutive edges (wrapping round) where the
/// outline runs out and back along the same stretch.
fn collapse_spurs(edges: &mut Vec<CubicBezier>) {
    'scan: loop {
        let n = edges.len();
        if n < 2 {
            return;
        }
        for i in 0..n {
            let j = (i + 1) % n;
            let Some(fold) = fold_back(&edges[i], &edges[j]) else {
                continue;
            };
            match fold {
                Fold::Both => {
                    edges.remove(i.max(j));
                    edges.remove(i.min(j));
                }
                Fold::Into(curve) => {
                    edges[i] = curve;
                    edges.remove(j);
                }
            }
            continue 'scan;
        }
        return;
    }
}

/// Piece of one edge between two crossings on it; a missing end means the
/// start or the end of the edge.
fn piece_between(start: Option<&Crossing>, end: Option<&Crossing>) -> Option<CubicBezier> {
    match (start, end) {
        (Some(s), Some(e)) => Some(s.curve.subcurve(ParamRange::new(s.parameter, e.parameter))),
        (None, Some(e)) => e.left_curve(),
        (Some(s), None) => s.right_curve(),
        (None, None) => None,
    }
}

/// Walk every crossing and return the contours they outline.
pub fn assemble(ann: &mut Annotations) -> Vec<Contour> {
    let ops = ann.ops();
    let mut result = Vec::new();
    // Every crossing is processed at most once per contour pass
    let visit_limit = ann.crossing_count() + 1;

    while let Some(start) = ann.first_unprocessed(Operand::Subject) {
        let mut builder = ContourBuilder::default();
        let mut current: CrossingId = start;
        let mut visits = 0usize;

        while !ann.crossing(current).processed {
            visits += 1;
            if visits > visit_limit {
                tracing::warn!(visits, "contour walk exceeded its visit bound; closing contour early");
                break;
            }
            ann.set_processed(current);
            let crossing = ann.crossing(current).clone();

            if crossing.entry {
                let next = ann.next_nonself(current);
                let piece = piece_between(Some(&crossing), next.map(|n| ann.crossing(n)));
                if let Some(curve) = piece {
                    builder.push(curve);
                }
                current = match next {
                    Some(n) => n,
                    None => {
                        let mut edge = ops.next_edge(crossing.edge);
                        let mut remaining = ops.contour(edge.contour_key()).len();
                        while !ann.has_nonself(edge) {
                            if remaining == 0 {
                                tracing::warn!(?edge, "walk went round a contour without meeting a crossing");
                                break;
                            }
                            remaining -= 1;
                            builder.push(*ops.curve(edge));
                            edge = ops.next_edge(edge);
                        }
                        let Some(found) = ann.first_nonself(edge) else { break };
                        if let Some(curve) = piece_between(None, Some(ann.crossing(found))) {
                            builder.push(curve);
                        }
                        found
                    }
                };
            } else {
                let previous = ann.previous_nonself(current);
                let piece = piece_between(previous.map(|p| ann.crossing(p)), Some(&crossing));
                if let Some(curve) = piece {
                    builder.push_reversed(curve);
                }
                current = match previous {
                    Some(p) => p,
                    None => {
                        let mut edge = ops.previous_edge(crossing.edge);
                        let mut remaining = ops.contour(edge.contour_key()).len();
                        while !ann.has_nonself(edge) {
                            if remaining == 0 {
                                tracing::warn!(?edge, "walk went round a contour without meeting a crossing");
                                break;
                            }
                            remaining -= 1;
                            builder.push_reversed(*ops.curve(edge));
                            edge = ops.previous_edge(edge);
                        }
                        let Some(found) = ann.last_nonself(edge) else { break };
                        if let Some(curve) = piece_between(Some(ann.crossing(found)), None) {
                            builder.push_reversed(curve);
                        }
                        found
                    }
                };
            }

            // Switch over to the other operand
            ann.set_processed(current);
            current = ann.counterpart(current);
        }

        if let Some(contour) = builder.finish() {
            result.push(contour);
        }
    }
    result
}
