//! Grid-aligned operands, where shared edges and corners are the rule
//! rather than the exception. Results are checked cell by cell against the
//! even-odd membership the operands imply.

use contour_boolean::algorithms::winding::point_in_polygon_evenodd;
use contour_boolean::geometry::flatten::flatten_curves;
use contour_boolean::{BezierGraph, BoolOp, Path, Vec2};
use proptest::prelude::*;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const GRID: i32 = 24;

#[derive(Clone, Copy, Debug)]
struct Cell {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

impl Cell {
    fn contains(&self, px: f64, py: f64) -> bool {
        px > f64::from(self.x) && px < f64::from(self.x + self.w) && py > f64::from(self.y) && py < f64::from(self.y + self.h)
    }
}

/// Up to three rows, each in its own band so the rects of one operand
/// never touch each other.
fn rows() -> impl Strategy<Value = Vec<Cell>> {
    prop::collection::vec((0..3i32, 1..4i32, 0..10i32, 1..14i32), 1..=3).prop_map(|bands| {
        bands
            .into_iter()
            .enumerate()
            .map(|(k, (dy, h, x, w))| Cell { x, y: 7 * k as i32 + dy, w, h })
            .collect()
    })
}

/// Up to three columns, banded the same way along x.
fn columns() -> impl Strategy<Value = Vec<Cell>> {
    rows().prop_map(|cells| cells.into_iter().map(|c| Cell { x: c.y, y: c.x, w: c.h, h: c.w }).collect())
}

fn graph(cells: &[Cell]) -> BezierGraph {
    let mut p = Path::new();
    for c in cells {
        p.commands
            .extend(Path::rect(f64::from(c.x), f64::from(c.y), f64::from(c.w), f64::from(c.h)).commands);
    }
    BezierGraph::from_path(&p).unwrap()
}

fn covered(cells: &[Cell], px: f64, py: f64) -> bool {
    cells.iter().any(|c| c.contains(px, py))
}

fn wanted(op: BoolOp, in_a: bool, in_b: bool) -> bool {
    match op {
        BoolOp::Union => in_a || in_b,
        BoolOp::Intersect => in_a && in_b,
        BoolOp::Difference => in_a && !in_b,
        BoolOp::Xor => in_a != in_b,
    }
}

fn filled(g: &BezierGraph, p: Vec2) -> bool {
    let crossings = g
        .contours()
        .iter()
        .filter(|c| point_in_polygon_evenodd(p, &flatten_curves(c.edges(), 1e-3)))
        .count();
    crossings % 2 == 1
}

fn area(g: &BezierGraph) -> f64 {
    g.contours().iter().map(|c| c.signed_area()).sum()
}

/// Run `op` on its own thread so a walk that never closes fails the case
/// instead of stalling the suite.
fn run_bounded(a: &BezierGraph, b: &BezierGraph, op: BoolOp) -> Option<BezierGraph> {
    let (a, b) = (a.clone(), b.clone());
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(a.boolean(&b, op));
    });
    rx.recv_timeout(Duration::from_secs(20)).ok()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn grid_results_match_cell_membership(a_cells in rows(), b_cells in columns()) {
        let (a, b) = (graph(&a_cells), graph(&b_cells));
        for op in [BoolOp::Union, BoolOp::Intersect, BoolOp::Difference, BoolOp::Xor] {
            let out = run_bounded(&a, &b, op);
            prop_assert!(out.is_some(), "{:?} did not finish for {:?} / {:?}", op, a_cells, b_cells);
            let out = out.unwrap();

            let mut expected_area = 0.0;
            for gx in 0..GRID {
                for gy in 0..GRID {
                    let (px, py) = (f64::from(gx) + 0.5, f64::from(gy) + 0.5);
                    let expected = wanted(op, covered(&a_cells, px, py), covered(&b_cells, px, py));
                    if expected {
                        expected_area += 1.0;
                    }
                    prop_assert_eq!(
                        filled(&out, Vec2::new(px, py)),
                        expected,
                        "{:?} at ({}, {}) for {:?} / {:?}",
                        op, px, py, a_cells, b_cells
                    );
                }
            }
            // Holes wind the other way, so the signed sum is the covered area
            prop_assert!((area(&out) - expected_area).abs() < 1e-6, "{:?} area {} != {}", op, area(&out), expected_area);
            for c in out.contours() {
                prop_assert!(!c.is_degenerate());
            }
        }
    }

    #[test]
    fn grid_results_feed_later_operations(a_cells in rows(), b_cells in columns()) {
        let (a, b) = (graph(&a_cells), graph(&b_cells));
        let x = run_bounded(&a, &b, BoolOp::Xor);
        prop_assert!(x.is_some());
        let x = x.unwrap();
        // (a xor b) union a covers a or b
        let again = run_bounded(&x, &a, BoolOp::Union);
        prop_assert!(again.is_some(), "chained union did not finish for {:?} / {:?}", a_cells, b_cells);
        let again = again.unwrap();
        for gx in 0..GRID {
            for gy in 0..GRID {
                let (px, py) = (f64::from(gx) + 0.5, f64::from(gy) + 0.5);
                let expected = covered(&a_cells, px, py) || covered(&b_cells, px, py);
                prop_assert_eq!(filled(&again, Vec2::new(px, py)), expected, "({}, {})", px, py);
            }
        }
    }
}
