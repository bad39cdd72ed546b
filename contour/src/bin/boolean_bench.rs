use contour_boolean::{BezierGraph, BoolOp, Path, Vec2};
use std::time::Instant;

/// Subject: a grid of circles. Clip: a rectangle overlapping each circle.
fn build_operands(shapes: usize) -> (Path, Path) {
    let cols = (shapes as f64).sqrt().ceil().max(1.0) as usize;
    let mut subject = Path::new();
    let mut clip = Path::new();
    for k in 0..shapes {
        let x = (k % cols) as f64 * 40.0;
        let y = (k / cols) as f64 * 40.0;
        subject.commands.extend(Path::circle(Vec2::new(x + 12.0, y + 12.0), 10.0).commands);
        clip.commands.extend(Path::rect(x + 14.0, y + 6.0, 16.0, 12.0).commands);
    }
    (subject, clip)
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn parse_op(name: &str) -> Option<BoolOp> {
    match name {
        "union" => Some(BoolOp::Union),
        "intersect" => Some(BoolOp::Intersect),
        "difference" => Some(BoolOp::Difference),
        "xor" => Some(BoolOp::Xor),
        _ => None,
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut ops = vec![BoolOp::Union, BoolOp::Intersect, BoolOp::Difference, BoolOp::Xor];
    let mut shapes = 16usize;
    let mut iters = 20usize;
    let mut assert_ms: Option<f64> = None;
    for a in &args[1..] {
        if let Some(val) = a.strip_prefix("--ops=") {
            ops = val.split(',').filter_map(parse_op).collect();
        } else if let Some(val) = a.strip_prefix("--shapes=") {
            if let Ok(v) = val.parse() {
                shapes = v;
            }
        } else if let Some(val) = a.strip_prefix("--iters=") {
            if let Ok(v) = val.parse() {
                iters = v;
            }
        } else if let Some(val) = a.strip_prefix("--assert-ms=") {
            if let Ok(v) = val.parse() {
                assert_ms = Some(v);
            }
        }
    }

    let (subject_path, clip_path) = build_operands(shapes);
    let (subject, clip) = match (BezierGraph::from_path(&subject_path), BezierGraph::from_path(&clip_path)) {
        (Ok(s), Ok(c)) => (s, c),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("FAIL: could not build operands: {}", e);
            std::process::exit(2);
        }
    };

    let mut failed = false;
    for op in ops {
        // Warm-up
        let warm = subject.boolean(&clip, op);
        let mut times_ms: Vec<f64> = Vec::with_capacity(iters);
        for _ in 0..iters {
            let t0 = Instant::now();
            let out = subject.boolean(&clip, op);
            times_ms.push(t0.elapsed().as_secs_f64() * 1000.0);
            std::hint::black_box(out);
        }
        times_ms.sort_by(|a, b| a.total_cmp(b));
        let med = percentile(&times_ms, 0.5);
        let p90 = percentile(&times_ms, 0.9);
        let p99 = percentile(&times_ms, 0.99);
        println!(
            "op={:?} shapes={} iters={} contours_out={} median_ms={:.4} p90_ms={:.4} p99_ms={:.4}",
            op,
            shapes,
            iters,
            warm.contour_count(),
            med,
            p90,
            p99
        );
        if let Some(th) = assert_ms {
            if med > th {
                eprintln!("FAIL: {:?} median {:.4} ms > threshold {:.3} ms", op, med, th);
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}
