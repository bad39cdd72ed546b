use crate::geometry::cubic::CubicBezier;
use crate::model::Vec2;

fn dist_point_to_seg_sq(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len2 = ab.dot(ab);
    if len2 <= 0.0 {
        let d = p - a;
        return d.dot(d);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    let d = p - (a + ab * t);
    d.dot(d)
}

/// Append the polyline approximating `c` (without its start point).
pub fn flatten_cubic(points: &mut Vec<Vec2>, c: &CubicBezier, tol: f64, depth: u32) {
    let d1 = dist_point_to_seg_sq(c.p1, c.p0, c.p3);
    let d2 = dist_point_to_seg_sq(c.p2, c.p0, c.p3);
    if d1.max(d2) <= tol * tol || depth > 16 {
        points.push(c.p3);
        return;
    }
    let (left, right) = c.split_at(0.5);
    flatten_cubic(points, &left, tol, depth + 1);
    flatten_cubic(points, &right, tol, depth + 1);
}

/// Closed polyline through a chain of curves; the closing point is not repeated.
pub fn flatten_curves(curves: &[CubicBezier], tol: f64) -> Vec<Vec2> {
    let Some(first) = curves.first() else {
        return Vec::new();
    };
    let mut points = vec![first.p0];
    for c in curves {
        flatten_cubic(&mut points, c, tol, 0);
    }
    if points.len() > 1 && points[points.len() - 1].is_close(points[0], 1e-12) {
        points.pop();
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }

    #[test]
    fn line_flattens_to_endpoint() {
        let mut pts = Vec::new();
        flatten_cubic(&mut pts, &CubicBezier::line(vec2(0.0, 0.0), vec2(4.0, 0.0)), 0.01, 0);
        assert_eq!(pts, vec![vec2(4.0, 0.0)]);
    }

    #[test]
    fn arc_stays_within_tolerance() {
        let c = CubicBezier::new(vec2(0.0, 0.0), vec2(0.0, 5.5), vec2(4.5, 10.0), vec2(10.0, 10.0));
        let pts = flatten_curves(&[c], 0.05);
        assert!(pts.len() > 4);
        for p in pts {
            let (_, d) = c.closest_location(p);
            assert!(d < 1e-6);
        }
    }
}
