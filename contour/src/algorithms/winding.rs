//! Point-in-polygon tests on flattened outlines.
//!
//! Exact curve containment lives on `Contour`; these polyline versions back
//! contour orientation and area, and the membership checks in tests.

use crate::model::Vec2;

/// Number of polygon edges a rightward horizontal ray from `p` crosses.
pub fn crossing_number(p: Vec2, polygon: &[Vec2]) -> i32 {
    if polygon.len() < 3 {
        return 0;
    }

    let mut crossings = 0i32;
    let n = polygon.len();

    for i in 0..n {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % n];

        // Half-open in y so a vertex on the ray counts once
        let y_crosses = (p1.y <= p.y && p2.y > p.y) || (p2.y <= p.y && p1.y > p.y);
        if y_crosses {
            let t = (p.y - p1.y) / (p2.y - p1.y);
            let x_intersect = p1.x + t * (p2.x - p1.x);
            if p.x < x_intersect {
                crossings += 1;
            }
        }
    }

    crossings
}

#[inline]
pub fn point_in_polygon_evenodd(p: Vec2, polygon: &[Vec2]) -> bool {
    crossing_number(p, polygon) % 2 == 1
}

/// Shoelace area; positive for clockwise outlines in y-down space.
pub fn polygon_signed_area(polygon: &[Vec2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        sum += polygon[i].cross(polygon[(i + 1) % n]);
    }
    sum * 0.5
}
