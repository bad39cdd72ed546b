//! Cubic Bézier curve primitive: evaluation, subdivision and degeneracy tests.
//!
//! Curves are immutable values. Every consumer that needs a piece of a curve
//! splits it into new curves with de Casteljau subdivision.

use super::math::{ParamRange, Rect};
use super::tolerance::{clamp01, values_close, EPS_LEN, EPS_POINT};
use crate::model::Vec2;

/// Tolerance handed to `arc_length` by `length()`; only used to bound tangent probes.
const LENGTH_TOLERANCE: f64 = 0.5;

const CLOSEST_SAMPLES: usize = 64;
const CLOSEST_MIN_STEP: f64 = 1e-10;

/// Control points of a cubic Bézier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec2, // Start point
    pub p1: Vec2, // First control point
    pub p2: Vec2, // Second control point
    pub p3: Vec2, // End point
}

impl CubicBezier {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Straight segment with control points at the thirds.
    pub fn line(a: Vec2, b: Vec2) -> Self {
        Self::new(a, a.lerp(b, 1.0 / 3.0), a.lerp(b, 2.0 / 3.0), b)
    }

    /// Degree elevation of a quadratic. Exact, the curve is unchanged.
    pub fn from_quadratic(p0: Vec2, ctrl: Vec2, p2: Vec2) -> Self {
        Self::new(p0, p0 + (ctrl - p0) * (2.0 / 3.0), p2 + (ctrl - p2) * (2.0 / 3.0), p2)
    }

    /// Evaluate the curve at parameter t ∈ [0, 1].
    pub fn eval(&self, t: f64) -> Vec2 {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        Vec2 {
            x: mt3 * self.p0.x + 3.0 * mt2 * t * self.p1.x + 3.0 * mt * t2 * self.p2.x + t3 * self.p3.x,
            y: mt3 * self.p0.y + 3.0 * mt2 * t * self.p1.y + 3.0 * mt * t2 * self.p2.y + t3 * self.p3.y,
        }
    }

    /// Derivative at parameter t.
    pub fn tangent(&self, t: f64) -> Vec2 {
        let t2 = t * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;

        Vec2 {
            x: 3.0 * mt2 * (self.p1.x - self.p0.x)
                + 6.0 * mt * t * (self.p2.x - self.p1.x)
                + 3.0 * t2 * (self.p3.x - self.p2.x),
            y: 3.0 * mt2 * (self.p1.y - self.p0.y)
                + 6.0 * mt * t * (self.p2.y - self.p1.y)
                + 3.0 * t2 * (self.p3.y - self.p2.y),
        }
    }

    /// Split the curve at parameter t using de Casteljau subdivision.
    ///
    /// Returns two cubic curves: the first from 0..t, the second from t..1.
    pub fn split_at(&self, t: f64) -> (CubicBezier, CubicBezier) {
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);

        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);

        let p0123 = p012.lerp(p123, t); // The split point

        (
            CubicBezier::new(self.p0, p01, p012, p0123),
            CubicBezier::new(p0123, p123, p23, self.p3),
        )
    }

    /// Extract the portion of the curve covering `range`.
    pub fn subcurve(&self, range: ParamRange) -> CubicBezier {
        let (t0, t1) = (range.min, range.max);
        if t1 - t0 <= 0.0 {
            let p = self.eval(t0);
            return CubicBezier::new(p, p, p, p);
        }
        let mut curve = *self;
        if t0 > 0.0 {
            curve = curve.split_at(t0).1;
        }
        if t1 < 1.0 {
            // Remap t1 into the already-trimmed curve
            let adjusted = (t1 - t0) / (1.0 - t0);
            curve = curve.split_at(adjusted).0;
        }
        curve
    }

    /// Same curve traversed from end to start.
    pub fn reversed(&self) -> CubicBezier {
        CubicBezier::new(self.p3, self.p2, self.p1, self.p0)
    }

    /// All four points coincide.
    pub fn is_point(&self) -> bool {
        self.p0.is_close(self.p1, EPS_POINT)
            && self.p0.is_close(self.p2, EPS_POINT)
            && self.p0.is_close(self.p3, EPS_POINT)
    }

    /// Control points lie on the chord between the endpoints.
    pub fn is_straight_line(&self) -> bool {
        let chord = self.p3 - self.p0;
        let len = chord.length();
        if len <= EPS_POINT {
            return self.is_point();
        }
        let tol = EPS_POINT.max(len * 1e-12);
        self.flatness_against(chord, len) <= tol && self.controls_within_chord(chord, len)
    }

    fn controls_within_chord(&self, chord: Vec2, len: f64) -> bool {
        let along = |p: Vec2| (p - self.p0).dot(chord) / len;
        let slack = EPS_POINT;
        [self.p1, self.p2]
            .iter()
            .all(|p| along(*p) >= -slack && along(*p) <= len + slack)
    }

    /// Largest distance of a control point from the chord.
    pub fn flatness(&self) -> f64 {
        let chord = self.p3 - self.p0;
        let len = chord.length();
        if len <= EPS_LEN {
            return self.p1.distance(self.p0).max(self.p2.distance(self.p0));
        }
        self.flatness_against(chord, len)
    }

    fn flatness_against(&self, chord: Vec2, len: f64) -> f64 {
        let d1 = (self.p1 - self.p0).cross(chord).abs() / len;
        let d2 = (self.p2 - self.p0).cross(chord).abs() / len;
        d1.max(d2)
    }

    /// Box around the four control points. Always contains the curve.
    pub fn bounding_rect(&self) -> Rect {
        Rect::from_points([self.p0, self.p1, self.p2, self.p3])
    }

    /// Tight box from the endpoints and the derivative roots.
    pub fn bounds(&self) -> Rect {
        let mut r = Rect::from_points([self.p0, self.p3]);
        for t in self.extrema() {
            r.include(self.eval(t));
        }
        r
    }

    fn extrema(&self) -> impl Iterator<Item = f64> {
        let xs = derivative_roots(self.p0.x, self.p1.x, self.p2.x, self.p3.x);
        let ys = derivative_roots(self.p0.y, self.p1.y, self.p2.y, self.p3.y);
        xs.into_iter().chain(ys).flatten()
    }

    /// Compute approximate arc length using adaptive subdivision.
    pub fn arc_length(&self, tolerance: f64) -> f64 {
        arc_length_recursive(self.p0, self.p1, self.p2, self.p3, tolerance, 0)
    }

    /// Coarse length, enough to bound tangent probe offsets.
    pub fn length(&self) -> f64 {
        self.arc_length(LENGTH_TOLERANCE)
    }

    /// Direction leaving the end point backwards along the curve, sampled
    /// `offset` units before the end.
    pub fn tangent_from_right_offset(&self, offset: f64) -> Vec2 {
        if self.is_straight_line() && !self.is_point() {
            return self.p0 - self.p3;
        }
        if offset == 0.0 && !self.p2.is_close(self.p3, EPS_POINT) {
            return self.p2 - self.p3;
        }
        let len = self.length();
        let t = if len > EPS_LEN { clamp01(1.0 - offset / len) } else { 1.0 };
        let (left, _) = self.split_at(t);
        first_nonzero([left.p2 - left.p3, left.p1 - left.p3, left.p0 - left.p3, self.p0 - self.p3])
    }

    /// Direction leaving the start point forwards along the curve, sampled
    /// `offset` units after the start.
    pub fn tangent_from_left_offset(&self, offset: f64) -> Vec2 {
        if self.is_straight_line() && !self.is_point() {
            return self.p3 - self.p0;
        }
        if offset == 0.0 && !self.p1.is_close(self.p0, EPS_POINT) {
            return self.p1 - self.p0;
        }
        let len = self.length();
        let t = if len > EPS_LEN { clamp01(offset / len) } else { 0.0 };
        let (_, right) = self.split_at(t);
        first_nonzero([right.p1 - right.p0, right.p2 - right.p0, right.p3 - right.p0, self.p3 - self.p0])
    }

    /// Nearest parameter on the curve to `point`, with its distance.
    ///
    /// Coarse sampling followed by a shrinking local search.
    pub fn closest_location(&self, point: Vec2) -> (f64, f64) {
        if self.is_point() {
            return (0.0, self.p0.distance(point));
        }
        let mut best_t = 0.0;
        let mut best_d = f64::INFINITY;
        for i in 0..=CLOSEST_SAMPLES {
            let t = i as f64 / CLOSEST_SAMPLES as f64;
            let d = self.eval(t).distance(point);
            if d < best_d {
                best_d = d;
                best_t = t;
            }
        }
        let mut step = 1.0 / CLOSEST_SAMPLES as f64;
        while step > CLOSEST_MIN_STEP {
            let lo = clamp01(best_t - step);
            let hi = clamp01(best_t + step);
            let d_lo = self.eval(lo).distance(point);
            let d_hi = self.eval(hi).distance(point);
            if d_lo < best_d && d_lo <= d_hi {
                best_d = d_lo;
                best_t = lo;
            } else if d_hi < best_d {
                best_d = d_hi;
                best_t = hi;
            } else {
                step *= 0.5;
            }
        }
        (best_t, best_d)
    }
}

fn first_nonzero(candidates: [Vec2; 4]) -> Vec2 {
    candidates
        .into_iter()
        .find(|v| v.length() > EPS_LEN)
        .unwrap_or(Vec2::new(0.0, 0.0))
}

/// Roots in (0, 1) of the derivative of one coordinate.
fn derivative_roots(a: f64, b: f64, c: f64, d: f64) -> [Option<f64>; 2] {
    // B'(t)/3 = qa t^2 + qb t + qc
    let qa = -a + 3.0 * b - 3.0 * c + d;
    let qb = 2.0 * (a - 2.0 * b + c);
    let qc = b - a;
    let inside = |t: f64| if t > 0.0 && t < 1.0 { Some(t) } else { None };
    if values_close(qa, 0.0, 1e-12) {
        if values_close(qb, 0.0, 1e-12) {
            return [None, None];
        }
        return [inside(-qc / qb), None];
    }
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return [None, None];
    }
    let s = disc.sqrt();
    [inside((-qb + s) / (2.0 * qa)), inside((-qb - s) / (2.0 * qa))]
}

/// Recursive arc length computation with adaptive subdivision.
fn arc_length_recursive(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, tolerance: f64, depth: u32) -> f64 {
    const MAX_DEPTH: u32 = 16;

    let chord = p3.distance(p0);
    let poly_len = p1.distance(p0) + p2.distance(p1) + p3.distance(p2);

    // If flat enough or max depth reached, use average of chord and polygon
    if depth >= MAX_DEPTH || (poly_len - chord).abs() < tolerance {
        return (chord + poly_len) * 0.5;
    }

    let (left, right) = CubicBezier::new(p0, p1, p2, p3).split_at(0.5);
    arc_length_recursive(left.p0, left.p1, left.p2, left.p3, tolerance, depth + 1)
        + arc_length_recursive(right.p0, right.p1, right.p2, right.p3, tolerance, depth + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec2(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }

    fn arch() -> CubicBezier {
        CubicBezier::new(vec2(0.0, 0.0), vec2(1.0, 2.0), vec2(3.0, 2.0), vec2(4.0, 0.0))
    }

    #[test]
    fn test_eval_endpoints() {
        let curve = arch();
        let start = curve.eval(0.0);
        let end = curve.eval(1.0);
        assert!((start.x - 0.0).abs() < 1e-12);
        assert!((end.x - 4.0).abs() < 1e-12);
        assert!((end.y - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_split_continuity() {
        let curve = CubicBezier::new(vec2(0.0, 0.0), vec2(0.0, 10.0), vec2(10.0, 10.0), vec2(10.0, 0.0));
        let (first, second) = curve.split_at(0.3);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let a = curve.eval(t * 0.3);
            let b = first.eval(t);
            assert!(a.is_close(b, 1e-9), "mismatch at t={}: {:?} vs {:?}", t, a, b);
        }
        assert!(first.p3.is_close(second.p0, 1e-12));
    }

    #[test]
    fn test_subcurve() {
        let curve = arch();
        let sub = curve.subcurve(ParamRange::new(0.25, 0.75));
        assert!(sub.p0.is_close(curve.eval(0.25), 1e-9));
        assert!(sub.p3.is_close(curve.eval(0.75), 1e-9));
        assert!(sub.eval(0.5).is_close(curve.eval(0.5), 1e-9));
    }

    #[test]
    fn test_arc_length_straight_line() {
        let curve = CubicBezier::line(vec2(0.0, 0.0), vec2(3.0, 4.0));
        assert!((curve.arc_length(0.01) - 5.0).abs() < 1e-6);
        assert!(curve.is_straight_line());
        assert!(!arch().is_straight_line());
    }

    #[test]
    fn degenerate_point() {
        let p = vec2(2.0, 2.0);
        let c = CubicBezier::new(p, p, p, p);
        assert!(c.is_point());
        assert!(!arch().is_point());
    }

    #[test]
    fn tight_bounds_inside_control_box() {
        let c = arch();
        let tight = c.bounds();
        let loose = c.bounding_rect();
        assert!((tight.max_y - 1.5).abs() < 1e-9, "peak of the arch is 1.5, got {}", tight.max_y);
        assert!(loose.max_y >= tight.max_y);
    }

    #[test]
    fn closest_location_finds_projection() {
        let c = CubicBezier::line(vec2(0.0, 0.0), vec2(10.0, 0.0));
        let (t, d) = c.closest_location(vec2(2.5, 3.0));
        assert!((t - 0.25).abs() < 1e-6, "t = {}", t);
        assert!((d - 3.0).abs() < 1e-6);
    }

    #[test]
    fn tangent_offsets_point_away_from_ends() {
        let c = arch();
        let right = c.tangent_from_right_offset(0.0);
        let left = c.tangent_from_left_offset(0.0);
        assert!(right.is_close(vec2(-1.0, 2.0), 1e-12));
        assert!(left.is_close(vec2(1.0, 2.0), 1e-12));
        let probed = c.tangent_from_left_offset(1.0);
        assert!(probed.x > 0.0);
    }

    #[test]
    fn quadratic_elevation_matches() {
        let q0 = vec2(0.0, 0.0);
        let qc = vec2(5.0, 10.0);
        let q2 = vec2(10.0, 0.0);
        let c = CubicBezier::from_quadratic(q0, qc, q2);
        // Quadratic midpoint is (q0 + 2 qc + q2) / 4
        assert!(c.eval(0.5).is_close(vec2(5.0, 5.0), 1e-9));
    }
}
