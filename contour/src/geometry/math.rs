//! Vector, bounds, angle and parameter-range helpers shared by the engine.

use super::tolerance::{
    greater_than, less_than, values_close, EPS_BOUNDS, EPS_LEN, EPS_TANGENT,
};
use crate::model::Vec2;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::ops::{Add, Mul, Neg, Sub};

impl Vec2 {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, o: Vec2) -> f64 {
        self.x * o.x + self.y * o.y
    }

    #[inline]
    pub fn cross(self, o: Vec2) -> f64 {
        self.x * o.y - self.y * o.x
    }

    #[inline]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance(self, o: Vec2) -> f64 {
        (self - o).length()
    }

    /// Unit vector, or zero for a (near) zero vector.
    #[inline]
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len > EPS_LEN { Vec2::new(self.x / len, self.y / len) } else { Vec2::new(0.0, 0.0) }
    }

    #[inline]
    pub fn lerp(self, o: Vec2, t: f64) -> Vec2 {
        Vec2::new(self.x + t * (o.x - self.x), self.y + t * (o.y - self.y))
    }

    /// Both coordinates within `eps`.
    #[inline]
    pub fn is_close(self, o: Vec2, eps: f64) -> bool {
        values_close(self.x, o.x, eps) && values_close(self.y, o.y, eps)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, o: Vec2) -> Vec2 { Vec2::new(self.x + o.x, self.y + o.y) }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, o: Vec2) -> Vec2 { Vec2::new(self.x - o.x, self.y - o.y) }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, s: f64) -> Vec2 { Vec2::new(self.x * s, self.y * s) }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 { Vec2::new(-self.x, -self.y) }
}

/// Axis-aligned box. An empty box has inverted infinite extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Rect {
    fn default() -> Self {
        Rect::empty()
    }
}

impl Rect {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub const fn empty() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY)
    }

    pub fn from_points<I: IntoIterator<Item = Vec2>>(points: I) -> Self {
        let mut r = Rect::empty();
        for p in points {
            r.include(p);
        }
        r
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    pub fn include(&mut self, p: Vec2) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn union(&self, o: &Rect) -> Rect {
        Rect::new(
            self.min_x.min(o.min_x),
            self.min_y.min(o.min_y),
            self.max_x.max(o.max_x),
            self.max_y.max(o.max_y),
        )
    }

    /// Inclusive containment, `eps` of slack on every side.
    pub fn contains_point(&self, p: Vec2, eps: f64) -> bool {
        !self.is_empty()
            && p.x >= self.min_x - eps
            && p.x <= self.max_x + eps
            && p.y >= self.min_y - eps
            && p.y <= self.max_y + eps
    }

    /// Boxes touch or overlap, with `EPS_BOUNDS` slack. Degenerate (flat)
    /// boxes are fine, which is what straight curves produce.
    pub fn overlaps(&self, o: &Rect) -> bool {
        self.overlaps_within(o, EPS_BOUNDS)
    }

    pub fn overlaps_within(&self, o: &Rect, eps: f64) -> bool {
        if self.is_empty() || o.is_empty() {
            return false;
        }
        let left = self.min_x.max(o.min_x);
        let right = self.max_x.min(o.max_x);
        if greater_than(left, right, eps) {
            return false;
        }
        let top = self.min_y.max(o.min_y);
        let bottom = self.max_y.min(o.max_y);
        !greater_than(top, bottom, eps)
    }
}

/// Angle of a vector in [0, 2π).
pub fn polar_angle(v: Vec2) -> f64 {
    let value = if v.x > 0.0 {
        (v.y / v.x).atan()
    } else if v.x < 0.0 {
        if v.y >= 0.0 { (v.y / v.x).atan() + PI } else { (v.y / v.x).atan() - PI }
    } else if v.y > 0.0 {
        FRAC_PI_2
    } else if v.y < 0.0 {
        -FRAC_PI_2
    } else {
        0.0
    };
    normalize_angle(value)
}

pub fn normalize_angle(mut value: f64) -> f64 {
    while value < 0.0 {
        value += TAU;
    }
    while value >= TAU {
        value -= TAU;
    }
    value
}

/// Open angular interval swept counter to the stored order; wraps through 0
/// when `min > max`.
#[derive(Clone, Copy, Debug)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
}

impl AngleRange {
    pub fn contains(&self, angle: f64) -> bool {
        if self.min <= self.max {
            return greater_than(angle, self.min, EPS_TANGENT) && less_than(angle, self.max, EPS_TANGENT);
        }
        (greater_than(angle, self.min, EPS_TANGENT) && angle <= TAU)
            || (angle >= 0.0 && less_than(angle, self.max, EPS_TANGENT))
    }
}

/// Closed parameter interval on a curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const FULL: ParamRange = ParamRange { min: 0.0, max: 1.0 };

    #[inline]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    #[inline]
    pub fn average(&self) -> f64 {
        (self.min + self.max) * 0.5
    }

    /// Map a value in [0, 1] into this range.
    #[inline]
    pub fn scale(&self, value: f64) -> f64 {
        (self.max - self.min) * value + self.min
    }

    pub fn union(&self, o: &ParamRange) -> ParamRange {
        ParamRange::new(self.min.min(o.min), self.max.max(o.max))
    }

    /// Both ends agree to `places` decimal places (truncated).
    pub fn has_converged(&self, places: i32) -> bool {
        let factor = 10f64.powi(places);
        (self.min * factor).trunc() == (self.max * factor).trunc()
    }
}

/// Tangent directions leaving an intersection point along one contour:
/// `left` points back along the incoming curve, `right` along the outgoing one.
#[derive(Clone, Copy, Debug)]
pub struct TangentPair {
    pub left: Vec2,
    pub right: Vec2,
}

/// Any tangent of one pair is too close in direction to a tangent of the other.
pub fn tangents_ambiguous(edge1: &TangentPair, edge2: &TangentPair) -> bool {
    let (l1, r1) = (edge1.left.normalized(), edge1.right.normalized());
    let (l2, r2) = (edge2.left.normalized(), edge2.right.normalized());
    l1.is_close(l2, EPS_TANGENT)
        || l1.is_close(r2, EPS_TANGENT)
        || r1.is_close(l2, EPS_TANGENT)
        || r1.is_close(r2, EPS_TANGENT)
}

/// The second pair's directions fall one on each side of the first pair's
/// directions, i.e. the curves cross instead of touching.
pub fn tangents_cross(edge1: &TangentPair, edge2: &TangentPair) -> bool {
    let (a1, b1) = (polar_angle(edge1.left), polar_angle(edge1.right));
    let (a2, b2) = (polar_angle(edge2.left), polar_angle(edge2.right));

    let range1 = AngleRange { min: a1, max: b1 };
    let count1 = [a2, b2].iter().filter(|a| range1.contains(**a)).count();

    let range2 = AngleRange { min: b1, max: a1 };
    let count2 = [a2, b2].iter().filter(|a| range2.contains(**a)).count();

    count1 == 1 && count2 == 1
}

/// Which side of a corner `direction` leaves on. The corner arrives along
/// `back` (pointing back up the incoming curve) and leaves along `forward`;
/// `Some(true)` is the wedge swept from `forward` round to `back` in
/// increasing angle. None when `direction` runs along either arm or the
/// corner folds back on itself.
pub fn side_of_corner(back: Vec2, forward: Vec2, direction: Vec2) -> Option<bool> {
    let base = polar_angle(forward);
    let sweep = normalize_angle(polar_angle(back) - base);
    let angle = normalize_angle(polar_angle(direction) - base);
    let on_arm = |a: f64, b: f64| values_close(a, b, EPS_TANGENT);
    if on_arm(sweep, 0.0) || on_arm(sweep, TAU) {
        return None;
    }
    if on_arm(angle, 0.0) || on_arm(angle, TAU) || on_arm(angle, sweep) {
        return None;
    }
    Some(angle < sweep)
}
