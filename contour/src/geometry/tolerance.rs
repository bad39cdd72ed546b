// Centralized tolerances and comparison helpers for the boolean engine

pub const EPS_POINT: f64 = 1e-7;          // point coincidence threshold (path units)
pub const EPS_TANGENT: f64 = 1e-7;        // normalized tangent coincidence
pub const EPS_BOUNDS: f64 = 1e-5;         // bounding box overlap slack
pub const EPS_PARAM: f64 = 1e-4;          // parameter counts as a curve end
pub const EPS_OVERLAP: f64 = 1e-2;        // adjacent coincident segments join
pub const EPS_INTERSECT: f64 = 1e-6;      // curves meet when closer than this
pub const EPS_FLAT: f64 = 1e-7;           // control polygon counts as a chord
pub const EPS_LEN: f64 = 1e-12;           // zero-length vector threshold
pub const EPS_DENOM: f64 = 1e-14;         // denominator guard

// Containment rays start inside and leave the bounds by this much
pub const RAY_OVERHANG: f64 = 10.0;

// Tangent probes walk out to the shortest curve's length in this many steps
pub const TANGENT_PROBE_STEPS: u32 = 16;

// Contours enclosing less than this fraction of their squared extent are slivers
pub const EPS_AREA: f64 = 1e-12;

// Cubic control distance for a quarter circle of unit radius
pub const CIRCLE_KAPPA: f64 = 0.55228475;

#[inline] pub fn clamp01(x: f64) -> f64 { x.max(0.0).min(1.0) }
#[inline] pub fn values_close(a: f64, b: f64, eps: f64) -> bool { (a - b).abs() <= eps }

/// `v > min`, but false when the two are within `eps`.
#[inline]
pub fn greater_than(v: f64, min: f64, eps: f64) -> bool {
    !values_close(v, min, eps) && v > min
}

/// `v < max`, but false when the two are within `eps`.
#[inline]
pub fn less_than(v: f64, max: f64, eps: f64) -> bool {
    !values_close(v, max, eps) && v < max
}

#[inline]
pub fn greater_or_close(v: f64, min: f64, eps: f64) -> bool {
    values_close(v, min, eps) || v >= min
}

#[inline]
pub fn less_or_close(v: f64, max: f64, eps: f64) -> bool {
    values_close(v, max, eps) || v <= max
}

#[inline]
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den.abs() <= EPS_DENOM { fallback } else { num / den }
}
