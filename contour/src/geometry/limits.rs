// Centralized ingestion limits to harden against untrusted input (JSON/SVG)

// Path size caps
pub const MAX_PATH_COMMANDS: usize = 200_000;
pub const MAX_SUBPATHS: usize = 10_000;

// SVG caps
pub const MAX_SVG_TOKENS: usize = 8 * 1024 * 1024; // 8 MB worth of characters in the 'd' string

// JSON caps
pub const MAX_JSON_BYTES: usize = 32 * 1024 * 1024;

// Numeric bounds
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 = 10_000_000.0;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }
