//! Exact boolean operations on regions bounded by closed cubic Bézier
//! contours.
//!
//! ```
//! use contour_boolean::{union, Path};
//!
//! let a = Path::rect(0.0, 0.0, 10.0, 10.0);
//! let b = Path::rect(5.0, 5.0, 10.0, 10.0);
//! let out = union(&a, &b).unwrap();
//! assert_eq!(out.contour_count(), 1);
//! ```

pub mod error;
pub mod model;
pub mod options;
pub mod geometry {
    pub mod cubic;
    pub mod flatten;
    pub mod intersect;
    pub mod limits;
    pub mod math;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod annotate;
    pub mod boolean;
    pub mod contour;
    pub mod crossing;
    pub mod graph;
    pub mod overlap;
    pub mod walk;
    pub mod winding;
}
pub mod json;
pub mod svg;

pub use algorithms::boolean::{
    boolean, boolean_with, difference, difference_with, intersect, intersect_with, union, union_with, xor,
    xor_with, BoolOp,
};
pub use algorithms::contour::{Contour, ContourDirection, Inside};
pub use algorithms::graph::{BezierGraph, CurveLocation};
pub use error::{BooleanError, Result};
pub use geometry::cubic::CubicBezier;
pub use geometry::math::Rect;
pub use model::{FillRule, Path, PathCommand, Vec2};
pub use options::{BooleanOptions, QuadraticPolicy};
