use crate::geometry::limits::MAX_PATH_COMMANDS;
use serde::{Deserialize, Serialize};

/// What to do with quadratic segments in an operand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadraticPolicy {
    /// Fail with `BooleanError::UnsupportedQuadratic`.
    #[default]
    Reject,
    /// Log and skip the segment. The contour then runs straight to the next point.
    Drop,
    /// Raise to the equivalent cubic.
    Elevate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanOptions {
    pub quadratics: QuadraticPolicy,
    pub max_commands: usize,
}

impl Default for BooleanOptions {
    fn default() -> Self {
        Self { quadratics: QuadraticPolicy::default(), max_commands: MAX_PATH_COMMANDS }
    }
}

impl BooleanOptions {
    pub fn with_quadratics(mut self, policy: QuadraticPolicy) -> Self {
        self.quadratics = policy;
        self
    }
}
