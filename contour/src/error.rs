use thiserror::Error;

/// Errors raised while ingesting operands. Geometric ambiguity inside the
/// engine is never an error; it degrades to documented approximations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BooleanError {
    #[error("quadratic segment at command {index} is not supported")]
    UnsupportedQuadratic { index: usize },

    #[error("command {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },

    #[error("command {index} has coordinate {value} outside the supported range")]
    CoordinateOutOfRange { index: usize, value: f64 },

    #[error("path has more than {limit} commands")]
    TooManyCommands { limit: usize },

    #[error("path has more than {limit} subpaths")]
    TooManySubpaths { limit: usize },

    #[error("invalid SVG path data at byte {position}: {message}")]
    Svg { position: usize, message: String },

    #[error("invalid JSON document: {0}")]
    Json(String),
}

impl From<serde_json::Error> for BooleanError {
    fn from(e: serde_json::Error) -> Self {
        BooleanError::Json(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BooleanError>;
