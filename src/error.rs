//! Error types shared across the crate
//!
//! - `PoseError`: bad level numbers and malformed landmark data
//! - `EstimatorError`: landmark source failures (never fatal to a session)
//! - `ConfigError`: configuration loading and validation
//!
//! A frame without a detected body is not an error. It is reported as an
//! undetected `Comparison` by the comparator.

use thiserror::Error;

/// Result alias for pose and progression operations
pub type PoseResult<T> = Result<T, PoseError>;

/// Errors raised by the reference library, comparator input and state machine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    /// Level outside 1..=5
    #[error("invalid level {0}: expected a level between 1 and 5")]
    InvalidLevel(u8),

    /// Landmark set with the wrong number of points
    #[error("malformed landmark set: expected {expected} points, got {actual}")]
    MalformedLandmarks { expected: usize, actual: usize },
}

/// Errors raised by a landmark source
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("landmark source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A recording line that is not a landmark set or `null`
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The source has no more frames
    #[error("landmark source exhausted")]
    Exhausted,
}

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
