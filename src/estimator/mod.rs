//! Landmark Sources: anything that turns a frame into a landmark set
//!
//! # Components
//! - `replay.rs`: plays back JSON-lines recordings
//! - `simulated.rs`: noisy canonical poses, for running without a camera
//!
//! The session controller only sees the `LandmarkEstimator` trait, so a
//! camera-backed estimator can be added without touching it.

pub mod replay;
pub mod simulated;

use crate::error::EstimatorError;
use crate::pose::landmarks::LandmarkSet;

pub use replay::ReplayEstimator;
pub use simulated::SimulatedEstimator;

/// Produces at most one body's landmarks per frame
pub trait LandmarkEstimator {
    /// Whatever the source needs per frame (an image, a level hint, nothing)
    type Frame;

    /// `Ok(None)` means no body was detected
    fn estimate(&mut self, frame: &Self::Frame) -> Result<Option<LandmarkSet>, EstimatorError>;
}
