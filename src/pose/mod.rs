//! Pose Module: landmarks, reference poses and scoring
//!
//! # Components
//! - `landmarks.rs`: 33-point landmark sets and geometry helpers
//! - `reference.rs`: the five reference poses and their constraints
//! - `comparator.rs`: accuracy score of a frame against a reference
//! - `synth.rs`: canonical skeletons per level

pub mod comparator;
pub mod landmarks;
pub mod reference;
pub mod synth;

pub use comparator::PoseComparator;
pub use landmarks::LandmarkSet;
pub use reference::{get_reference, Level};
