//! Session Management: hold timing, level progression, and feedback
//!
//! # Components
//! - `state.rs`: SessionController driving the per-frame pipeline
//! - `hold.rs`: Continuous-hold timer
//! - `progression.rs`: Level 1..=5 → Complete state machine
//! - `feedback.rs`: Good / adjust / poor tiers
//! - `stats.rs`: Detection rate, best accuracy, weak constraints

pub mod feedback;
pub mod hold;
pub mod progression;
pub mod state;
pub mod stats;

pub use feedback::FeedbackTier;
pub use progression::Stage;
pub use state::{Command, SessionController, SessionEvent, SessionSnapshot};
pub use stats::SessionStats;
