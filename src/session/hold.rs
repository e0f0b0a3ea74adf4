//! Hold timer: continuous time spent at or above the acceptance threshold
//!
//! Time is supplied by the caller per frame, so the timer is a pure counter.
//! Any frame below threshold drops the accumulated time back to zero.

use serde::Serialize;
use std::time::Duration;

/// Timer phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldPhase {
    BelowThreshold,
    Accumulating,
}

/// Accumulates qualifying time toward a required hold
#[derive(Clone, Debug, PartialEq)]
pub struct HoldTimer {
    phase: HoldPhase,
    accumulated: Duration,
    threshold: f32,
    required: Duration,
}

impl HoldTimer {
    pub fn new(threshold: f32, required: Duration) -> Self {
        HoldTimer {
            phase: HoldPhase::BelowThreshold,
            accumulated: Duration::ZERO,
            threshold,
            required,
        }
    }

    /// Feed one frame's score and the time since the previous frame
    pub fn update(&mut self, score: f32, elapsed: Duration) -> HoldPhase {
        if score >= self.threshold {
            // Never exceeds the requirement: progress stays within [0, required].
            self.accumulated = (self.accumulated + elapsed).min(self.required);
            self.phase = HoldPhase::Accumulating;
        } else {
            self.accumulated = Duration::ZERO;
            self.phase = HoldPhase::BelowThreshold;
        }
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == HoldPhase::Accumulating && self.accumulated >= self.required
    }

    /// Back to zero, keeping threshold and requirement
    pub fn reset(&mut self) {
        self.phase = HoldPhase::BelowThreshold;
        self.accumulated = Duration::ZERO;
    }

    /// Reset and switch to a new level's goal
    pub fn rearm(&mut self, threshold: f32, required: Duration) {
        self.threshold = threshold;
        self.required = required;
        self.reset();
    }

    #[cfg(test)]
    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    #[cfg(test)]
    pub fn required(&self) -> Duration {
        self.required
    }

    #[cfg(test)]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn remaining(&self) -> Duration {
        self.required.saturating_sub(self.accumulated)
    }

    /// Progress toward the requirement in [0, 1]
    pub fn fraction(&self) -> f32 {
        if self.required.is_zero() {
            return if self.phase == HoldPhase::Accumulating { 1.0 } else { 0.0 };
        }
        (self.accumulated.as_secs_f64() / self.required.as_secs_f64()).clamp(0.0, 1.0) as f32
    }
}
