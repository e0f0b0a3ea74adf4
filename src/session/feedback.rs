//! Feedback tiers shown to the user

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of an accuracy score
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTier {
    Good,
    Adjust,
    Poor,
}

impl fmt::Display for FeedbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeedbackTier::Good => "good",
            FeedbackTier::Adjust => "adjust",
            FeedbackTier::Poor => "poor",
        };
        f.write_str(label)
    }
}

/// Lower bounds of the "good" and "adjust" tiers
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackBands {
    pub good: f32,
    pub adjust: f32,
}

impl Default for FeedbackBands {
    fn default() -> Self {
        FeedbackBands {
            good: 0.90,
            adjust: 0.60,
        }
    }
}

impl FeedbackBands {
    pub fn tier(&self, score: f32) -> FeedbackTier {
        if score >= self.good {
            FeedbackTier::Good
        } else if score >= self.adjust {
            FeedbackTier::Adjust
        } else {
            FeedbackTier::Poor
        }
    }
}
