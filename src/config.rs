//! Runtime configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes. Loaded from JSON.

use crate::error::ConfigError;
use crate::pose::comparator::ComparatorSettings;
use crate::pose::reference::{Level, PoseLibrary};
use crate::session::feedback::FeedbackBands;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Landmarks below this visibility are ignored
    pub min_visibility: f32,
    /// Frame width / height of the camera feed
    pub aspect_ratio: f32,
    /// Accuracy needed for the hold timer to run, per level
    pub acceptance_thresholds: [f32; Level::COUNT],
    /// Required hold per level, seconds
    pub hold_seconds: [f64; Level::COUNT],
    pub feedback: FeedbackBands,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            min_visibility: 0.5,
            aspect_ratio: 1.0,
            acceptance_thresholds: [0.90; Level::COUNT],
            hold_seconds: [2.0, 3.0, 2.5, 2.0, 3.0],
            feedback: FeedbackBands::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(ConfigError::invalid("min_visibility must be within [0, 1]"));
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(ConfigError::invalid("aspect_ratio must be positive"));
        }
        for (i, threshold) in self.acceptance_thresholds.iter().enumerate() {
            if !(0.0..=1.0).contains(threshold) {
                return Err(ConfigError::invalid(format!(
                    "acceptance_thresholds[{i}] must be within [0, 1]"
                )));
            }
        }
        for (i, secs) in self.hold_seconds.iter().enumerate() {
            if !(secs.is_finite() && *secs > 0.0) {
                return Err(ConfigError::invalid(format!(
                    "hold_seconds[{i}] must be positive"
                )));
            }
            if Duration::try_from_secs_f64(*secs).is_err() {
                return Err(ConfigError::invalid(format!(
                    "hold_seconds[{i}] is too large"
                )));
            }
        }
        let FeedbackBands { good, adjust } = self.feedback;
        if !(0.0..=1.0).contains(&good) || !(0.0..=1.0).contains(&adjust) || adjust > good {
            return Err(ConfigError::invalid(
                "feedback bands must satisfy 0 <= adjust <= good <= 1",
            ));
        }
        Ok(())
    }

    pub fn comparator_settings(&self) -> ComparatorSettings {
        ComparatorSettings {
            min_visibility: self.min_visibility,
            aspect_ratio: self.aspect_ratio,
        }
    }

    pub fn holds(&self) -> [Duration; Level::COUNT] {
        self.hold_seconds.map(Duration::from_secs_f64)
    }

    /// The standard poses with this config's hold durations
    pub fn library(&self) -> PoseLibrary {
        PoseLibrary::standard().with_hold_durations(self.holds())
    }
}
