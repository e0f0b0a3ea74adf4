//! Session statistics for the end-of-session summary
//!
//! Features:
//! - Detection rate over all frames
//! - Best accuracy and broken holds per level
//! - EMA accuracy for the trend line
//! - Constraints that repeatedly held the user back
//!
//! Kept in memory only; nothing outlives the process.

use crate::pose::comparator::Comparison;
use crate::pose::reference::Level;
use crate::session::hold::HoldPhase;
use rustc_hash::FxHashMap;

/// Misses before a constraint is reported as weak
const WEAK_THRESHOLD: u32 = 3;

/// A constraint whose similarity stays below this counts as a miss
const MISS_SIMILARITY: f32 = 0.6;

/// Per-session running statistics
#[derive(Clone, Debug)]
pub struct SessionStats {
    frames: u32,
    detected_frames: u32,
    best_accuracy: [f32; Level::COUNT],
    broken_holds: [u32; Level::COUNT],
    ema_accuracy: f32,
    ema_alpha: f32,
    misses: FxHashMap<(Level, &'static str), u32>,
    last_phase: HoldPhase,
}

impl SessionStats {
    pub fn new() -> Self {
        SessionStats {
            frames: 0,
            detected_frames: 0,
            best_accuracy: [0.0; Level::COUNT],
            broken_holds: [0; Level::COUNT],
            ema_accuracy: 0.0,
            ema_alpha: 0.1,
            misses: FxHashMap::default(),
            last_phase: HoldPhase::BelowThreshold,
        }
    }

    /// Record one processed frame for `level` and the hold phase it produced
    pub fn record(&mut self, level: Level, comparison: &Comparison, phase: HoldPhase) {
        self.frames += 1;
        if comparison.detected {
            self.detected_frames += 1;
        }

        let best = &mut self.best_accuracy[level.index()];
        *best = best.max(comparison.score);

        if self.last_phase == HoldPhase::Accumulating && phase == HoldPhase::BelowThreshold {
            self.broken_holds[level.index()] += 1;
        }
        self.last_phase = phase;

        self.ema_accuracy =
            self.ema_alpha * comparison.score + (1.0 - self.ema_alpha) * self.ema_accuracy;

        for result in &comparison.constraints {
            if matches!(result.similarity, Some(s) if s < MISS_SIMILARITY) {
                *self.misses.entry((level, result.name)).or_insert(0) += 1;
            }
        }
    }

    /// Forget the phase carried between frames (after a level change)
    pub fn level_changed(&mut self) {
        self.last_phase = HoldPhase::BelowThreshold;
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Share of frames with a detected body
    pub fn detection_rate(&self) -> f32 {
        if self.frames == 0 {
            0.0
        } else {
            self.detected_frames as f32 / self.frames as f32
        }
    }

    pub fn best_accuracy(&self, level: Level) -> f32 {
        self.best_accuracy[level.index()]
    }

    pub fn broken_holds(&self, level: Level) -> u32 {
        self.broken_holds[level.index()]
    }

    pub fn ema_accuracy(&self) -> f32 {
        self.ema_accuracy
    }

    /// Constraints missed at least `WEAK_THRESHOLD` times, most missed first
    pub fn weak_constraints(&self) -> Vec<(Level, &'static str, u32)> {
        let mut weak: Vec<(Level, &'static str, u32)> = self
            .misses
            .iter()
            .filter(|(_, &count)| count >= WEAK_THRESHOLD)
            .map(|(&(level, name), &count)| (level, name, count))
            .collect();
        weak.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));
        weak
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
