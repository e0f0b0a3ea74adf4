//! Level progression state machine
//!
//! Stages: Level 1..=5, then Complete. A completed hold moves to the next
//! stage; manual jumps and resets are accepted from any stage. Every
//! transition rearms the hold timer for the new stage.

use crate::error::PoseResult;
use crate::pose::reference::{Level, PoseLibrary};
use crate::session::hold::HoldTimer;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// What a level asks of the user
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelGoal {
    /// Minimum accuracy that counts toward the hold
    pub threshold: f32,
    pub hold: Duration,
}

/// Current position in the journey
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "level", rename_all = "snake_case")]
pub enum Stage {
    Level(Level),
    Complete,
}

/// Emitted on automatic transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "level", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The carried level's hold was satisfied
    LevelComplete(Level),
    /// The last level was satisfied
    JourneyComplete,
}

#[derive(Clone, Debug)]
pub struct Progression {
    stage: Stage,
    goals: [LevelGoal; Level::COUNT],
}

impl Progression {
    pub fn new(goals: [LevelGoal; Level::COUNT]) -> Self {
        Progression {
            stage: Stage::Level(Level::FIRST),
            goals,
        }
    }

    /// Goals from a library's hold durations and one threshold per level
    pub fn from_library(library: &PoseLibrary, thresholds: [f32; Level::COUNT]) -> Self {
        let goals = std::array::from_fn(|i| LevelGoal {
            threshold: thresholds[i],
            hold: library.iter().nth(i).map_or(Duration::ZERO, |r| r.hold),
        });
        Self::new(goals)
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The level being practised; the last level once complete
    pub fn level(&self) -> Level {
        match self.stage {
            Stage::Level(level) => level,
            Stage::Complete => Level::LAST,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Complete
    }

    pub fn goal(&self, level: Level) -> LevelGoal {
        self.goals[level.index()]
    }

    /// A fresh timer for the current stage
    pub fn timer(&self) -> HoldTimer {
        let goal = self.goal(self.level());
        HoldTimer::new(goal.threshold, goal.hold)
    }

    /// Move on if `timer` reports a completed hold. Complete is terminal here.
    pub fn advance(&mut self, timer: &mut HoldTimer) -> Vec<ProgressEvent> {
        let Stage::Level(level) = self.stage else {
            return Vec::new();
        };
        if !timer.is_complete() {
            return Vec::new();
        }

        let mut events = vec![ProgressEvent::LevelComplete(level)];
        match level.next() {
            Some(next) => {
                info!(completed = %level, next = %next, "level complete");
                self.stage = Stage::Level(next);
            }
            None => {
                info!(completed = %level, "journey complete");
                self.stage = Stage::Complete;
                events.push(ProgressEvent::JourneyComplete);
            }
        }
        self.rearm(timer);
        events
    }

    /// Manual jump to `level`, from any stage. Out-of-range targets leave
    /// the state untouched.
    pub fn jump_to(&mut self, level: u8, timer: &mut HoldTimer) -> PoseResult<Level> {
        let level = Level::new(level)?;
        info!(%level, "jumped to level");
        self.stage = Stage::Level(level);
        self.rearm(timer);
        Ok(level)
    }

    /// Unconditional return to level 1
    pub fn reset(&mut self, timer: &mut HoldTimer) {
        info!("reset to level 1");
        self.stage = Stage::Level(Level::FIRST);
        self.rearm(timer);
    }

    fn rearm(&self, timer: &mut HoldTimer) {
        let goal = self.goal(self.level());
        timer.rearm(goal.threshold, goal.hold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoseError;

    fn setup() -> (Progression, HoldTimer) {
        let progression = Progression::from_library(&PoseLibrary::standard(), [0.9; Level::COUNT]);
        let timer = progression.timer();
        (progression, timer)
    }

    fn finish_hold(timer: &mut HoldTimer) {
        timer.update(1.0, Duration::from_secs(10));
        assert!(timer.is_complete());
    }

    #[test]
    fn test_starts_at_level_one() {
        let (progression, timer) = setup();
        assert_eq!(progression.stage(), Stage::Level(Level::FIRST));
        assert_eq!(timer.required(), Duration::from_secs(2));
    }

    #[test]
    fn test_five_completions_reach_complete() {
        let (mut progression, mut timer) = setup();
        for n in 1..=4u8 {
            finish_hold(&mut timer);
            let events = progression.advance(&mut timer);
            assert_eq!(events, vec![ProgressEvent::LevelComplete(Level::new(n).unwrap())]);
            assert_eq!(progression.stage(), Stage::Level(Level::new(n + 1).unwrap()));
            assert_eq!(timer.accumulated(), Duration::ZERO);
        }
        assert!(!progression.is_complete());

        finish_hold(&mut timer);
        let events = progression.advance(&mut timer);
        assert_eq!(
            events,
            vec![
                ProgressEvent::LevelComplete(Level::LAST),
                ProgressEvent::JourneyComplete
            ]
        );
        assert_eq!(progression.stage(), Stage::Complete);
        assert_eq!(timer.accumulated(), Duration::ZERO);
    }

    #[test]
    fn test_complete_is_terminal() {
        let (mut progression, mut timer) = setup();
        progression.jump_to(5, &mut timer).unwrap();
        finish_hold(&mut timer);
        progression.advance(&mut timer);
        assert!(progression.is_complete());

        finish_hold(&mut timer);
        assert!(progression.advance(&mut timer).is_empty());
        assert_eq!(progression.stage(), Stage::Complete);
    }

    #[test]
    fn test_incomplete_hold_does_not_advance() {
        let (mut progression, mut timer) = setup();
        timer.update(1.0, Duration::from_millis(500));
        assert!(progression.advance(&mut timer).is_empty());
        assert_eq!(progression.level(), Level::FIRST);
        assert_eq!(timer.accumulated(), Duration::from_millis(500));
    }

    #[test]
    fn test_jump_from_any_stage() {
        let (mut progression, mut timer) = setup();
        timer.update(1.0, Duration::from_secs(1));
        assert_eq!(progression.jump_to(3, &mut timer).unwrap().number(), 3);
        assert_eq!(progression.stage(), Stage::Level(Level::new(3).unwrap()));
        assert_eq!(timer.accumulated(), Duration::ZERO);
        assert_eq!(timer.required(), Duration::from_millis(2500));

        progression.jump_to(5, &mut timer).unwrap();
        finish_hold(&mut timer);
        progression.advance(&mut timer);
        assert!(progression.is_complete());
        progression.jump_to(3, &mut timer).unwrap();
        assert_eq!(progression.level().number(), 3);
        assert_eq!(timer.accumulated(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_jump_keeps_state() {
        let (mut progression, mut timer) = setup();
        progression.jump_to(2, &mut timer).unwrap();
        timer.update(1.0, Duration::from_secs(1));

        assert_eq!(progression.jump_to(9, &mut timer), Err(PoseError::InvalidLevel(9)));
        assert_eq!(progression.jump_to(0, &mut timer), Err(PoseError::InvalidLevel(0)));
        assert_eq!(progression.level().number(), 2);
        assert_eq!(timer.accumulated(), Duration::from_secs(1));
    }

    #[test]
    fn test_reset_from_complete() {
        let (mut progression, mut timer) = setup();
        progression.jump_to(5, &mut timer).unwrap();
        finish_hold(&mut timer);
        progression.advance(&mut timer);
        assert!(progression.is_complete());

        progression.reset(&mut timer);
        assert_eq!(progression.stage(), Stage::Level(Level::FIRST));
        assert_eq!(timer.accumulated(), Duration::ZERO);
        assert_eq!(timer.required(), Duration::from_secs(2));
    }

    #[test]
    fn test_goal_thresholds_per_level() {
        let thresholds = [0.9, 0.85, 0.8, 0.75, 0.7];
        let progression = Progression::from_library(&PoseLibrary::standard(), thresholds);
        for level in Level::all() {
            assert_eq!(progression.goal(level).threshold, thresholds[level.index()]);
        }
    }
}
