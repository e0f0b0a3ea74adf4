//! Session controller and per-frame snapshots
//!
//! Maintains:
//! - Current stage and hold timer
//! - Queued manual commands, applied at the next frame boundary
//! - Running statistics for the summary
//!
//! Frames are processed strictly one at a time. Each call to
//! `process_frame` runs the whole pipeline (commands → compare → hold
//! timer → progression → feedback) and returns the snapshot for the renderer.

use crate::config::Config;
use crate::error::EstimatorError;
use crate::estimator::LandmarkEstimator;
use crate::pose::comparator::{Comparison, ConstraintResult, PoseComparator};
use crate::pose::landmarks::LandmarkSet;
use crate::pose::reference::{Level, PoseLibrary, PoseReference};
use crate::session::feedback::{FeedbackBands, FeedbackTier};
use crate::session::hold::{HoldPhase, HoldTimer};
use crate::session::progression::{ProgressEvent, Progression, Stage};
use crate::session::stats::SessionStats;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, warn};

/// Estimator errors in a row that end the session
pub const MAX_CONSECUTIVE_FAILURES: u32 = 30;

/// Manual control input, applied between frames
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Jump to a level (validated when applied)
    JumpTo(u8),
    /// Back to level 1
    Reset,
}

/// Something the renderer should announce
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "level", rename_all = "snake_case")]
pub enum SessionEvent {
    LevelComplete(Level),
    JourneyComplete,
    Jumped(Level),
    Reset,
    /// A jump target outside 1..=5 was ignored
    JumpRejected(u8),
}

impl From<ProgressEvent> for SessionEvent {
    fn from(event: ProgressEvent) -> Self {
        match event {
            ProgressEvent::LevelComplete(level) => SessionEvent::LevelComplete(level),
            ProgressEvent::JourneyComplete => SessionEvent::JourneyComplete,
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub stage: Stage,
    /// Level being practised after this frame
    pub level: Level,
    pub pose_name: &'static str,
    /// Accuracy in [0, 1]
    pub accuracy: f32,
    /// Accuracy on the 0–100 display scale
    pub accuracy_percent: f32,
    pub detected: bool,
    pub feedback: FeedbackTier,
    /// Hold progress in [0, 1]
    pub hold_fraction: f32,
    pub hold_remaining_secs: f32,
    pub events: Vec<SessionEvent>,
    pub constraints: Vec<ConstraintResult>,
}

impl SessionSnapshot {
    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Complete
    }
}

/// Owns the session state and drives the per-frame pipeline
pub struct SessionController {
    library: PoseLibrary,
    comparator: PoseComparator,
    bands: FeedbackBands,
    progression: Progression,
    timer: HoldTimer,
    pending: VecDeque<Command>,
    stats: SessionStats,
    /// Estimator errors in a row
    failures: u32,
}

impl SessionController {
    pub fn new(config: &Config) -> Self {
        let library = config.library();
        let progression = Progression::from_library(&library, config.acceptance_thresholds);
        let timer = progression.timer();
        SessionController {
            library,
            comparator: PoseComparator::new(config.comparator_settings()),
            bands: config.feedback,
            progression,
            timer,
            pending: VecDeque::new(),
            stats: SessionStats::new(),
            failures: 0,
        }
    }

    /// Queue a command for the next frame boundary
    pub fn submit(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Fetch landmarks from `estimator` and process them as one frame.
    ///
    /// An estimator error counts as a frame without detection. `Err` is
    /// returned only when the source is exhausted or has failed
    /// `MAX_CONSECUTIVE_FAILURES` times in a row; no frame is processed then.
    pub fn step<E: LandmarkEstimator>(
        &mut self,
        estimator: &mut E,
        frame: &E::Frame,
        elapsed: Duration,
    ) -> Result<SessionSnapshot, EstimatorError> {
        let landmarks = match estimator.estimate(frame) {
            Ok(landmarks) => {
                self.failures = 0;
                landmarks
            }
            Err(EstimatorError::Exhausted) => return Err(EstimatorError::Exhausted),
            Err(e) => {
                self.failures += 1;
                if self.failures >= MAX_CONSECUTIVE_FAILURES {
                    return Err(e);
                }
                warn!(error = %e, failures = self.failures, "estimator failed, treating frame as undetected");
                None
            }
        };
        Ok(self.process_frame(landmarks.as_ref(), elapsed))
    }

    /// Process one frame of landmarks (`None` = nobody detected)
    pub fn process_frame(&mut self, landmarks: Option<&LandmarkSet>, elapsed: Duration) -> SessionSnapshot {
        let events = self.apply_commands();
        let comparison = self.comparator.compare(landmarks, self.current_reference());
        self.finish_frame(comparison, elapsed, events)
    }

    /// Process a frame whose comparison is already known
    #[cfg(test)]
    pub fn process_comparison(&mut self, comparison: Comparison, elapsed: Duration) -> SessionSnapshot {
        let events = self.apply_commands();
        self.finish_frame(comparison, elapsed, events)
    }

    fn apply_commands(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(command) = self.pending.pop_front() {
            match command {
                Command::JumpTo(target) => match self.progression.jump_to(target, &mut self.timer) {
                    Ok(level) => events.push(SessionEvent::Jumped(level)),
                    Err(e) => {
                        warn!(error = %e, "manual jump rejected");
                        events.push(SessionEvent::JumpRejected(target));
                    }
                },
                Command::Reset => {
                    self.progression.reset(&mut self.timer);
                    events.push(SessionEvent::Reset);
                }
            }
            self.stats.level_changed();
        }
        events
    }

    fn finish_frame(
        &mut self,
        comparison: Comparison,
        elapsed: Duration,
        mut events: Vec<SessionEvent>,
    ) -> SessionSnapshot {
        let level = self.progression.level();

        if self.progression.is_complete() {
            self.stats.record(level, &comparison, HoldPhase::BelowThreshold);
        } else {
            // Nobody in frame never counts toward a hold, whatever the threshold.
            let phase = if comparison.detected {
                self.timer.update(comparison.score, elapsed)
            } else {
                self.timer.reset();
                HoldPhase::BelowThreshold
            };
            self.stats.record(level, &comparison, phase);
            let progressed = self.progression.advance(&mut self.timer);
            if !progressed.is_empty() {
                self.stats.level_changed();
            }
            events.extend(progressed.into_iter().map(SessionEvent::from));
        }

        let feedback = if comparison.detected {
            self.bands.tier(comparison.score)
        } else {
            FeedbackTier::Poor
        };

        debug!(
            level = %level,
            score = comparison.score,
            detected = comparison.detected,
            held_ms = self.timer.accumulated().as_millis() as u64,
            "frame processed"
        );

        let current = self.progression.level();
        SessionSnapshot {
            stage: self.progression.stage(),
            level: current,
            pose_name: self.library.get(current).name,
            accuracy: comparison.score,
            accuracy_percent: comparison.percent(),
            detected: comparison.detected,
            feedback,
            hold_fraction: self.timer.fraction(),
            hold_remaining_secs: self.timer.remaining().as_secs_f32(),
            events,
            constraints: comparison.constraints,
        }
    }

    pub fn current_reference(&self) -> &PoseReference {
        self.library.get(self.progression.level())
    }

    pub fn library(&self) -> &PoseLibrary {
        &self.library
    }

    pub fn stage(&self) -> Stage {
        self.progression.stage()
    }

    pub fn level(&self) -> Level {
        self.progression.level()
    }

    #[cfg(test)]
    pub fn hold_timer(&self) -> &HoldTimer {
        &self.timer
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::synth::canonical_pose;

    const FRAME: Duration = Duration::from_millis(100);

    fn controller() -> SessionController {
        SessionController::new(&Config::default())
    }

    fn at_level(level: u8) -> SessionController {
        let mut session = controller();
        session.submit(Command::JumpTo(level));
        session.process_comparison(Comparison::scored(0.0), Duration::ZERO);
        assert_eq!(session.level().number(), level);
        session
    }

    #[test]
    fn test_tree_pose_completes_after_thirty_frames() {
        let mut session = at_level(2);
        assert_eq!(session.current_reference().name, "Tree Pose");

        for frame in 1..=29 {
            let snap = session.process_comparison(Comparison::scored(0.95), FRAME);
            assert_eq!(snap.level.number(), 2, "frame {frame}");
            assert!(snap.events.is_empty());
            assert_eq!(snap.feedback, FeedbackTier::Good);
        }
        assert_eq!(session.hold_timer().accumulated(), FRAME * 29);

        let snap = session.process_comparison(Comparison::scored(0.95), FRAME);
        assert_eq!(snap.level.number(), 3);
        assert_eq!(snap.events, vec![SessionEvent::LevelComplete(Level::new(2).unwrap())]);
        assert_eq!(snap.hold_fraction, 0.0);
        assert_eq!(session.hold_timer().accumulated(), Duration::ZERO);

        // Frame 31 starts counting toward Warrior.
        let snap = session.process_comparison(Comparison::scored(0.95), FRAME);
        assert_eq!(snap.level.number(), 3);
        assert_eq!(session.hold_timer().accumulated(), FRAME);
    }

    #[test]
    fn test_dip_below_threshold_restarts_hold() {
        let mut session = at_level(2);
        for frame in 1..=14 {
            session.process_comparison(Comparison::scored(0.95), FRAME);
            assert_eq!(session.hold_timer().accumulated(), FRAME * frame);
        }

        let snap = session.process_comparison(Comparison::scored(0.80), FRAME);
        assert_eq!(session.hold_timer().accumulated(), Duration::ZERO);
        assert_eq!(snap.feedback, FeedbackTier::Adjust);
        assert_eq!(snap.hold_fraction, 0.0);

        for _ in 16..=44 {
            let snap = session.process_comparison(Comparison::scored(0.95), FRAME);
            assert_eq!(snap.level.number(), 2);
        }
        let snap = session.process_comparison(Comparison::scored(0.95), FRAME);
        assert_eq!(snap.level.number(), 3);
        assert_eq!(session.stats().broken_holds(Level::new(2).unwrap()), 1);
    }

    #[test]
    fn test_no_detection_is_poor_with_zero_score() {
        let mut session = controller();
        let snap = session.process_frame(None, FRAME);
        assert_eq!(snap.accuracy, 0.0);
        assert!(!snap.detected);
        assert_eq!(snap.feedback, FeedbackTier::Poor);
        assert_eq!(snap.accuracy_percent, 0.0);
    }

    #[test]
    fn test_no_detection_never_counts_toward_hold() {
        let config = Config {
            acceptance_thresholds: [0.0; Level::COUNT],
            ..Config::default()
        };
        let mut session = SessionController::new(&config);
        for _ in 0..40 {
            let snap = session.process_frame(None, FRAME);
            assert_eq!(snap.feedback, FeedbackTier::Poor);
            assert!(snap.events.is_empty());
            assert_eq!(snap.hold_fraction, 0.0);
        }
        assert_eq!(session.level(), Level::FIRST);

        // A detected frame still qualifies at a zero threshold.
        session.process_comparison(Comparison::scored(0.0), FRAME);
        assert_eq!(session.hold_timer().accumulated(), FRAME);
        session.process_frame(None, FRAME);
        assert_eq!(session.hold_timer().accumulated(), Duration::ZERO);
    }

    /// Fails with an I/O error for the first `failures` frames, then detects nobody
    struct Flaky {
        failures: u32,
        exhausted: bool,
    }

    impl LandmarkEstimator for Flaky {
        type Frame = ();

        fn estimate(&mut self, _frame: &()) -> Result<Option<LandmarkSet>, EstimatorError> {
            if self.exhausted {
                return Err(EstimatorError::Exhausted);
            }
            if self.failures > 0 {
                self.failures -= 1;
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "camera unplugged").into());
            }
            Ok(None)
        }
    }

    #[test]
    fn test_estimator_error_is_an_undetected_frame() {
        let mut session = controller();
        let mut source = Flaky { failures: 1, exhausted: false };
        let snap = session.step(&mut source, &(), FRAME).unwrap();
        assert!(!snap.detected);
        assert_eq!(snap.feedback, FeedbackTier::Poor);
        assert_eq!(snap.level, Level::FIRST);
        assert_eq!(session.stats().frames(), 1);
    }

    #[test]
    fn test_persistent_estimator_errors_end_the_session() {
        let mut session = controller();
        let mut source = Flaky { failures: MAX_CONSECUTIVE_FAILURES, exhausted: false };
        for _ in 1..MAX_CONSECUTIVE_FAILURES {
            assert!(session.step(&mut source, &(), FRAME).is_ok());
        }
        assert!(matches!(session.step(&mut source, &(), FRAME), Err(EstimatorError::Io(_))));

        // A good frame in between clears the count.
        let mut source = Flaky { failures: MAX_CONSECUTIVE_FAILURES - 1, exhausted: false };
        let mut session = controller();
        for _ in 1..MAX_CONSECUTIVE_FAILURES {
            assert!(session.step(&mut source, &(), FRAME).is_ok());
        }
        assert!(session.step(&mut source, &(), FRAME).is_ok());
        source.failures = MAX_CONSECUTIVE_FAILURES - 1;
        for _ in 1..MAX_CONSECUTIVE_FAILURES {
            assert!(session.step(&mut source, &(), FRAME).is_ok());
        }
    }

    #[test]
    fn test_exhausted_source_processes_nothing() {
        let mut session = controller();
        let mut source = Flaky { failures: 0, exhausted: true };
        assert!(matches!(session.step(&mut source, &(), FRAME), Err(EstimatorError::Exhausted)));
        assert_eq!(session.stats().frames(), 0);
    }

    #[test]
    fn test_full_journey_on_canonical_poses() {
        let mut session = controller();
        let mut completed = Vec::new();
        let mut journey_done = false;

        for _ in 0..200 {
            if session.stage() == Stage::Complete {
                break;
            }
            let pose = canonical_pose(session.level());
            let snap = session.process_frame(Some(&pose), FRAME);
            for event in snap.events {
                match event {
                    SessionEvent::LevelComplete(level) => completed.push(level.number()),
                    SessionEvent::JourneyComplete => journey_done = true,
                    _ => {}
                }
            }
        }

        assert_eq!(completed, vec![1, 2, 3, 4, 5]);
        assert!(journey_done);
        assert_eq!(session.stage(), Stage::Complete);
    }

    #[test]
    fn test_complete_stage_stays_put() {
        let mut session = at_level(5);
        for _ in 0..30 {
            session.process_comparison(Comparison::scored(1.0), FRAME);
        }
        assert_eq!(session.stage(), Stage::Complete);
        let snap = session.process_comparison(Comparison::scored(1.0), Duration::from_secs(10));
        assert!(snap.is_complete());
        assert!(snap.events.is_empty());
        assert_eq!(snap.level, Level::LAST);
    }

    #[test]
    fn test_commands_apply_at_next_frame() {
        let mut session = controller();
        session.process_comparison(Comparison::scored(0.95), FRAME);
        session.submit(Command::JumpTo(3));
        // Nothing changes until a frame is processed.
        assert_eq!(session.level(), Level::FIRST);
        assert_eq!(session.hold_timer().accumulated(), FRAME);

        let snap = session.process_comparison(Comparison::scored(0.2), FRAME);
        assert_eq!(snap.level.number(), 3);
        assert_eq!(snap.events, vec![SessionEvent::Jumped(Level::new(3).unwrap())]);
        assert_eq!(snap.hold_fraction, 0.0);
    }

    #[test]
    fn test_rejected_jump_keeps_progress() {
        let mut session = at_level(4);
        session.process_comparison(Comparison::scored(0.95), FRAME);
        session.submit(Command::JumpTo(8));
        let snap = session.process_comparison(Comparison::scored(0.95), FRAME);
        assert_eq!(snap.level.number(), 4);
        assert_eq!(snap.events, vec![SessionEvent::JumpRejected(8)]);
        assert_eq!(session.hold_timer().accumulated(), FRAME * 2);
    }

    #[test]
    fn test_reset_from_complete() {
        let mut session = at_level(5);
        for _ in 0..30 {
            session.process_comparison(Comparison::scored(1.0), FRAME);
        }
        assert_eq!(session.stage(), Stage::Complete);

        session.submit(Command::Reset);
        let snap = session.process_comparison(Comparison::scored(0.0), FRAME);
        assert_eq!(snap.stage, Stage::Level(Level::FIRST));
        assert_eq!(snap.events, vec![SessionEvent::Reset]);
        assert_eq!(session.hold_timer().accumulated(), Duration::ZERO);
    }

    #[test]
    fn test_commands_apply_in_order() {
        let mut session = controller();
        session.submit(Command::JumpTo(4));
        session.submit(Command::Reset);
        session.submit(Command::JumpTo(2));
        let snap = session.process_comparison(Comparison::scored(0.0), FRAME);
        assert_eq!(snap.level.number(), 2);
        assert_eq!(snap.events.len(), 3);
    }

    #[test]
    fn test_step_pulls_from_estimator() {
        use crate::estimator::simulated::{SimulatedEstimator, SimulationNoise};

        let mut session = controller();
        let mut sim = SimulatedEstimator::new(5, SimulationNoise::none());
        let level = session.level();
        let snap = session.step(&mut sim, &level, FRAME).unwrap();
        assert!(snap.detected);
        assert_eq!(snap.feedback, FeedbackTier::Good);
        assert_eq!(session.hold_timer().accumulated(), FRAME);
    }

    #[test]
    fn test_snapshot_percent_scale() {
        let mut session = controller();
        let snap = session.process_comparison(Comparison::scored(0.75), FRAME);
        assert!((snap.accuracy_percent - 75.0).abs() < 1e-4);
        let json = serde_json::to_value(&snap).unwrap();
        assert!((json["accuracy_percent"].as_f64().unwrap() - 75.0).abs() < 1e-3);
        assert_eq!(snap.feedback, FeedbackTier::Adjust);
        assert_eq!(snap.pose_name, "Mountain Pose");
    }
}
