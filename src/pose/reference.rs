//! Pose reference library: the five target poses
//!
//! Each reference is a set of weighted geometric constraints plus the hold
//! duration needed to master the level. References are immutable and the
//! standard library is built once per process.

use crate::error::{PoseError, PoseResult};
use crate::pose::landmarks::LandmarkId;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use LandmarkId::*;

/// One of the five ordered levels (1..=5)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Level(u8);

impl Level {
    pub const COUNT: usize = 5;
    pub const FIRST: Level = Level(1);
    pub const LAST: Level = Level(5);

    pub fn new(number: u8) -> PoseResult<Level> {
        if (1..=Self::COUNT as u8).contains(&number) {
            Ok(Level(number))
        } else {
            Err(PoseError::InvalidLevel(number))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position, for per-level tables
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// The following level, or `None` after the last one
    pub fn next(self) -> Option<Level> {
        Level::new(self.0 + 1).ok()
    }

    pub fn all() -> impl Iterator<Item = Level> {
        (1..=Self::COUNT as u8).map(Level)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepted interval for a measurement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcceptRange {
    pub min: f32,
    pub max: f32,
}

impl AcceptRange {
    pub fn new(min: f32, max: f32) -> Self {
        AcceptRange { min, max }
    }

    /// Open-ended range `[min, ∞)`
    pub fn at_least(min: f32) -> Self {
        AcceptRange::new(min, f32::INFINITY)
    }

    /// 0 inside the range, otherwise the distance to the nearest bound
    pub fn deviation(&self, value: f32) -> f32 {
        if value < self.min {
            self.min - value
        } else if value > self.max {
            value - self.max
        } else {
            0.0
        }
    }
}

/// What a constraint measures on the body.
///
/// Distances are expressed in torso lengths (mid-shoulder to mid-hip) so they
/// do not depend on how far the user stands from the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Measure {
    /// Interior angle at `vertex`, degrees
    JointAngle {
        a: LandmarkId,
        vertex: LandmarkId,
        c: LandmarkId,
    },
    /// |a.x - b.x|, torso lengths
    HorizontalGap { a: LandmarkId, b: LandmarkId },
    /// lower.y - upper.y, torso lengths; positive when `lower` sits lower in the frame
    VerticalGap { upper: LandmarkId, lower: LandmarkId },
    /// |a.y - b.y|, torso lengths
    LevelDifference { a: LandmarkId, b: LandmarkId },
    /// Lean of the hip→shoulder axis away from vertical, degrees
    TorsoInclination,
}

impl Measure {
    /// Same measurement on the other side of the body
    pub fn mirrored(&self) -> Measure {
        match *self {
            Measure::JointAngle { a, vertex, c } => Measure::JointAngle {
                a: a.mirrored(),
                vertex: vertex.mirrored(),
                c: c.mirrored(),
            },
            Measure::HorizontalGap { a, b } => Measure::HorizontalGap {
                a: a.mirrored(),
                b: b.mirrored(),
            },
            Measure::VerticalGap { upper, lower } => Measure::VerticalGap {
                upper: upper.mirrored(),
                lower: lower.mirrored(),
            },
            Measure::LevelDifference { a, b } => Measure::LevelDifference {
                a: a.mirrored(),
                b: b.mirrored(),
            },
            Measure::TorsoInclination => Measure::TorsoInclination,
        }
    }

    /// Whether the value is normalised by torso length
    pub fn needs_torso(&self) -> bool {
        matches!(
            self,
            Measure::HorizontalGap { .. }
                | Measure::VerticalGap { .. }
                | Measure::LevelDifference { .. }
                | Measure::TorsoInclination
        )
    }
}

/// A weighted geometric requirement of a pose
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub name: &'static str,
    pub measure: Measure,
    pub target: AcceptRange,
    /// Deviation at which similarity reaches zero
    pub tolerance: f32,
    pub weight: f32,
    /// Satisfied by either side of the body (best side counts)
    pub either_side: bool,
}

impl Constraint {
    pub fn new(name: &'static str, measure: Measure, target: AcceptRange, tolerance: f32) -> Self {
        Constraint {
            name,
            measure,
            target,
            tolerance,
            weight: 1.0,
            either_side: false,
        }
    }

    pub fn weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn either_side(mut self) -> Self {
        self.either_side = true;
        self
    }

    /// Similarity in [0, 1] for a measured value; 1 inside the target range,
    /// falling linearly to 0 at `tolerance` outside it
    pub fn similarity(&self, value: f32) -> f32 {
        let deviation = self.target.deviation(value);
        if self.tolerance <= 0.0 {
            return if deviation == 0.0 { 1.0 } else { 0.0 };
        }
        (1.0 - deviation / self.tolerance).clamp(0.0, 1.0)
    }
}

/// Target pose for one level
#[derive(Clone, Debug, PartialEq)]
pub struct PoseReference {
    pub level: Level,
    pub name: &'static str,
    pub sanskrit: &'static str,
    pub instruction: &'static str,
    /// Corrective cue shown while the pose is not yet right
    pub hint: &'static str,
    pub hold: Duration,
    pub constraints: Vec<Constraint>,
}

/// The five references, indexed by level
#[derive(Clone, Debug)]
pub struct PoseLibrary {
    references: Vec<PoseReference>,
}

impl PoseLibrary {
    /// The built-in poses with their default hold durations
    pub fn standard() -> Self {
        PoseLibrary {
            references: vec![mountain(), tree(), warrior(), child(), lotus()],
        }
    }

    /// Replace hold durations, one per level
    pub fn with_hold_durations(mut self, holds: [Duration; Level::COUNT]) -> Self {
        for (reference, hold) in self.references.iter_mut().zip(holds) {
            reference.hold = hold;
        }
        self
    }

    pub fn get(&self, level: Level) -> &PoseReference {
        &self.references[level.index()]
    }

    pub fn get_reference(&self, level: u8) -> PoseResult<&PoseReference> {
        Ok(self.get(Level::new(level)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoseReference> {
        self.references.iter()
    }
}

impl Default for PoseLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

static STANDARD: OnceLock<PoseLibrary> = OnceLock::new();

/// Reference for `level` from the built-in library
pub fn get_reference(level: u8) -> PoseResult<&'static PoseReference> {
    STANDARD.get_or_init(PoseLibrary::standard).get_reference(level)
}

fn angle(a: LandmarkId, vertex: LandmarkId, c: LandmarkId) -> Measure {
    Measure::JointAngle { a, vertex, c }
}

fn mountain() -> PoseReference {
    PoseReference {
        level: Level(1),
        name: "Mountain Pose",
        sanskrit: "Tadasana",
        instruction: "Stand straight with arms at your sides and feet together.",
        hint: "Stand tall. Keep your feet together, relax your shoulders and let your arms hang straight.",
        hold: Duration::from_secs_f64(2.0),
        constraints: vec![
            Constraint::new(
                "feet together",
                Measure::HorizontalGap { a: LeftAnkle, b: RightAnkle },
                AcceptRange::new(0.0, 0.3),
                0.4,
            )
            .weight(30.0),
            Constraint::new(
                "shoulders level",
                Measure::LevelDifference { a: LeftShoulder, b: RightShoulder },
                AcceptRange::new(0.0, 0.08),
                0.2,
            )
            .weight(15.0),
            Constraint::new(
                "left arm straight",
                angle(LeftShoulder, LeftElbow, LeftWrist),
                AcceptRange::new(160.0, 180.0),
                40.0,
            )
            .weight(10.0),
            Constraint::new(
                "right arm straight",
                angle(RightShoulder, RightElbow, RightWrist),
                AcceptRange::new(160.0, 180.0),
                40.0,
            )
            .weight(10.0),
            Constraint::new(
                "left arm at side",
                angle(LeftHip, LeftShoulder, LeftElbow),
                AcceptRange::new(0.0, 25.0),
                35.0,
            )
            .weight(7.5),
            Constraint::new(
                "right arm at side",
                angle(RightHip, RightShoulder, RightElbow),
                AcceptRange::new(0.0, 25.0),
                35.0,
            )
            .weight(7.5),
            Constraint::new(
                "left leg straight",
                angle(LeftHip, LeftKnee, LeftAnkle),
                AcceptRange::new(165.0, 180.0),
                30.0,
            )
            .weight(5.0),
            Constraint::new(
                "right leg straight",
                angle(RightHip, RightKnee, RightAnkle),
                AcceptRange::new(165.0, 180.0),
                30.0,
            )
            .weight(5.0),
            Constraint::new(
                "torso upright",
                Measure::TorsoInclination,
                AcceptRange::new(0.0, 8.0),
                20.0,
            )
            .weight(10.0),
        ],
    }
}

fn tree() -> PoseReference {
    PoseReference {
        level: Level(2),
        name: "Tree Pose",
        sanskrit: "Vrikshasana",
        instruction: "Balance on one leg and place the other foot on the inner thigh.",
        hint: "Shift your weight to one leg and bring the other foot up to the inner thigh. Use your hands for balance.",
        hold: Duration::from_secs_f64(3.0),
        constraints: vec![
            Constraint::new(
                "raised knee bent",
                angle(LeftHip, LeftKnee, LeftAnkle),
                AcceptRange::new(20.0, 80.0),
                50.0,
            )
            .weight(40.0)
            .either_side(),
            Constraint::new(
                "standing leg straight",
                angle(LeftHip, LeftKnee, LeftAnkle),
                AcceptRange::new(165.0, 180.0),
                30.0,
            )
            .weight(30.0)
            .either_side(),
            Constraint::new(
                "raised foot off the floor",
                Measure::VerticalGap { upper: LeftAnkle, lower: RightAnkle },
                AcceptRange::at_least(0.4),
                0.4,
            )
            .weight(10.0)
            .either_side(),
            Constraint::new(
                "torso upright",
                Measure::TorsoInclination,
                AcceptRange::new(0.0, 10.0),
                25.0,
            )
            .weight(20.0),
        ],
    }
}

fn warrior() -> PoseReference {
    PoseReference {
        level: Level(3),
        name: "Warrior Pose",
        sanskrit: "Virabhadrasana",
        instruction: "Bend one knee deeply, keep the back leg straight and extend your arms overhead.",
        hint: "Bend the front knee and keep the back leg straight. Reach your arms up to increase stability.",
        hold: Duration::from_secs_f64(2.5),
        constraints: vec![
            Constraint::new(
                "front knee bent",
                angle(LeftHip, LeftKnee, LeftAnkle),
                AcceptRange::new(80.0, 110.0),
                60.0,
            )
            .weight(40.0)
            .either_side(),
            Constraint::new(
                "back leg straight",
                angle(LeftHip, LeftKnee, LeftAnkle),
                AcceptRange::new(160.0, 180.0),
                40.0,
            )
            .weight(20.0)
            .either_side(),
            Constraint::new(
                "left arm raised",
                Measure::VerticalGap { upper: LeftWrist, lower: LeftShoulder },
                AcceptRange::at_least(0.4),
                0.6,
            )
            .weight(15.0),
            Constraint::new(
                "right arm raised",
                Measure::VerticalGap { upper: RightWrist, lower: RightShoulder },
                AcceptRange::at_least(0.4),
                0.6,
            )
            .weight(15.0),
            Constraint::new(
                "torso upright",
                Measure::TorsoInclination,
                AcceptRange::new(0.0, 15.0),
                30.0,
            )
            .weight(10.0),
        ],
    }
}

fn child() -> PoseReference {
    PoseReference {
        level: Level(4),
        name: "Child's Pose",
        sanskrit: "Balasana",
        instruction: "Kneel and fold forward with your arms extended.",
        hint: "Kneel and fold forward, rest your forehead toward the mat and breathe deeply.",
        hold: Duration::from_secs_f64(2.0),
        constraints: vec![
            Constraint::new(
                "head below hips",
                Measure::VerticalGap { upper: LeftHip, lower: Nose },
                AcceptRange::at_least(0.0),
                0.6,
            )
            .weight(35.0)
            .either_side(),
            Constraint::new(
                "knees folded",
                angle(LeftHip, LeftKnee, LeftAnkle),
                AcceptRange::new(20.0, 70.0),
                60.0,
            )
            .weight(35.0)
            .either_side(),
            Constraint::new(
                "torso folded forward",
                Measure::TorsoInclination,
                AcceptRange::new(60.0, 180.0),
                45.0,
            )
            .weight(30.0),
        ],
    }
}

fn lotus() -> PoseReference {
    PoseReference {
        level: Level(5),
        name: "Lotus Pose",
        sanskrit: "Padmasana",
        instruction: "Sit cross-legged with a straight spine and hands on your knees.",
        hint: "Sit upright with a straight spine. Cross your legs comfortably and rest your hands on your knees.",
        hold: Duration::from_secs_f64(3.0),
        constraints: vec![
            Constraint::new(
                "spine upright",
                Measure::TorsoInclination,
                AcceptRange::new(0.0, 10.0),
                25.0,
            )
            .weight(40.0),
            Constraint::new(
                "head over shoulders",
                Measure::VerticalGap { upper: Nose, lower: LeftShoulder },
                AcceptRange::new(0.2, 0.8),
                0.4,
            )
            .weight(20.0),
            Constraint::new(
                "left leg crossed",
                angle(LeftHip, LeftKnee, LeftAnkle),
                AcceptRange::new(0.0, 60.0),
                60.0,
            )
            .weight(10.0),
            Constraint::new(
                "right leg crossed",
                angle(RightHip, RightKnee, RightAnkle),
                AcceptRange::new(0.0, 60.0),
                60.0,
            )
            .weight(10.0),
            Constraint::new(
                "left knee low",
                Measure::VerticalGap { upper: LeftHip, lower: LeftKnee },
                AcceptRange::new(0.0, 0.6),
                0.4,
            )
            .weight(10.0),
            Constraint::new(
                "right knee low",
                Measure::VerticalGap { upper: RightHip, lower: RightKnee },
                AcceptRange::new(0.0, 0.6),
                0.4,
            )
            .weight(10.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_durations() {
        let expected = [2.0, 3.0, 2.5, 2.0, 3.0];
        for (level, secs) in (1..=5).zip(expected) {
            let reference = get_reference(level).unwrap();
            assert_eq!(reference.hold, Duration::from_secs_f64(secs));
            assert_eq!(reference.level.number(), level);
        }
    }

    #[test]
    fn test_invalid_levels() {
        assert_eq!(get_reference(0).unwrap_err(), PoseError::InvalidLevel(0));
        assert_eq!(get_reference(6).unwrap_err(), PoseError::InvalidLevel(6));
        assert!(Level::new(255).is_err());
    }

    #[test]
    fn test_level_sequence() {
        let levels: Vec<u8> = Level::all().map(Level::number).collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 5]);
        assert_eq!(Level::FIRST.next(), Level::new(2).ok());
        assert_eq!(Level::LAST.next(), None);
    }

    #[test]
    fn test_every_pose_has_positive_weights() {
        for reference in PoseLibrary::standard().iter() {
            assert!(!reference.constraints.is_empty());
            assert!(reference.constraints.iter().all(|c| c.weight > 0.0 && c.tolerance > 0.0));
        }
    }

    #[test]
    fn test_similarity_falls_off_linearly() {
        let c = Constraint::new(
            "arm",
            Measure::TorsoInclination,
            AcceptRange::new(160.0, 180.0),
            40.0,
        );
        assert_eq!(c.similarity(170.0), 1.0);
        assert!((c.similarity(140.0) - 0.5).abs() < 1e-6);
        assert_eq!(c.similarity(100.0), 0.0);
    }

    #[test]
    fn test_custom_hold_durations() {
        let holds = [Duration::from_secs(1); Level::COUNT];
        let library = PoseLibrary::standard().with_hold_durations(holds);
        assert!(library.iter().all(|r| r.hold == Duration::from_secs(1)));
    }

    #[test]
    fn test_mirrored_measure() {
        let m = angle(LeftHip, LeftKnee, LeftAnkle).mirrored();
        assert_eq!(m, angle(RightHip, RightKnee, RightAnkle));
    }
}
