//! Pose comparator: live landmarks vs. a reference pose
//!
//! Aggregation is the weighted mean of per-constraint similarities over the
//! constraints that could be measured this frame. A weighted sum does not
//! depend on evaluation order, and each similarity only grows as its
//! measurement approaches the target range, so the aggregate is monotonic in
//! every constraint.

use crate::pose::landmarks::{inclination, joint_angle, LandmarkId, LandmarkSet, Point};
use crate::pose::reference::{Constraint, Measure, PoseReference};
use serde::Serialize;
use tracing::debug;

/// Torsos shorter than this (in normalized units) cannot normalise distances
const MIN_TORSO_LENGTH: f32 = 1e-3;

/// Tunables for measurement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComparatorSettings {
    /// Landmarks below this visibility are treated as missing
    pub min_visibility: f32,
    /// Frame width / height, applied to x so angles are not skewed
    pub aspect_ratio: f32,
}

impl Default for ComparatorSettings {
    fn default() -> Self {
        ComparatorSettings {
            min_visibility: 0.5,
            aspect_ratio: 1.0,
        }
    }
}

/// Outcome of one constraint for one frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConstraintResult {
    pub name: &'static str,
    /// `None` when the landmarks it needs were not visible
    pub measured: Option<f32>,
    pub similarity: Option<f32>,
    pub weight: f32,
}

/// Accuracy of a frame against a reference
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comparison {
    /// Aggregate accuracy in [0, 1]
    pub score: f32,
    /// False when no body (or none of the pose's landmarks) was found
    pub detected: bool,
    pub constraints: Vec<ConstraintResult>,
}

impl Comparison {
    /// The no-detection outcome: score 0 and the undetected flag
    pub fn undetected() -> Self {
        Comparison {
            score: 0.0,
            detected: false,
            constraints: Vec::new(),
        }
    }

    /// A detected frame with a known score and no breakdown
    #[cfg(test)]
    pub fn scored(score: f32) -> Self {
        Comparison {
            score: score.clamp(0.0, 1.0),
            detected: true,
            constraints: Vec::new(),
        }
    }

    pub fn percent(&self) -> f32 {
        self.score * 100.0
    }
}

#[derive(Clone, Copy, Debug)]
struct Torso {
    hip: Point,
    shoulder: Point,
    length: f32,
}

/// Scores landmark sets against pose references
#[derive(Clone, Debug, Default)]
pub struct PoseComparator {
    settings: ComparatorSettings,
}

impl PoseComparator {
    pub fn new(settings: ComparatorSettings) -> Self {
        PoseComparator { settings }
    }

    /// Score `landmarks` against `reference`. `None` means nothing was detected.
    pub fn compare(&self, landmarks: Option<&LandmarkSet>, reference: &PoseReference) -> Comparison {
        let Some(set) = landmarks else {
            return Comparison::undetected();
        };
        if set.is_empty(self.settings.min_visibility) {
            return Comparison::undetected();
        }

        let torso = self.torso(set);
        let results: Vec<ConstraintResult> = reference
            .constraints
            .iter()
            .map(|constraint| self.evaluate(set, torso, constraint))
            .collect();

        let (weighted, total_weight) = results
            .iter()
            .filter_map(|r| r.similarity.map(|s| (s * r.weight, r.weight)))
            .fold((0.0f32, 0.0f32), |(ws, tw), (s, w)| (ws + s, tw + w));

        if total_weight <= 0.0 {
            debug!(level = %reference.level, "no constraint measurable, treating frame as undetected");
            return Comparison {
                score: 0.0,
                detected: false,
                constraints: results,
            };
        }

        Comparison {
            score: (weighted / total_weight).clamp(0.0, 1.0),
            detected: true,
            constraints: results,
        }
    }

    fn evaluate(&self, set: &LandmarkSet, torso: Option<Torso>, constraint: &Constraint) -> ConstraintResult {
        let mut best: Option<(f32, f32)> = self
            .measure(set, torso, &constraint.measure)
            .map(|value| (value, constraint.similarity(value)));

        if constraint.either_side {
            let mirrored = constraint.measure.mirrored();
            if let Some(value) = self.measure(set, torso, &mirrored) {
                let similarity = constraint.similarity(value);
                if best.map_or(true, |(_, s)| similarity > s) {
                    best = Some((value, similarity));
                }
            }
        }

        ConstraintResult {
            name: constraint.name,
            measured: best.map(|(value, _)| value),
            similarity: best.map(|(_, similarity)| similarity),
            weight: constraint.weight,
        }
    }

    fn point(&self, set: &LandmarkSet, id: LandmarkId) -> Option<Point> {
        set.visible_point(id, self.settings.min_visibility, self.settings.aspect_ratio)
    }

    fn torso(&self, set: &LandmarkSet) -> Option<Torso> {
        let shoulder = self
            .point(set, LandmarkId::LeftShoulder)?
            .midpoint(self.point(set, LandmarkId::RightShoulder)?);
        let hip = self
            .point(set, LandmarkId::LeftHip)?
            .midpoint(self.point(set, LandmarkId::RightHip)?);
        let length = shoulder.distance(hip);
        if length < MIN_TORSO_LENGTH {
            return None;
        }
        Some(Torso {
            hip,
            shoulder,
            length,
        })
    }

    /// Value of `measure` on this frame, or `None` if it cannot be taken
    fn measure(&self, set: &LandmarkSet, torso: Option<Torso>, measure: &Measure) -> Option<f32> {
        let torso = if measure.needs_torso() { Some(torso?) } else { None };
        let scale = torso.map_or(1.0, |t| t.length);

        match *measure {
            Measure::JointAngle { a, vertex, c } => Some(joint_angle(
                self.point(set, a)?,
                self.point(set, vertex)?,
                self.point(set, c)?,
            )),
            Measure::HorizontalGap { a, b } => {
                Some((self.point(set, a)?.x - self.point(set, b)?.x).abs() / scale)
            }
            Measure::VerticalGap { upper, lower } => {
                Some((self.point(set, lower)?.y - self.point(set, upper)?.y) / scale)
            }
            Measure::LevelDifference { a, b } => {
                Some((self.point(set, a)?.y - self.point(set, b)?.y).abs() / scale)
            }
            Measure::TorsoInclination => torso.map(|t| inclination(t.hip, t.shoulder)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmarks::Landmark;
    use crate::pose::reference::{get_reference, AcceptRange, Level};
    use crate::pose::synth::canonical_pose;
    use std::time::Duration;

    fn comparator() -> PoseComparator {
        PoseComparator::new(ComparatorSettings::default())
    }

    fn moved(set: &LandmarkSet, id: LandmarkId, x: f32, y: f32) -> LandmarkSet {
        let old = *set.get(id);
        set.clone().with(id, Landmark { x, y, ..old })
    }

    #[test]
    fn test_canonical_poses_score_high() {
        for level in Level::all() {
            let reference = get_reference(level.number()).unwrap();
            let result = comparator().compare(Some(&canonical_pose(level)), reference);
            assert!(result.detected);
            assert!(
                result.score >= 0.95,
                "level {} scored {}",
                level,
                result.score
            );
        }
    }

    #[test]
    fn test_no_detection_scores_zero() {
        let reference = get_reference(2).unwrap();
        let result = comparator().compare(None, reference);
        assert_eq!(result, Comparison::undetected());

        let hidden = comparator().compare(Some(&LandmarkSet::hidden()), reference);
        assert!(!hidden.detected);
        assert_eq!(hidden.score, 0.0);
    }

    #[test]
    fn test_compare_is_deterministic() {
        let reference = get_reference(3).unwrap();
        let set = canonical_pose(Level::new(1).unwrap());
        let first = comparator().compare(Some(&set), reference);
        let second = comparator().compare(Some(&set), reference);
        assert_eq!(first, second);
    }

    #[test]
    fn test_wrong_pose_scores_lower() {
        let tree = get_reference(2).unwrap();
        let mountain = canonical_pose(Level::new(1).unwrap());
        let result = comparator().compare(Some(&mountain), tree);
        assert!(result.score < 0.9, "mountain scored {} as tree", result.score);
    }

    #[test]
    fn test_order_independent() {
        let reference = get_reference(1).unwrap().clone();
        let mut reversed = reference.clone();
        reversed.constraints.reverse();
        let set = moved(
            &canonical_pose(Level::FIRST),
            LandmarkId::LeftWrist,
            0.30,
            0.45,
        );
        let a = comparator().compare(Some(&set), &reference);
        let b = comparator().compare(Some(&set), &reversed);
        assert!((a.score - b.score).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic_in_one_measurement() {
        // Spread the feet progressively less; score must never drop.
        let reference = get_reference(1).unwrap();
        let base = canonical_pose(Level::FIRST);
        let mut previous = -1.0;
        for step in 0..8 {
            let x = 0.85 - step as f32 * 0.045;
            let set = moved(&base, LandmarkId::RightAnkle, x, 0.9);
            let score = comparator().compare(Some(&set), reference).score;
            assert!(score >= previous - 1e-6, "step {step}: {score} < {previous}");
            previous = score;
        }
    }

    #[test]
    fn test_low_visibility_landmark_is_excluded() {
        let reference = get_reference(1).unwrap();
        let base = canonical_pose(Level::FIRST);
        let wrist = *base.get(LandmarkId::LeftWrist);
        // Badly bent arm, but invisible: it must not drag the score down.
        let set = base.clone().with(
            LandmarkId::LeftWrist,
            Landmark {
                x: 0.2,
                y: 0.3,
                visibility: 0.1,
                ..wrist
            },
        );
        let result = comparator().compare(Some(&set), reference);
        assert!(result.detected);
        assert!(result.score >= 0.95);
        let arm = result
            .constraints
            .iter()
            .find(|c| c.name == "left arm straight")
            .unwrap();
        assert_eq!(arm.similarity, None);
    }

    #[test]
    fn test_all_required_landmarks_missing_is_undetected() {
        let reference = PoseReference {
            level: Level::FIRST,
            name: "test",
            sanskrit: "",
            instruction: "",
            hint: "",
            hold: Duration::from_secs(1),
            constraints: vec![Constraint::new(
                "knee",
                Measure::JointAngle {
                    a: LandmarkId::LeftHip,
                    vertex: LandmarkId::LeftKnee,
                    c: LandmarkId::LeftAnkle,
                },
                AcceptRange::new(170.0, 180.0),
                30.0,
            )],
        };
        // Only the face is visible.
        let set = LandmarkSet::hidden().with(LandmarkId::Nose, Landmark::new(0.5, 0.2, 0.9));
        let result = comparator().compare(Some(&set), &reference);
        assert!(!result.detected);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_either_side_takes_best_side() {
        let reference = get_reference(2).unwrap();
        let set = canonical_pose(Level::new(2).unwrap());
        let result = comparator().compare(Some(&set), reference);
        let bent = result
            .constraints
            .iter()
            .find(|c| c.name == "raised knee bent")
            .unwrap();
        assert_eq!(bent.similarity, Some(1.0));
        let straight = result
            .constraints
            .iter()
            .find(|c| c.name == "standing leg straight")
            .unwrap();
        assert_eq!(straight.similarity, Some(1.0));
    }

    #[test]
    fn test_aspect_ratio_is_applied() {
        let reference = get_reference(1).unwrap();
        let set = canonical_pose(Level::FIRST);
        let wide = PoseComparator::new(ComparatorSettings {
            aspect_ratio: 4.0,
            ..ComparatorSettings::default()
        });
        let result = wide.compare(Some(&set), reference);
        let feet = result
            .constraints
            .iter()
            .find(|c| c.name == "feet together")
            .unwrap();
        // 0.06 wide, stretched 4x, over a 0.25 torso
        assert!((feet.measured.unwrap() - 0.96).abs() < 1e-3);
    }
}
