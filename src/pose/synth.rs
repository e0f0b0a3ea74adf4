//! Canonical skeletons for each level
//!
//! Hand-placed landmark sets that satisfy every constraint of their level.
//! The simulated estimator perturbs them; tests use them as fixtures.

use crate::pose::landmarks::{Landmark, LandmarkId, LandmarkSet};
use crate::pose::reference::Level;

use LandmarkId::*;

const VISIBLE: f32 = 0.95;

fn skeleton(points: &[(LandmarkId, f32, f32)]) -> LandmarkSet {
    points
        .iter()
        .fold(LandmarkSet::hidden(), |set, &(id, x, y)| {
            set.with(id, Landmark::new(x, y, VISIBLE))
        })
}

/// A landmark set that performs `level`'s pose (frontal view, Child's Pose from the side)
pub fn canonical_pose(level: Level) -> LandmarkSet {
    match level.number() {
        1 => skeleton(&[
            (Nose, 0.50, 0.18),
            (LeftShoulder, 0.45, 0.30),
            (RightShoulder, 0.55, 0.30),
            (LeftElbow, 0.44, 0.42),
            (RightElbow, 0.56, 0.42),
            (LeftWrist, 0.43, 0.53),
            (RightWrist, 0.57, 0.53),
            (LeftHip, 0.47, 0.55),
            (RightHip, 0.53, 0.55),
            (LeftKnee, 0.47, 0.72),
            (RightKnee, 0.53, 0.72),
            (LeftAnkle, 0.47, 0.90),
            (RightAnkle, 0.53, 0.90),
        ]),
        2 => skeleton(&[
            (Nose, 0.50, 0.18),
            (LeftShoulder, 0.45, 0.30),
            (RightShoulder, 0.55, 0.30),
            (LeftElbow, 0.42, 0.40),
            (RightElbow, 0.58, 0.40),
            (LeftWrist, 0.49, 0.36),
            (RightWrist, 0.51, 0.36),
            (LeftHip, 0.47, 0.55),
            (RightHip, 0.53, 0.55),
            (LeftKnee, 0.36, 0.64),
            (RightKnee, 0.53, 0.72),
            (LeftAnkle, 0.49, 0.66),
            (RightAnkle, 0.53, 0.90),
        ]),
        3 => skeleton(&[
            (Nose, 0.50, 0.16),
            (LeftShoulder, 0.45, 0.30),
            (RightShoulder, 0.55, 0.30),
            (LeftElbow, 0.43, 0.18),
            (RightElbow, 0.57, 0.18),
            (LeftWrist, 0.42, 0.06),
            (RightWrist, 0.58, 0.06),
            (LeftHip, 0.47, 0.55),
            (RightHip, 0.53, 0.55),
            (LeftKnee, 0.37, 0.55),
            (RightKnee, 0.65, 0.70),
            (LeftAnkle, 0.37, 0.75),
            (RightAnkle, 0.77, 0.85),
        ]),
        4 => skeleton(&[
            (Nose, 0.25, 0.80),
            (LeftShoulder, 0.35, 0.71),
            (RightShoulder, 0.35, 0.73),
            (LeftElbow, 0.22, 0.78),
            (RightElbow, 0.22, 0.80),
            (LeftWrist, 0.10, 0.82),
            (RightWrist, 0.10, 0.84),
            (LeftHip, 0.60, 0.59),
            (RightHip, 0.60, 0.61),
            (LeftKnee, 0.50, 0.79),
            (RightKnee, 0.50, 0.81),
            (LeftAnkle, 0.72, 0.79),
            (RightAnkle, 0.72, 0.81),
        ]),
        _ => skeleton(&[
            (Nose, 0.50, 0.30),
            (LeftShoulder, 0.44, 0.42),
            (RightShoulder, 0.56, 0.42),
            (LeftElbow, 0.37, 0.55),
            (RightElbow, 0.63, 0.55),
            (LeftWrist, 0.32, 0.68),
            (RightWrist, 0.68, 0.68),
            (LeftHip, 0.46, 0.67),
            (RightHip, 0.54, 0.67),
            (LeftKnee, 0.30, 0.72),
            (RightKnee, 0.70, 0.72),
            (LeftAnkle, 0.52, 0.70),
            (RightAnkle, 0.48, 0.70),
        ]),
    }
}
