//! Keyboard-free practice partner: noisy canonical poses
//!
//! Each frame starts from the canonical skeleton of the level the user is
//! on, then adds:
//! - small per-point jitter, like a real estimator
//! - occasional balance wobbles that push the limbs off target for a few frames
//! - rare dropouts where nobody is detected
//!
//! Seeded, so a session replays identically for the same seed.

use crate::error::EstimatorError;
use crate::estimator::LandmarkEstimator;
use crate::pose::landmarks::{Landmark, LandmarkId, LandmarkSet};
use crate::pose::reference::Level;
use crate::pose::synth::canonical_pose;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Points that drift during a wobble
const LIMBS: [LandmarkId; 8] = [
    LandmarkId::LeftElbow,
    LandmarkId::RightElbow,
    LandmarkId::LeftWrist,
    LandmarkId::RightWrist,
    LandmarkId::LeftKnee,
    LandmarkId::RightKnee,
    LandmarkId::LeftAnkle,
    LandmarkId::RightAnkle,
];

/// Noise parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationNoise {
    /// Max per-point offset, normalized units
    pub jitter: f32,
    /// Chance per frame that a wobble starts
    pub wobble_chance: f64,
    /// Limb offset while wobbling
    pub wobble_amplitude: f32,
    pub wobble_frames: u32,
    /// Chance per frame of no detection
    pub dropout_chance: f64,
}

impl Default for SimulationNoise {
    fn default() -> Self {
        SimulationNoise {
            jitter: 0.003,
            wobble_chance: 0.02,
            wobble_amplitude: 0.06,
            wobble_frames: 8,
            dropout_chance: 0.01,
        }
    }
}

impl SimulationNoise {
    /// No noise at all: every frame is the canonical pose
    #[cfg(test)]
    pub fn none() -> Self {
        SimulationNoise {
            jitter: 0.0,
            wobble_chance: 0.0,
            wobble_amplitude: 0.0,
            wobble_frames: 0,
            dropout_chance: 0.0,
        }
    }
}

pub struct SimulatedEstimator {
    rng: StdRng,
    noise: SimulationNoise,
    wobble_left: u32,
    /// Direction of the current wobble
    wobble_dir: (f32, f32),
}

impl SimulatedEstimator {
    pub fn new(seed: u64, noise: SimulationNoise) -> Self {
        SimulatedEstimator {
            rng: StdRng::seed_from_u64(seed),
            noise,
            wobble_left: 0,
            wobble_dir: (0.0, 0.0),
        }
    }

    #[cfg(test)]
    pub fn is_wobbling(&self) -> bool {
        self.wobble_left > 0
    }

    fn offset(&mut self, amount: f32) -> f32 {
        if amount > 0.0 {
            self.rng.gen_range(-amount..=amount)
        } else {
            0.0
        }
    }

    fn perturb(&mut self, pose: LandmarkSet) -> LandmarkSet {
        if self.wobble_left == 0 && self.rng.gen_bool(self.noise.wobble_chance) {
            self.wobble_left = self.noise.wobble_frames;
            let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
            self.wobble_dir = (angle.cos(), angle.sin());
        }
        let wobble = if self.wobble_left > 0 {
            self.wobble_left -= 1;
            self.noise.wobble_amplitude
        } else {
            0.0
        };

        let jitter = self.noise.jitter;
        let mut points: Vec<Landmark> = pose.points().to_vec();
        for point in points.iter_mut().filter(|p| p.visibility > 0.0) {
            point.x += self.offset(jitter);
            point.y += self.offset(jitter);
        }
        if wobble > 0.0 {
            for id in LIMBS {
                let point = &mut points[id.index()];
                point.x += self.wobble_dir.0 * wobble;
                point.y += self.wobble_dir.1 * wobble;
            }
        }

        // Same length as the canonical set, so this cannot fail.
        LandmarkSet::new(points).unwrap_or(pose)
    }
}

impl LandmarkEstimator for SimulatedEstimator {
    /// The level the user is currently attempting
    type Frame = Level;

    fn estimate(&mut self, level: &Level) -> Result<Option<LandmarkSet>, EstimatorError> {
        if self.rng.gen_bool(self.noise.dropout_chance) {
            return Ok(None);
        }
        let pose = canonical_pose(*level);
        Ok(Some(self.perturb(pose)))
    }
}
