//! Body landmarks as delivered by a pose estimator
//!
//! A `LandmarkSet` is the fixed 33-point BlazePose layout in normalized
//! image coordinates (x right, y down) with a per-point visibility in [0, 1].
//! Sets are built once per frame and never mutated afterwards.

use crate::error::{PoseError, PoseResult};
use serde::{Deserialize, Serialize};

/// Number of points in a landmark set
pub const LANDMARK_COUNT: usize = 33;

/// Named body points, in estimator output order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkId {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl LandmarkId {
    pub const ALL: [LandmarkId; LANDMARK_COUNT] = [
        LandmarkId::Nose,
        LandmarkId::LeftEyeInner,
        LandmarkId::LeftEye,
        LandmarkId::LeftEyeOuter,
        LandmarkId::RightEyeInner,
        LandmarkId::RightEye,
        LandmarkId::RightEyeOuter,
        LandmarkId::LeftEar,
        LandmarkId::RightEar,
        LandmarkId::MouthLeft,
        LandmarkId::MouthRight,
        LandmarkId::LeftShoulder,
        LandmarkId::RightShoulder,
        LandmarkId::LeftElbow,
        LandmarkId::RightElbow,
        LandmarkId::LeftWrist,
        LandmarkId::RightWrist,
        LandmarkId::LeftPinky,
        LandmarkId::RightPinky,
        LandmarkId::LeftIndex,
        LandmarkId::RightIndex,
        LandmarkId::LeftThumb,
        LandmarkId::RightThumb,
        LandmarkId::LeftHip,
        LandmarkId::RightHip,
        LandmarkId::LeftKnee,
        LandmarkId::RightKnee,
        LandmarkId::LeftAnkle,
        LandmarkId::RightAnkle,
        LandmarkId::LeftHeel,
        LandmarkId::RightHeel,
        LandmarkId::LeftFootIndex,
        LandmarkId::RightFootIndex,
    ];

    /// Position in the estimator's output array
    pub fn index(self) -> usize {
        self as usize
    }

    /// The same body point on the opposite side; centre points map to themselves
    pub fn mirrored(self) -> LandmarkId {
        use LandmarkId::*;
        match self {
            Nose => Nose,
            LeftEyeInner => RightEyeInner,
            LeftEye => RightEye,
            LeftEyeOuter => RightEyeOuter,
            RightEyeInner => LeftEyeInner,
            RightEye => LeftEye,
            RightEyeOuter => LeftEyeOuter,
            LeftEar => RightEar,
            RightEar => LeftEar,
            MouthLeft => MouthRight,
            MouthRight => MouthLeft,
            LeftShoulder => RightShoulder,
            RightShoulder => LeftShoulder,
            LeftElbow => RightElbow,
            RightElbow => LeftElbow,
            LeftWrist => RightWrist,
            RightWrist => LeftWrist,
            LeftPinky => RightPinky,
            RightPinky => LeftPinky,
            LeftIndex => RightIndex,
            RightIndex => LeftIndex,
            LeftThumb => RightThumb,
            RightThumb => LeftThumb,
            LeftHip => RightHip,
            RightHip => LeftHip,
            LeftKnee => RightKnee,
            RightKnee => LeftKnee,
            LeftAnkle => RightAnkle,
            RightAnkle => LeftAnkle,
            LeftHeel => RightHeel,
            RightHeel => LeftHeel,
            LeftFootIndex => RightFootIndex,
            RightFootIndex => LeftFootIndex,
        }
    }
}

/// A single estimated keypoint
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Landmark {
            x,
            y,
            z: 0.0,
            visibility,
        }
    }

    /// A point the estimator could not place
    pub fn hidden() -> Self {
        Landmark::new(0.0, 0.0, 0.0)
    }
}

/// 2D point after aspect correction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }
}

/// Interior angle at `vertex` between the segments to `a` and `c`, in degrees.
/// Degenerate (zero-length) segments yield 0.
pub fn joint_angle(a: Point, vertex: Point, c: Point) -> f32 {
    let (ux, uy) = (a.x - vertex.x, a.y - vertex.y);
    let (vx, vy) = (c.x - vertex.x, c.y - vertex.y);
    let lu = (ux * ux + uy * uy).sqrt();
    let lv = (vx * vx + vy * vy).sqrt();
    if lu < f32::EPSILON || lv < f32::EPSILON {
        return 0.0;
    }
    let cos = ((ux * vx + uy * vy) / (lu * lv)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Angle between the segment `lower → upper` and straight up, in degrees (0..=180)
pub fn inclination(lower: Point, upper: Point) -> f32 {
    let dx = upper.x - lower.x;
    // Screen y grows downward, so "up" is negative y.
    let up = lower.y - upper.y;
    if dx.abs() < f32::EPSILON && up.abs() < f32::EPSILON {
        return 0.0;
    }
    dx.abs().atan2(up).to_degrees()
}

/// Fixed-length set of landmarks for one frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> PoseResult<Self> {
        if points.len() != LANDMARK_COUNT {
            return Err(PoseError::MalformedLandmarks {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(LandmarkSet { points })
    }

    /// Every point hidden; handy as a starting skeleton
    pub fn hidden() -> Self {
        LandmarkSet {
            points: vec![Landmark::hidden(); LANDMARK_COUNT],
        }
    }

    pub fn get(&self, id: LandmarkId) -> &Landmark {
        &self.points[id.index()]
    }

    /// Builder-style replacement of one point
    pub fn with(mut self, id: LandmarkId, landmark: Landmark) -> Self {
        self.points[id.index()] = landmark;
        self
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Aspect-corrected position of `id` if its visibility reaches `min_visibility`
    pub fn visible_point(&self, id: LandmarkId, min_visibility: f32, aspect_ratio: f32) -> Option<Point> {
        let lm = self.get(id);
        if lm.visibility < min_visibility || !lm.x.is_finite() || !lm.y.is_finite() {
            return None;
        }
        Some(Point {
            x: lm.x * aspect_ratio,
            y: lm.y,
        })
    }

    /// True when no point reaches the visibility threshold
    pub fn is_empty(&self, min_visibility: f32) -> bool {
        self.points.iter().all(|p| p.visibility < min_visibility)
    }
}

impl TryFrom<Vec<Landmark>> for LandmarkSet {
    type Error = PoseError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        LandmarkSet::new(points)
    }
}

impl From<LandmarkSet> for Vec<Landmark> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}
