//! Fundamental types for the Arogya engine.

use chrono::{DateTime, Utc};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session identifier, regenerated for every monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Monotonic timestamp with nanosecond precision.
///
/// The origin is whatever the producing [`Clock`](crate::Clock) chose; only
/// differences between timestamps are meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_millis(&self) -> i64 {
        self.0 / 1_000_000
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    pub fn add_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis.saturating_mul(1_000_000)))
    }

    /// Milliseconds elapsed since `earlier`; negative if `earlier` is in the future
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0) / 1_000_000
    }

    /// Seconds elapsed since `earlier`, clamped at zero
    pub fn secs_since(&self, earlier: Timestamp) -> f64 {
        ((self.0 - earlier.0) as f64 / 1e9).max(0.0)
    }
}

/// Wall-clock instant used only for session bookkeeping
pub fn wall_clock_now() -> DateTime<Utc> {
    Utc::now()
}

/// Body keypoints consumed by the engine.
///
/// Discriminants follow the 33-point BlazePose numbering used by common
/// landmark extractors; indices not listed here are ignored on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Keypoint {
    Nose = 0,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
}

impl Keypoint {
    pub const COUNT: usize = 13;

    pub const ALL: [Keypoint; Keypoint::COUNT] = [
        Keypoint::Nose,
        Keypoint::LeftShoulder,
        Keypoint::RightShoulder,
        Keypoint::LeftElbow,
        Keypoint::RightElbow,
        Keypoint::LeftWrist,
        Keypoint::RightWrist,
        Keypoint::LeftHip,
        Keypoint::RightHip,
        Keypoint::LeftKnee,
        Keypoint::RightKnee,
        Keypoint::LeftAnkle,
        Keypoint::RightAnkle,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::Nose),
            11 => Some(Self::LeftShoulder),
            12 => Some(Self::RightShoulder),
            13 => Some(Self::LeftElbow),
            14 => Some(Self::RightElbow),
            15 => Some(Self::LeftWrist),
            16 => Some(Self::RightWrist),
            23 => Some(Self::LeftHip),
            24 => Some(Self::RightHip),
            25 => Some(Self::LeftKnee),
            26 => Some(Self::RightKnee),
            27 => Some(Self::LeftAnkle),
            28 => Some(Self::RightAnkle),
            _ => None,
        }
    }

    /// Extractor index of this keypoint
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Dense slot used for storage inside [`LandmarkSample`]
    fn slot(&self) -> usize {
        match self {
            Keypoint::Nose => 0,
            Keypoint::LeftShoulder => 1,
            Keypoint::RightShoulder => 2,
            Keypoint::LeftElbow => 3,
            Keypoint::RightElbow => 4,
            Keypoint::LeftWrist => 5,
            Keypoint::RightWrist => 6,
            Keypoint::LeftHip => 7,
            Keypoint::RightHip => 8,
            Keypoint::LeftKnee => 9,
            Keypoint::RightKnee => 10,
            Keypoint::LeftAnkle => 11,
            Keypoint::RightAnkle => 12,
        }
    }
}

/// A single normalized landmark: position in [0,1] relative to the frame,
/// plus the detector's visibility confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    /// Fully visible landmark at `(x, y)`
    pub fn visible(x: f64, y: f64) -> Self {
        Self::new(x, y, 1.0)
    }

    pub fn is_visible(&self, min_visibility: f64) -> bool {
        self.visibility >= min_visibility
    }

    pub fn to_point2(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// One camera frame worth of landmarks. Read-only to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSample {
    landmarks: [Option<Landmark>; Keypoint::COUNT],
}

impl LandmarkSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sample from `(extractor index, landmark)` pairs, dropping
    /// indices the engine does not track.
    pub fn from_indexed<I>(landmarks: I) -> Self
    where
        I: IntoIterator<Item = (u8, Landmark)>,
    {
        let mut sample = Self::new();
        for (idx, landmark) in landmarks {
            if let Some(keypoint) = Keypoint::from_index(idx) {
                sample.set(keypoint, landmark);
            }
        }
        sample
    }

    /// Build a sample from a dense extractor output (index = position in slice)
    pub fn from_dense(landmarks: &[Landmark]) -> Self {
        Self::from_indexed(
            landmarks
                .iter()
                .enumerate()
                .filter_map(|(i, lm)| u8::try_from(i).ok().map(|i| (i, *lm))),
        )
    }

    pub fn with(mut self, keypoint: Keypoint, landmark: Landmark) -> Self {
        self.set(keypoint, landmark);
        self
    }

    pub fn set(&mut self, keypoint: Keypoint, landmark: Landmark) {
        self.landmarks[keypoint.slot()] = Some(landmark);
    }

    pub fn get(&self, keypoint: Keypoint) -> Option<&Landmark> {
        self.landmarks[keypoint.slot()].as_ref()
    }

    /// The landmark, if present and at least `min_visibility` confident
    pub fn visible(&self, keypoint: Keypoint, min_visibility: f64) -> Option<&Landmark> {
        self.get(keypoint).filter(|lm| lm.is_visible(min_visibility))
    }

    /// True when every keypoint in `keypoints` is present and visible enough
    pub fn all_visible(&self, keypoints: &[Keypoint], min_visibility: f64) -> bool {
        keypoints
            .iter()
            .all(|kp| self.visible(*kp, min_visibility).is_some())
    }

    pub fn len(&self) -> usize {
        self.landmarks.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
