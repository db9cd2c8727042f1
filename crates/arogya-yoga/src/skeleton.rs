//! Joint-angle view over a landmark sample.

use arogya_core::{angle_between, distance, Error, Keypoint, Landmark, LandmarkSample, Result};

/// Every keypoint the pose rules read
pub const POSE_KEYPOINTS: [Keypoint; 12] = [
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Limbs and torso points of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Skeleton {
    pub left_shoulder: Landmark,
    pub right_shoulder: Landmark,
    pub left_elbow: Landmark,
    pub right_elbow: Landmark,
    pub left_wrist: Landmark,
    pub right_wrist: Landmark,
    pub left_hip: Landmark,
    pub right_hip: Landmark,
    pub left_knee: Landmark,
    pub right_knee: Landmark,
    pub left_ankle: Landmark,
    pub right_ankle: Landmark,
}

impl Skeleton {
    pub fn from_sample(sample: &LandmarkSample) -> Result<Self> {
        let get = |keypoint: Keypoint| -> Result<Landmark> {
            sample
                .get(keypoint)
                .copied()
                .ok_or(Error::MissingLandmark { keypoint })
        };

        Ok(Self {
            left_shoulder: get(Keypoint::LeftShoulder)?,
            right_shoulder: get(Keypoint::RightShoulder)?,
            left_elbow: get(Keypoint::LeftElbow)?,
            right_elbow: get(Keypoint::RightElbow)?,
            left_wrist: get(Keypoint::LeftWrist)?,
            right_wrist: get(Keypoint::RightWrist)?,
            left_hip: get(Keypoint::LeftHip)?,
            right_hip: get(Keypoint::RightHip)?,
            left_knee: get(Keypoint::LeftKnee)?,
            right_knee: get(Keypoint::RightKnee)?,
            left_ankle: get(Keypoint::LeftAnkle)?,
            right_ankle: get(Keypoint::RightAnkle)?,
        })
    }

    /// Hip-knee-ankle angles, (left, right)
    pub fn knee_angles(&self) -> (f64, f64) {
        (
            angle_between(&self.left_hip, &self.left_knee, &self.left_ankle),
            angle_between(&self.right_hip, &self.right_knee, &self.right_ankle),
        )
    }

    /// Shoulder-elbow-wrist angles, (left, right)
    pub fn elbow_angles(&self) -> (f64, f64) {
        (
            angle_between(&self.left_shoulder, &self.left_elbow, &self.left_wrist),
            angle_between(&self.right_shoulder, &self.right_elbow, &self.right_wrist),
        )
    }

    pub fn shoulder_tilt(&self) -> f64 {
        (self.left_shoulder.y - self.right_shoulder.y).abs()
    }

    pub fn hip_tilt(&self) -> f64 {
        (self.left_hip.y - self.right_hip.y).abs()
    }

    /// Image y grows downwards, so "above" means a smaller y
    pub fn wrists_above_shoulders(&self) -> bool {
        self.left_wrist.y < self.left_shoulder.y && self.right_wrist.y < self.right_shoulder.y
    }

    pub fn wrist_gap(&self) -> f64 {
        distance(&self.left_wrist, &self.right_wrist)
    }

    /// The leg with the smaller knee angle; ties go to the right leg
    pub fn bent_side(&self) -> Side {
        let (left, right) = self.knee_angles();
        if left < right {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub fn knee(&self, side: Side) -> &Landmark {
        match side {
            Side::Left => &self.left_knee,
            Side::Right => &self.right_knee,
        }
    }

    pub fn hip(&self, side: Side) -> &Landmark {
        match side {
            Side::Left => &self.left_hip,
            Side::Right => &self.right_hip,
        }
    }
}
