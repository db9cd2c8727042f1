//! Geometric pose criteria.
//!
//! Thresholds live in the variant data so pose tables can be tuned or loaded
//! from configuration without touching the evaluation code.

use serde::{Deserialize, Serialize};

use crate::skeleton::Skeleton;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Criterion {
    /// Both knee angles above `min_angle`
    KneesStraight { min_angle: f64 },
    /// Shoulders and hips level within the given y differences
    LevelTorso {
        max_shoulder_tilt: f64,
        max_hip_tilt: f64,
    },
    /// Both knee angles strictly inside (`min_angle`, `max_angle`)
    KneesBent { min_angle: f64, max_angle: f64 },
    WristsAboveShoulders,
    /// Both elbow angles above `min_angle`
    ArmsStraight { min_angle: f64 },
    /// One knee above `standing_min_angle` while the other is below `bent_max_angle`
    SingleLegStance {
        standing_min_angle: f64,
        bent_max_angle: f64,
    },
    /// The more bent knee sits at least `min_offset` sideways from its hip
    BentKneeOpen { min_offset: f64 },
    /// Wrists closer than `max_wrist_gap`, or both raised above the shoulders
    HandsJoinedOrRaised { max_wrist_gap: f64 },
}

/// Result of evaluating one criterion
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub passed: bool,
    /// Measured values worth showing next to the hint
    pub detail: Option<String>,
}

impl Check {
    fn from_bool(passed: bool) -> Self {
        Self {
            passed,
            detail: None,
        }
    }
}

impl Criterion {
    pub fn check(&self, skeleton: &Skeleton) -> Check {
        match *self {
            Criterion::KneesStraight { min_angle } => {
                let (left, right) = skeleton.knee_angles();
                Check::from_bool(left > min_angle && right > min_angle)
            }
            Criterion::LevelTorso {
                max_shoulder_tilt,
                max_hip_tilt,
            } => Check::from_bool(
                skeleton.shoulder_tilt() < max_shoulder_tilt && skeleton.hip_tilt() < max_hip_tilt,
            ),
            Criterion::KneesBent {
                min_angle,
                max_angle,
            } => {
                let (left, right) = skeleton.knee_angles();
                let within = |a: f64| a > min_angle && a < max_angle;
                Check {
                    passed: within(left) && within(right),
                    detail: Some(format!("L:{:.0}° R:{:.0}°", left, right)),
                }
            }
            Criterion::WristsAboveShoulders => Check::from_bool(skeleton.wrists_above_shoulders()),
            Criterion::ArmsStraight { min_angle } => {
                let (left, right) = skeleton.elbow_angles();
                Check::from_bool(left > min_angle && right > min_angle)
            }
            Criterion::SingleLegStance {
                standing_min_angle,
                bent_max_angle,
            } => {
                let (left, right) = skeleton.knee_angles();
                let left_standing = left > standing_min_angle && right < bent_max_angle;
                let right_standing = right > standing_min_angle && left < bent_max_angle;
                Check::from_bool(left_standing || right_standing)
            }
            Criterion::BentKneeOpen { min_offset } => {
                let side = skeleton.bent_side();
                let offset = (skeleton.knee(side).x - skeleton.hip(side).x).abs();
                Check::from_bool(offset > min_offset)
            }
            Criterion::HandsJoinedOrRaised { max_wrist_gap } => Check::from_bool(
                skeleton.wrist_gap() < max_wrist_gap || skeleton.wrists_above_shoulders(),
            ),
        }
    }
}

/// A criterion with its score contribution and corrective hint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCriterion {
    pub criterion: Criterion,
    pub weight: u8,
    pub hint: String,
}

impl WeightedCriterion {
    pub fn new(criterion: Criterion, weight: u8, hint: impl Into<String>) -> Self {
        Self {
            criterion,
            weight,
            hint: hint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::fixtures::Builder;
    use crate::skeleton::Side;
    use arogya_core::Keypoint;

    #[test]
    fn test_knees_bent_reports_angles() {
        let sample = Builder::standing()
            .knee_angle(Side::Left, 95.0, 1.0)
            .knee_angle(Side::Right, 130.0, -1.0)
            .build();
        let skeleton = Skeleton::from_sample(&sample).unwrap();

        let check = Criterion::KneesBent {
            min_angle: 70.0,
            max_angle: 120.0,
        }
        .check(&skeleton);
        assert!(!check.passed);
        assert_eq!(check.detail.as_deref(), Some("L:95° R:130°"));
    }

    #[test]
    fn test_single_leg_stance_requires_exactly_one_bent() {
        let stance = Criterion::SingleLegStance {
            standing_min_angle: 150.0,
            bent_max_angle: 120.0,
        };

        let both_straight = Skeleton::from_sample(&Builder::standing().build()).unwrap();
        assert!(!stance.check(&both_straight).passed);

        let one_bent = Builder::standing()
            .knee_angle(Side::Right, 60.0, 1.0)
            .build();
        assert!(stance.check(&Skeleton::from_sample(&one_bent).unwrap()).passed);

        let both_bent = Builder::standing()
            .knee_angle(Side::Left, 60.0, 1.0)
            .knee_angle(Side::Right, 60.0, -1.0)
            .build();
        assert!(!stance.check(&Skeleton::from_sample(&both_bent).unwrap()).passed);
    }

    #[test]
    fn test_hands_joined_or_raised() {
        let rule = Criterion::HandsJoinedOrRaised {
            max_wrist_gap: 0.08,
        };

        let hanging = Skeleton::from_sample(&Builder::standing().build()).unwrap();
        assert!(!rule.check(&hanging).passed);

        let joined = Builder::standing()
            .set(Keypoint::LeftWrist, 0.52, 0.4)
            .set(Keypoint::RightWrist, 0.48, 0.4)
            .build();
        assert!(rule.check(&Skeleton::from_sample(&joined).unwrap()).passed);

        let raised = Builder::standing()
            .set(Keypoint::LeftWrist, 0.7, 0.1)
            .set(Keypoint::RightWrist, 0.3, 0.1)
            .build();
        assert!(rule.check(&Skeleton::from_sample(&raised).unwrap()).passed);
    }

    #[test]
    fn test_criterion_config_format() {
        let json = r#"{ "rule": "knees_bent", "min_angle": 60.0, "max_angle": 110.0 }"#;
        let criterion: Criterion = serde_json::from_str(json).unwrap();
        assert_eq!(
            criterion,
            Criterion::KneesBent {
                min_angle: 60.0,
                max_angle: 110.0
            }
        );

        let unit: Criterion = serde_json::from_str(r#"{ "rule": "wrists_above_shoulders" }"#).unwrap();
        assert_eq!(unit, Criterion::WristsAboveShoulders);
    }
}
