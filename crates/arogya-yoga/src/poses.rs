//! Target pose definitions.

use std::fmt;
use std::str::FromStr;

use arogya_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::criteria::{Criterion, WeightedCriterion};
use crate::skeleton::Skeleton;

/// The closed set of supported target poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoseKind {
    /// Mountain pose: tall, level stance on straight legs
    BalancedStance,
    /// Chair pose: knees bent, arms straight overhead
    SeatedBend,
    /// Tree pose: one straight standing leg, the other knee opened sideways
    SingleLegBalance,
}

impl PoseKind {
    pub const ALL: [PoseKind; 3] = [
        PoseKind::BalancedStance,
        PoseKind::SeatedBend,
        PoseKind::SingleLegBalance,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PoseKind::BalancedStance => "balanced-stance",
            PoseKind::SeatedBend => "seated-bend",
            PoseKind::SingleLegBalance => "single-leg-balance",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PoseKind::BalancedStance => "Mountain",
            PoseKind::SeatedBend => "Chair",
            PoseKind::SingleLegBalance => "Tree",
        }
    }
}

impl fmt::Display for PoseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PoseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PoseKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| Error::UnknownPose(s.to_string()))
    }
}

/// Weighted criteria table for one pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseDefinition {
    pub kind: PoseKind,
    pub criteria: Vec<WeightedCriterion>,
    /// Minimum accuracy score for a match
    pub match_threshold: u8,
}

impl PoseDefinition {
    /// Built-in table for `kind`
    pub fn builtin(kind: PoseKind) -> Self {
        match kind {
            PoseKind::BalancedStance => Self {
                kind,
                criteria: vec![
                    WeightedCriterion::new(
                        Criterion::KneesStraight { min_angle: 160.0 },
                        50,
                        "Straighten both legs",
                    ),
                    WeightedCriterion::new(
                        Criterion::LevelTorso {
                            max_shoulder_tilt: 0.04,
                            max_hip_tilt: 0.04,
                        },
                        50,
                        "Level your shoulders and hips",
                    ),
                ],
                match_threshold: 80,
            },
            PoseKind::SeatedBend => Self {
                kind,
                criteria: vec![
                    WeightedCriterion::new(
                        Criterion::KneesBent {
                            min_angle: 70.0,
                            max_angle: 120.0,
                        },
                        40,
                        "Bend knees to ~90°",
                    ),
                    WeightedCriterion::new(
                        Criterion::WristsAboveShoulders,
                        30,
                        "Raise arms above shoulders",
                    ),
                    WeightedCriterion::new(
                        Criterion::ArmsStraight { min_angle: 150.0 },
                        30,
                        "Straighten arms overhead",
                    ),
                ],
                match_threshold: 70,
            },
            PoseKind::SingleLegBalance => Self {
                kind,
                criteria: vec![
                    WeightedCriterion::new(
                        Criterion::SingleLegStance {
                            standing_min_angle: 150.0,
                            bent_max_angle: 120.0,
                        },
                        40,
                        "Lift one foot and bend the knee to the side",
                    ),
                    WeightedCriterion::new(
                        Criterion::BentKneeOpen { min_offset: 0.05 },
                        30,
                        "Open the bent knee outward",
                    ),
                    WeightedCriterion::new(
                        Criterion::HandsJoinedOrRaised {
                            max_wrist_gap: 0.08,
                        },
                        30,
                        "Bring hands to heart or raise overhead",
                    ),
                ],
                match_threshold: 70,
            },
        }
    }

    pub fn builtin_all() -> Vec<Self> {
        PoseKind::ALL.into_iter().map(Self::builtin).collect()
    }

    pub fn total_weight(&self) -> u32 {
        self.criteria.iter().map(|c| c.weight as u32).sum()
    }

    /// Weights must add up to at most 100 and the threshold must be reachable
    pub fn validate(&self) -> Result<()> {
        let total = self.total_weight();
        if total > 100 {
            return Err(Error::Config(format!(
                "{}: criterion weights sum to {}, above 100",
                self.kind, total
            )));
        }
        if u32::from(self.match_threshold) > total {
            return Err(Error::Config(format!(
                "{}: match threshold {} is unreachable with total weight {}",
                self.kind, self.match_threshold, total
            )));
        }
        Ok(())
    }

    pub fn success_message(&self) -> String {
        format!("Perfect {} Pose!", self.kind.display_name())
    }

    /// Score a skeleton against this definition
    pub fn evaluate(&self, skeleton: &Skeleton) -> PoseResult {
        let mut score: u32 = 0;
        let mut feedback = Vec::new();

        for weighted in &self.criteria {
            let check = weighted.criterion.check(skeleton);
            if check.passed {
                score += weighted.weight as u32;
            } else {
                match check.detail {
                    Some(detail) => feedback.push(format!("{} ({})", weighted.hint, detail)),
                    None => feedback.push(weighted.hint.clone()),
                }
            }
        }

        let score = score.min(100) as u8;
        if feedback.is_empty() {
            feedback.push(self.success_message());
        }

        PoseResult {
            pose: self.kind,
            is_match: score >= self.match_threshold,
            score,
            feedback,
        }
    }
}

/// Outcome of matching one frame against one pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseResult {
    pub pose: PoseKind,
    pub is_match: bool,
    /// Accuracy in [0, 100]
    pub score: u8,
    /// Failed-criterion hints in definition order, or the success message
    pub feedback: Vec<String>,
}

impl PoseResult {
    pub fn feedback_text(&self) -> String {
        self.feedback.join(" · ")
    }
}
