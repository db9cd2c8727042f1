//! Stateless pose classification against a definition library.

use arogya_core::{Error, LandmarkSample, Result};

use crate::poses::{PoseDefinition, PoseKind, PoseResult};
use crate::skeleton::Skeleton;

/// Immutable library of pose definitions. Shareable across threads.
#[derive(Debug, Clone)]
pub struct PoseClassifier {
    definitions: Vec<PoseDefinition>,
}

impl PoseClassifier {
    /// Build from custom definitions; each pose kind may appear once
    pub fn new(definitions: Vec<PoseDefinition>) -> Result<Self> {
        for (i, def) in definitions.iter().enumerate() {
            def.validate()?;
            if definitions[..i].iter().any(|other| other.kind == def.kind) {
                return Err(Error::Config(format!("pose {} defined twice", def.kind)));
            }
        }
        Ok(Self { definitions })
    }

    pub fn definition(&self, kind: PoseKind) -> Option<&PoseDefinition> {
        self.definitions.iter().find(|d| d.kind == kind)
    }

    pub fn definitions(&self) -> &[PoseDefinition] {
        &self.definitions
    }

    /// Score `sample` against one pose
    pub fn classify(&self, kind: PoseKind, sample: &LandmarkSample) -> Result<PoseResult> {
        let definition = self
            .definition(kind)
            .ok_or_else(|| Error::UnknownPose(kind.id().to_string()))?;
        let skeleton = Skeleton::from_sample(sample)?;
        Ok(definition.evaluate(&skeleton))
    }

    /// Score `sample` against every pose in the library
    pub fn classify_all(&self, sample: &LandmarkSample) -> Result<Vec<PoseResult>> {
        let skeleton = Skeleton::from_sample(sample)?;
        Ok(self
            .definitions
            .iter()
            .map(|def| def.evaluate(&skeleton))
            .collect())
    }

    /// Highest-scoring matching pose, if any pose matches
    pub fn best_match(&self, sample: &LandmarkSample) -> Result<Option<PoseResult>> {
        let results = self.classify_all(sample)?;
        Ok(results
            .into_iter()
            .filter(|r| r.is_match)
            .max_by_key(|r| r.score))
    }
}

impl Default for PoseClassifier {
    fn default() -> Self {
        Self {
            definitions: PoseDefinition::builtin_all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{Criterion, WeightedCriterion};
    use crate::skeleton::fixtures::Builder;
    use crate::skeleton::Side;
    use arogya_core::Keypoint;

    #[test]
    fn test_balanced_stance_perfect() {
        // knees 170° and 172°, shoulder diff 0.01, hip diff 0.02
        let sample = Builder::standing()
            .set(Keypoint::LeftShoulder, 0.58, 0.30)
            .set(Keypoint::RightShoulder, 0.42, 0.31)
            .set(Keypoint::LeftHip, 0.55, 0.55)
            .set(Keypoint::RightHip, 0.45, 0.57)
            .knee_angle(Side::Left, 170.0, 1.0)
            .knee_angle(Side::Right, 172.0, -1.0)
            .build();

        let result = PoseClassifier::default()
            .classify(PoseKind::BalancedStance, &sample)
            .unwrap();
        assert_eq!(result.score, 100);
        assert!(result.is_match);
        assert_eq!(result.feedback, vec!["Perfect Mountain Pose!".to_string()]);
    }

    #[test]
    fn test_balanced_stance_partial() {
        let sample = Builder::standing()
            .knee_angle(Side::Left, 120.0, 1.0)
            .build();

        let result = PoseClassifier::default()
            .classify(PoseKind::BalancedStance, &sample)
            .unwrap();
        assert_eq!(result.score, 50);
        assert!(!result.is_match);
        assert_eq!(result.feedback_text(), "Straighten both legs");
    }

    #[test]
    fn test_seated_bend() {
        let arms_up = Builder::standing()
            .set(Keypoint::LeftElbow, 0.6, 0.18)
            .set(Keypoint::LeftWrist, 0.62, 0.06)
            .set(Keypoint::RightElbow, 0.4, 0.18)
            .set(Keypoint::RightWrist, 0.38, 0.06)
            .knee_angle(Side::Left, 100.0, 1.0)
            .knee_angle(Side::Right, 100.0, -1.0)
            .build();
        let classifier = PoseClassifier::default();

        let result = classifier.classify(PoseKind::SeatedBend, &arms_up).unwrap();
        assert_eq!(result.score, 100);
        assert!(result.is_match);
        assert_eq!(result.feedback_text(), "Perfect Chair Pose!");

        // standing straight with arms down: only hints, in order
        let result = classifier
            .classify(PoseKind::SeatedBend, &Builder::standing().build())
            .unwrap();
        assert_eq!(result.score, 30);
        assert!(!result.is_match);
        assert_eq!(result.feedback.len(), 2);
        assert!(result.feedback[0].starts_with("Bend knees to ~90° (L:180° R:180°)"));
        assert_eq!(result.feedback[1], "Raise arms above shoulders");
    }

    #[test]
    fn test_single_leg_balance() {
        let tree = Builder::standing()
            .set(Keypoint::RightKnee, 0.36, 0.68)
            .knee_angle(Side::Right, 45.0, 1.0)
            .set(Keypoint::LeftWrist, 0.52, 0.4)
            .set(Keypoint::RightWrist, 0.47, 0.4)
            .build();
        let result = PoseClassifier::default()
            .classify(PoseKind::SingleLegBalance, &tree)
            .unwrap();

        assert!(result.is_match);
        assert_eq!(result.score, 100);
        assert_eq!(result.feedback_text(), "Perfect Tree Pose!");
    }

    #[test]
    fn test_deterministic() {
        let sample = Builder::standing()
            .knee_angle(Side::Left, 100.0, 1.0)
            .build();
        let classifier = PoseClassifier::default();

        let first = classifier.classify_all(&sample).unwrap();
        for _ in 0..10 {
            assert_eq!(classifier.classify_all(&sample).unwrap(), first);
        }
    }

    #[test]
    fn test_best_match() {
        let classifier = PoseClassifier::default();
        let best = classifier
            .best_match(&Builder::standing().build())
            .unwrap()
            .unwrap();
        assert_eq!(best.pose, PoseKind::BalancedStance);
    }

    #[test]
    fn test_custom_definitions() {
        let custom = PoseDefinition {
            kind: PoseKind::BalancedStance,
            criteria: vec![WeightedCriterion::new(
                Criterion::KneesStraight { min_angle: 175.0 },
                100,
                "Lock out your knees",
            )],
            match_threshold: 100,
        };
        let classifier = PoseClassifier::new(vec![custom.clone()]).unwrap();

        let soft_knees = Builder::standing()
            .knee_angle(Side::Left, 170.0, 1.0)
            .build();
        let result = classifier
            .classify(PoseKind::BalancedStance, &soft_knees)
            .unwrap();
        assert!(!result.is_match);
        assert_eq!(result.feedback_text(), "Lock out your knees");

        assert!(matches!(
            classifier.classify(PoseKind::SeatedBend, &soft_knees),
            Err(Error::UnknownPose(_))
        ));
        assert!(PoseClassifier::new(vec![custom.clone(), custom]).is_err());
    }

    #[test]
    fn test_missing_landmarks_error() {
        let sample = LandmarkSample::new();
        assert!(matches!(
            PoseClassifier::default().classify(PoseKind::SeatedBend, &sample),
            Err(Error::MissingLandmark { .. })
        ));
    }
}
