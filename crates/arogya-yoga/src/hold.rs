//! Hold timing for a selected target pose.

use arogya_core::{LandmarkSample, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::classifier::PoseClassifier;
use crate::poses::{PoseDefinition, PoseKind, PoseResult};
use crate::skeleton::POSE_KEYPOINTS;

const NO_POSE_FEEDBACK: &str = "Select a pose and get into position.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YogaConfig {
    /// Frames with any pose keypoint below this visibility are skipped
    pub min_visibility: f64,
    pub poses: Vec<PoseDefinition>,
}

impl Default for YogaConfig {
    fn default() -> Self {
        Self {
            min_visibility: 0.5,
            poses: PoseDefinition::builtin_all(),
        }
    }
}

/// One pose-mode update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseEvent {
    pub target_pose: Option<PoseKind>,
    /// The target pose when the latest frame matched it
    pub matched_pose: Option<PoseKind>,
    pub accuracy_score: u8,
    pub feedback: String,
    pub hold_secs: u32,
    pub best_hold_secs: f64,
}

/// Tracks how long the subject holds the selected pose
#[derive(Debug, Clone)]
pub struct PoseTracker {
    config: YogaConfig,
    classifier: PoseClassifier,
    target: Option<PoseKind>,
    last_result: Option<PoseResult>,
    hold_start: Option<Timestamp>,
    hold_secs: u32,
    best_hold_secs: f64,
}

impl PoseTracker {
    pub fn new(config: YogaConfig) -> Result<Self> {
        let classifier = PoseClassifier::new(config.poses.clone())?;
        Ok(Self {
            config,
            classifier,
            target: None,
            last_result: None,
            hold_start: None,
            hold_secs: 0,
            best_hold_secs: 0.0,
        })
    }

    /// Switch target pose; any running hold is discarded
    pub fn select_pose(&mut self, target: Option<PoseKind>) {
        if self.target != target {
            tracing::debug!(pose = ?target, "target pose selected");
            self.target = target;
            self.last_result = None;
            self.hold_start = None;
            self.hold_secs = 0;
        }
    }

    /// Classify one frame against the target pose.
    ///
    /// `Ok(None)` when no target is selected or the frame is not visible enough.
    pub fn process_frame(
        &mut self,
        sample: &LandmarkSample,
        now: Timestamp,
    ) -> Result<Option<PoseEvent>> {
        let Some(target) = self.target else {
            return Ok(None);
        };
        if !sample.all_visible(&POSE_KEYPOINTS, self.config.min_visibility) {
            return Ok(None);
        }

        let result = self.classifier.classify(target, sample)?;

        if result.is_match {
            self.hold_start.get_or_insert(now);
        } else if let Some(start) = self.hold_start.take() {
            let held = now.secs_since(start);
            self.best_hold_secs = self.best_hold_secs.max(held);
            self.hold_secs = 0;
        }

        self.last_result = Some(result);
        Ok(Some(self.snapshot()))
    }

    /// Periodic refresh of the running hold time
    pub fn hold_tick(&mut self, now: Timestamp) -> u32 {
        if let Some(start) = self.hold_start {
            self.hold_secs = now.secs_since(start).floor() as u32;
        }
        self.hold_secs
    }

    pub fn snapshot(&self) -> PoseEvent {
        let (matched_pose, accuracy_score, feedback) = match &self.last_result {
            Some(result) => (
                result.is_match.then_some(result.pose),
                result.score.min(100),
                result.feedback_text(),
            ),
            None => (None, 0, NO_POSE_FEEDBACK.to_string()),
        };

        PoseEvent {
            target_pose: self.target,
            matched_pose,
            accuracy_score,
            feedback,
            hold_secs: self.hold_secs,
            best_hold_secs: self.best_hold_secs,
        }
    }

    pub fn target(&self) -> Option<PoseKind> {
        self.target
    }

    pub fn is_holding(&self) -> bool {
        self.hold_start.is_some()
    }

    pub fn best_hold_secs(&self) -> f64 {
        self.best_hold_secs
    }

    pub fn classifier(&self) -> &PoseClassifier {
        &self.classifier
    }
}

impl Default for PoseTracker {
    fn default() -> Self {
        Self {
            config: YogaConfig::default(),
            classifier: PoseClassifier::default(),
            target: None,
            last_result: None,
            hold_start: None,
            hold_secs: 0,
            best_hold_secs: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::fixtures::Builder;
    use crate::skeleton::Side;
    use arogya_core::{Keypoint, Landmark};

    fn ms(millis: i64) -> Timestamp {
        Timestamp::from_millis(millis)
    }

    #[test]
    fn test_no_target_no_event() {
        let mut tracker = PoseTracker::default();
        let event = tracker
            .process_frame(&Builder::standing().build(), ms(0))
            .unwrap();
        assert!(event.is_none());
        assert_eq!(tracker.snapshot().feedback, NO_POSE_FEEDBACK);
    }

    #[test]
    fn test_hold_and_best_hold() {
        let mut tracker = PoseTracker::default();
        tracker.select_pose(Some(PoseKind::BalancedStance));

        let stance = Builder::standing().build();
        let broken = Builder::standing()
            .knee_angle(Side::Left, 110.0, 1.0)
            .build();

        let event = tracker.process_frame(&stance, ms(1_000)).unwrap().unwrap();
        assert_eq!(event.matched_pose, Some(PoseKind::BalancedStance));
        assert_eq!(event.accuracy_score, 100);
        assert!(tracker.is_holding());

        tracker.process_frame(&stance, ms(2_000)).unwrap();
        assert_eq!(tracker.hold_tick(ms(3_600)), 2);

        let event = tracker.process_frame(&broken, ms(4_500)).unwrap().unwrap();
        assert_eq!(event.matched_pose, None);
        assert_eq!(event.hold_secs, 0);
        assert!((event.best_hold_secs - 3.5).abs() < 1e-9);
        assert_eq!(event.feedback, "Straighten both legs");

        // a shorter second hold keeps the best
        tracker.process_frame(&stance, ms(5_000)).unwrap();
        let event = tracker.process_frame(&broken, ms(6_000)).unwrap().unwrap();
        assert!((event.best_hold_secs - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_low_visibility_skipped() {
        let mut tracker = PoseTracker::default();
        tracker.select_pose(Some(PoseKind::BalancedStance));

        let mut sample = Builder::standing().build();
        sample.set(Keypoint::LeftAnkle, Landmark::new(0.55, 0.9, 0.3));
        assert!(tracker.process_frame(&sample, ms(0)).unwrap().is_none());
        assert!(!tracker.is_holding());
    }

    #[test]
    fn test_switching_pose_resets_hold() {
        let mut tracker = PoseTracker::default();
        tracker.select_pose(Some(PoseKind::BalancedStance));
        tracker
            .process_frame(&Builder::standing().build(), ms(0))
            .unwrap();
        assert!(tracker.is_holding());

        tracker.select_pose(Some(PoseKind::SeatedBend));
        assert!(!tracker.is_holding());
        assert_eq!(tracker.snapshot().target_pose, Some(PoseKind::SeatedBend));
        assert_eq!(tracker.hold_tick(ms(10_000)), 0);
    }
}
