//! Exponential smoothing of head-over-shoulders features.
//!
//! ## Features
//!
//! Both features are divided by shoulder width so they do not depend on the
//! subject's distance from the camera:
//!
//! - offset  = (nose.x - midShoulder.x) / shoulderWidth
//! - vRatio  = (midShoulder.y - nose.y) / shoulderWidth
//!
//! A forward head drifts the offset and collapses the vertical ratio.

use arogya_core::{geometry::midpoint, Keypoint, LandmarkSample};
use serde::{Deserialize, Serialize};

use crate::config::SmootherConfig;

/// Per-frame features before smoothing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFeatures {
    pub offset: f64,
    pub v_ratio: f64,
}

impl RawFeatures {
    /// True when both features moved less than `delta` since `previous`
    pub fn is_close_to(&self, previous: &RawFeatures, delta: f64) -> bool {
        (self.offset - previous.offset).abs() < delta
            && (self.v_ratio - previous.v_ratio).abs() < delta
    }
}

/// EMA-smoothed features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedFeatures {
    pub offset: f64,
    pub v_ratio: f64,
}

/// EMA smoother over [`RawFeatures`]
#[derive(Debug, Clone)]
pub struct SignalSmoother {
    config: SmootherConfig,
    state: Option<SmoothedFeatures>,
}

impl SignalSmoother {
    pub fn new(config: SmootherConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Compute raw features, or `None` if the nose or either shoulder is not
    /// visible enough to trust.
    pub fn extract(&self, sample: &LandmarkSample) -> Option<RawFeatures> {
        let min = self.config.min_visibility;
        let nose = sample.visible(Keypoint::Nose, min)?;
        let left = sample.visible(Keypoint::LeftShoulder, min)?;
        let right = sample.visible(Keypoint::RightShoulder, min)?;

        let shoulders = midpoint(left, right);
        let width = (left.x - right.x).abs() + self.config.width_epsilon;

        Some(RawFeatures {
            offset: (nose.x - shoulders.x) / width,
            v_ratio: (shoulders.y - nose.y) / width,
        })
    }

    /// Fold a raw observation into the running average
    pub fn update(&mut self, raw: RawFeatures) -> SmoothedFeatures {
        let alpha = self.config.alpha;
        let next = match self.state {
            None => SmoothedFeatures {
                offset: raw.offset,
                v_ratio: raw.v_ratio,
            },
            Some(prev) => SmoothedFeatures {
                offset: prev.offset * (1.0 - alpha) + raw.offset * alpha,
                v_ratio: prev.v_ratio * (1.0 - alpha) + raw.v_ratio * alpha,
            },
        };
        self.state = Some(next);
        next
    }

    pub fn current(&self) -> Option<SmoothedFeatures> {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = None;
    }

    pub fn config(&self) -> &SmootherConfig {
        &self.config
    }
}

impl Default for SignalSmoother {
    fn default() -> Self {
        Self::new(SmootherConfig::default())
    }
}
