//! Majority-vote stability classification.
//!
//! A single occluded or jittery frame must not flip the posture verdict. Raw
//! per-frame slouch flags are pushed into a bounded window and a verdict is
//! only issued once the window is sufficiently filled.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::calibration::Baseline;
use crate::config::StabilityConfig;
use crate::smoother::SmoothedFeatures;

/// Stable posture verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Good,
    Slouch,
}

/// Effective deviation limits derived from a baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub offset: f64,
    pub v_ratio: f64,
}

#[derive(Debug, Clone)]
pub struct StabilityClassifier {
    config: StabilityConfig,
    window: VecDeque<bool>,
}

impl StabilityClassifier {
    pub fn new(config: StabilityConfig) -> Self {
        let capacity = config.window_capacity;
        Self {
            config,
            window: VecDeque::with_capacity(capacity),
        }
    }

    /// Tolerances scale with baseline spread but never drop below the floors,
    /// so a near-zero variance baseline does not produce a hair trigger.
    pub fn tolerances(&self, baseline: &Baseline) -> Tolerances {
        Tolerances {
            offset: (baseline.offset_std * self.config.std_multiplier)
                .max(self.config.offset_tolerance_floor),
            v_ratio: (baseline.v_ratio_std * self.config.std_multiplier)
                .max(self.config.v_ratio_tolerance_floor),
        }
    }

    /// Per-frame slouch flag: head drifted sideways past the offset tolerance,
    /// or dropped towards the shoulders past the vertical tolerance.
    pub fn is_raw_slouch(&self, baseline: &Baseline, features: &SmoothedFeatures) -> bool {
        let tol = self.tolerances(baseline);
        let d_offset = features.offset - baseline.offset_mean;
        let d_v_ratio = features.v_ratio - baseline.v_ratio_mean;
        d_offset > tol.offset || d_v_ratio < -tol.v_ratio
    }

    /// Push a raw flag and return the stable verdict, if one can be made yet
    pub fn push(&mut self, raw_slouch: bool) -> Option<Verdict> {
        self.window.push_back(raw_slouch);
        while self.window.len() > self.config.window_capacity {
            self.window.pop_front();
        }
        self.verdict()
    }

    /// Classify one smoothed frame against the baseline
    pub fn classify(&mut self, baseline: &Baseline, features: &SmoothedFeatures) -> Option<Verdict> {
        let raw = self.is_raw_slouch(baseline, features);
        self.push(raw)
    }

    pub fn verdict(&self) -> Option<Verdict> {
        if self.window.is_empty() || self.window.len() < self.config.min_samples {
            return None;
        }
        if self.slouch_ratio() > self.config.slouch_ratio {
            Some(Verdict::Slouch)
        } else {
            Some(Verdict::Good)
        }
    }

    /// Fraction of slouching frames currently in the window
    pub fn slouch_ratio(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let slouching = self.window.iter().filter(|&&s| s).count();
        slouching as f64 / self.window.len() as f64
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

impl Default for StabilityClassifier {
    fn default() -> Self {
        Self::new(StabilityConfig::default())
    }
}
