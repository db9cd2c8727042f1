//! Tunables for the posture pipeline.

use serde::{Deserialize, Serialize};

/// Complete posture pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    pub smoother: SmootherConfig,
    pub calibration: CalibrationConfig,
    pub stability: StabilityConfig,
    pub score: ScoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// EMA weight of the newest observation
    pub alpha: f64,
    /// Minimum visibility on nose and both shoulders
    pub min_visibility: f64,
    /// Added to shoulder width before dividing
    pub width_epsilon: f64,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            min_visibility: 0.5,
            width_epsilon: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Countdown ticks before samples are collected
    pub lead_in_ticks: u32,
    /// Stable samples needed for a baseline
    pub required_samples: usize,
    /// Max raw change between consecutive frames for a sample to count
    pub stability_delta: f64,
    /// Give up this long after the first calibrating frame
    pub timeout_ms: i64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            lead_in_ticks: 3,
            required_samples: 60,
            stability_delta: 0.03,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub window_capacity: usize,
    /// Window fill required before any verdict
    pub min_samples: usize,
    /// Fraction of slouching frames above which the verdict is slouch
    pub slouch_ratio: f64,
    pub offset_tolerance_floor: f64,
    pub v_ratio_tolerance_floor: f64,
    /// Baseline standard deviations tolerated before a frame counts as slouching
    pub std_multiplier: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window_capacity: 20,
            min_samples: 10,
            slouch_ratio: 0.65,
            offset_tolerance_floor: 0.20,
            v_ratio_tolerance_floor: 0.15,
            std_multiplier: 4.0,
        }
    }
}

/// Score state machine rates and thresholds. Rates are per processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub initial_score: f64,
    pub decay_normal: f64,
    pub decay_extended: f64,
    pub gain_normal: f64,
    pub gain_bonus: f64,
    pub extended_slouch_ms: i64,
    pub bonus_good_ms: i64,
    /// Minimum gap between "slouching too long" nudges
    pub nudge_interval_ms: i64,
    /// Minimum gap between refreshes of the published score
    pub publish_interval_ms: i64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            initial_score: 100.0,
            decay_normal: 0.04,
            decay_extended: 0.10,
            gain_normal: 0.02,
            gain_bonus: 0.04,
            extended_slouch_ms: 15_000,
            bonus_good_ms: 30_000,
            nudge_interval_ms: 12_000,
            publish_interval_ms: 400,
        }
    }
}
