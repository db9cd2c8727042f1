//! Personalized baseline capture.
//!
//! Samples are only accepted while the subject holds still: the raw features
//! of consecutive frames must agree within `stability_delta`. Once enough
//! samples are collected the mean and population standard deviation of each
//! smoothed feature become the [`Baseline`].

use arogya_core::{Error, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::config::CalibrationConfig;
use crate::smoother::{RawFeatures, SmoothedFeatures};

/// Reference posture for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub offset_mean: f64,
    pub offset_std: f64,
    pub v_ratio_mean: f64,
    pub v_ratio_std: f64,
}

impl Baseline {
    /// Mean and population standard deviation over `samples`
    pub fn from_samples(samples: &[SmoothedFeatures]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let offset_mean = samples.iter().map(|s| s.offset).sum::<f64>() / n;
        let v_ratio_mean = samples.iter().map(|s| s.v_ratio).sum::<f64>() / n;

        let offset_var = samples
            .iter()
            .map(|s| (s.offset - offset_mean).powi(2))
            .sum::<f64>()
            / n;
        let v_ratio_var = samples
            .iter()
            .map(|s| (s.v_ratio - v_ratio_mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            offset_mean,
            offset_std: offset_var.sqrt(),
            v_ratio_mean,
            v_ratio_std: v_ratio_var.sqrt(),
        })
    }
}

/// Outcome of offering one frame to the sampler
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStep {
    /// Still collecting; `accepted` tells whether this frame counted
    Collecting { progress: u8, accepted: bool },
    /// Baseline captured on this frame
    Complete(Baseline),
}

/// Collects stable samples until a baseline can be computed
#[derive(Debug, Clone)]
pub struct CalibrationSampler {
    config: CalibrationConfig,
    samples: Vec<SmoothedFeatures>,
    previous: Option<RawFeatures>,
    started_at: Option<Timestamp>,
}

impl CalibrationSampler {
    pub fn new(config: CalibrationConfig) -> Self {
        let capacity = config.required_samples;
        Self {
            config,
            samples: Vec::with_capacity(capacity),
            previous: None,
            started_at: None,
        }
    }

    /// Offer one calibrating frame.
    ///
    /// Fails with [`Error::CalibrationTimeout`] once the time budget since the
    /// first offered frame is spent without reaching the required count.
    pub fn offer(
        &mut self,
        raw: RawFeatures,
        smoothed: SmoothedFeatures,
        now: Timestamp,
    ) -> Result<CalibrationStep> {
        let started = *self.started_at.get_or_insert(now);
        let elapsed_ms = now.millis_since(started);
        if elapsed_ms > self.config.timeout_ms {
            return Err(Error::CalibrationTimeout {
                accepted: self.samples.len(),
                required: self.config.required_samples,
                elapsed_ms,
            });
        }

        let accepted = match self.previous {
            None => true,
            Some(prev) => raw.is_close_to(&prev, self.config.stability_delta),
        };
        self.previous = Some(raw);

        if accepted {
            self.samples.push(smoothed);
        }

        if self.samples.len() >= self.config.required_samples {
            if let Some(baseline) = Baseline::from_samples(&self.samples) {
                self.samples.clear();
                self.previous = None;
                return Ok(CalibrationStep::Complete(baseline));
            }
        }

        Ok(CalibrationStep::Collecting {
            progress: self.progress(),
            accepted,
        })
    }

    /// Percentage of required samples collected, 0-100
    pub fn progress(&self) -> u8 {
        progress_percent(self.samples.len(), self.config.required_samples)
    }

    pub fn accepted(&self) -> usize {
        self.samples.len()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.previous = None;
        self.started_at = None;
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }
}

impl Default for CalibrationSampler {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}

pub(crate) fn progress_percent(accepted: usize, required: usize) -> u8 {
    if required == 0 {
        return 100;
    }
    let pct = (accepted as f64 / required as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}
