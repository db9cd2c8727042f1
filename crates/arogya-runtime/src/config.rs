//! Engine configuration.

use std::time::Duration;

use arogya_core::{Error, Result};
use arogya_posture::PostureConfig;
use arogya_yoga::{PoseClassifier, YogaConfig};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "AROGYA";
const ENV_SEPARATOR: &str = "__";

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Posture pipeline tunables
    pub posture: PostureConfig,

    /// Pose library and visibility gate
    pub yoga: YogaConfig,

    /// Session timer periods
    pub timers: TimerConfig,

    /// Bounded command queue per session
    pub command_queue: usize,

    /// Bounded event queue per session; events are dropped when it is full
    pub event_queue: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Lead-in countdown tick (milliseconds)
    pub countdown_interval_ms: u64,

    /// Session stats refresh (milliseconds)
    pub stats_interval_ms: u64,

    /// Notification auto-dismiss (milliseconds)
    pub toast_ttl_ms: u64,

    /// Pose hold refresh (milliseconds)
    pub hold_tick_ms: u64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            countdown_interval_ms: 1000,
            stats_interval_ms: 2000,
            toast_ttl_ms: 4000,
            hold_tick_ms: 500,
        }
    }
}

impl TimerConfig {
    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    pub fn hold_tick(&self) -> Duration {
        Duration::from_millis(self.hold_tick_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            posture: PostureConfig::default(),
            yoga: YogaConfig::default(),
            timers: TimerConfig::default(),
            command_queue: 64,
            event_queue: 256,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file, with `AROGYA_*` environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(Self::environment())
            .build()
            .map_err(config_error)?;

        Self::finish(settings)
    }

    /// Load from environment variables, e.g. `AROGYA_POSTURE__SCORE__NUDGE_INTERVAL_MS`
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()
            .map_err(config_error)?;

        Self::finish(settings)
    }

    /// Parse an inline TOML document
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()
            .map_err(config_error)?;

        Self::finish(settings)
    }

    /// Reject values the session could not run with
    pub fn validate(&self) -> Result<()> {
        let timers = &self.timers;
        if timers.countdown_interval_ms == 0
            || timers.stats_interval_ms == 0
            || timers.toast_ttl_ms == 0
            || timers.hold_tick_ms == 0
        {
            return Err(Error::Config("timer periods must be non-zero".to_string()));
        }
        if self.command_queue == 0 || self.event_queue == 0 {
            return Err(Error::Config("queue capacities must be non-zero".to_string()));
        }

        let alpha = self.posture.smoother.alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::Config(format!(
                "smoothing factor {} outside (0, 1]",
                alpha
            )));
        }
        let stability = &self.posture.stability;
        if stability.min_samples == 0 || stability.min_samples > stability.window_capacity {
            return Err(Error::Config(format!(
                "stability window needs 1..={} samples, got {}",
                stability.window_capacity, stability.min_samples
            )));
        }
        if self.posture.calibration.required_samples == 0 {
            return Err(Error::Config(
                "calibration needs at least one sample".to_string(),
            ));
        }

        PoseClassifier::new(self.yoga.poses.clone()).map(|_| ())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }

    fn finish(settings: config::Config) -> Result<Self> {
        let config: Self = settings.try_deserialize().map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }
}

fn config_error(err: config::ConfigError) -> Error {
    Error::Config(err.to_string())
}
