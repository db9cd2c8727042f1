//! # Arogya-Posture
//!
//! Real-time slouch detection with a personalized baseline.
//!
//! ## Pipeline
//!
//! 1. **Smoothing**: two scale-invariant head/shoulder features are computed
//!    per frame and low-pass filtered with an EMA
//! 2. **Calibration**: after a short lead-in, stable frames are collected
//!    until a mean/std baseline can be computed
//! 3. **Stability**: per-frame slouch flags are majority-voted over a sliding
//!    window to suppress detector jitter
//! 4. **Scoring**: a 0-100 score decays while slouching and recovers while
//!    sitting well, with escalating tiers and a bonus streak
//!
//! [`PostureMonitor`] owns all of the above and is driven one frame at a time.

pub mod calibration;
pub mod config;
pub mod events;
pub mod monitor;
pub mod score;
pub mod smoother;
pub mod stability;

pub use calibration::*;
pub use config::*;
pub use events::*;
pub use monitor::*;
pub use score::*;
pub use smoother::*;
pub use stability::*;
