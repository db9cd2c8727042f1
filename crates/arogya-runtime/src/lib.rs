//! # Arogya-Runtime
//!
//! Session runtime for the Arogya engines. A session is a single tokio task
//! that owns a [`arogya_posture::PostureMonitor`] and an
//! [`arogya_yoga::PoseTracker`], consumes landmark frames and commands from a
//! bounded channel, drives the countdown, stats, hold and notification timers,
//! and publishes [`SessionEvent`]s.
//!
//! ```no_run
//! use std::sync::Arc;
//! use arogya_core::MonotonicClock;
//! use arogya_runtime::{spawn_session, EngineConfig};
//!
//! # async fn demo() -> arogya_core::Result<()> {
//! let mut session = spawn_session(EngineConfig::from_env()?, Arc::new(MonotonicClock::new()))?;
//! while let Some(event) = session.events.recv().await {
//!     println!("{}", event.to_json()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod session;

pub use config::*;
pub use session::*;
