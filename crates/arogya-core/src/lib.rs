//! # Arogya-Core
//!
//! Core types and utilities shared by the Arogya posture and yoga engines:
//! normalized body landmarks, monotonic timestamps and clocks, 2D joint
//! geometry, and the workspace-wide error type.

pub mod clock;
pub mod error;
pub mod geometry;
pub mod types;

pub use clock::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use types::*;
