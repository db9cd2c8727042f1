//! # Arogya-Yoga
//!
//! Deterministic, rule-based yoga pose matching.
//!
//! Each target pose is a table of weighted geometric criteria evaluated
//! against a single landmark frame. The weights of the passing criteria sum
//! to an accuracy score in [0, 100]; a pose matches once that score reaches
//! the pose's threshold.
//!
//! | Pose               | Criteria (weight)                                      | Match |
//! |--------------------|--------------------------------------------------------|-------|
//! | balanced-stance    | straight knees (50), level torso (50)                  | ≥ 80  |
//! | seated-bend        | bent knees (40), wrists raised (30), straight arms (30) | ≥ 70  |
//! | single-leg-balance | one-leg stance (40), knee opened (30), hands (30)      | ≥ 70  |
//!
//! Classification is pure. [`PoseTracker`] layers hold timing on top.

pub mod classifier;
pub mod criteria;
pub mod hold;
pub mod poses;
pub mod skeleton;

pub use classifier::*;
pub use criteria::*;
pub use hold::*;
pub use poses::*;
pub use skeleton::*;
