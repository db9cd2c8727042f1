//! Error types for the Arogya engine.

use thiserror::Error;

use crate::types::Keypoint;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Required landmark missing from sample: {keypoint:?}")]
    MissingLandmark { keypoint: Keypoint },

    #[error(
        "Calibration timed out after {elapsed_ms}ms: accepted {accepted} of {required} stable samples"
    )]
    CalibrationTimeout {
        accepted: usize,
        required: usize,
        elapsed_ms: i64,
    },

    #[error("Unknown pose: {0}")]
    UnknownPose(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Session closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
