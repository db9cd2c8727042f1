//! Events published to the presentation layer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureStatus {
    Idle,
    Calibrating,
    Good,
    Slouch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Ok,
    Warn,
    Bonus,
}

/// Short user-facing message, shown as a toast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn calibrated() -> Self {
        Self::new(NotificationKind::Ok, "Calibrated! Monitoring your posture.")
    }

    pub fn slouching_too_long() -> Self {
        Self::new(NotificationKind::Warn, "You've been slouching too long, sit up!")
    }

    pub fn bonus_entered() -> Self {
        Self::new(NotificationKind::Bonus, "Bonus mode! Great posture streak!")
    }

    pub fn calibration_timed_out() -> Self {
        Self::new(
            NotificationKind::Warn,
            "Calibration timed out. Sit still and recalibrate.",
        )
    }
}

/// Snapshot of cumulative session time, refreshed by the periodic stats tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub good_secs: f64,
    pub slouch_secs: f64,
}

impl SessionStats {
    /// Share of measured time spent in good posture, 100 before any measurement
    pub fn good_percent(&self) -> u8 {
        let total = self.good_secs + self.slouch_secs;
        if total <= 0.0 {
            return 100;
        }
        (self.good_secs / total * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// One posture-mode update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureEvent {
    pub status: PostureStatus,
    pub score: u8,
    pub is_bonus: bool,
    pub calibration_progress: u8,
    pub session_good_secs: f64,
    pub session_slouch_secs: f64,
    /// Share of good time as of the last stats tick
    pub session_good_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}
