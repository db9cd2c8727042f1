//! Session actor.
//!
//! One tokio task owns the posture monitor and the pose tracker of a session.
//! Frames, commands and timer ticks are all handled on that task, so every
//! state transition is serialized without locks.

use std::sync::Arc;

use arogya_core::{
    wall_clock_now, Clock, Error, Landmark, LandmarkSample, Result, SessionId, Timestamp,
};
use arogya_posture::{Notification, PostureEvent, PostureMonitor, SessionStats};
use arogya_yoga::{PoseEvent, PoseKind, PoseTracker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};

use crate::config::EngineConfig;

/// Requests accepted by a running session
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A landmark frame and its capture time. Unstamped frames take the
    /// session clock's time when they are dequeued.
    Frame {
        sample: LandmarkSample,
        captured_at: Option<Timestamp>,
    },
    Recalibrate,
    SelectPose(Option<PoseKind>),
    Shutdown,
}

/// JSON shape of a client command, e.g.
/// `{"command": "selectPose", "data": "single-leg-balance"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Dense landmark list as produced by the extractor; position is the index
    Frame {
        landmarks: Vec<Landmark>,
        /// Capture time on the session clock (milliseconds)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp_ms: Option<i64>,
    },
    Recalibrate,
    SelectPose(Option<PoseKind>),
    Shutdown,
}

impl From<ClientMessage> for Command {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Frame {
                landmarks,
                timestamp_ms,
            } => Command::Frame {
                sample: LandmarkSample::from_dense(&landmarks),
                captured_at: timestamp_ms.map(Timestamp::from_millis),
            },
            ClientMessage::Recalibrate => Command::Recalibrate,
            ClientMessage::SelectPose(pose) => Command::SelectPose(pose),
            ClientMessage::Shutdown => Command::Shutdown,
        }
    }
}

impl Command {
    pub fn from_json(json: &str) -> Result<Self> {
        let message: ClientMessage = serde_json::from_str(json)?;
        Ok(message.into())
    }
}

/// Everything a session publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Lead-in countdown advanced
    Countdown { remaining: u32 },
    Posture(PostureEvent),
    Pose(PoseEvent),
    /// Periodic cumulative time refresh
    Stats(SessionStats),
    /// Calibration gave up; frames are ignored until recalibration
    CalibrationFailed { message: String },
    /// The last notification expired
    NotificationDismissed,
}

impl SessionEvent {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Events a consumer must not miss: notifications and calibration failure
    pub fn is_one_off(&self) -> bool {
        match self {
            SessionEvent::Posture(event) => event.notification.is_some(),
            SessionEvent::CalibrationFailed { .. } => true,
            _ => false,
        }
    }
}

/// Final report returned when the session task ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub frames_received: u64,
    /// Frames that passed a visibility gate and produced an event
    pub frames_processed: u64,
    pub good_secs: f64,
    pub slouch_secs: f64,
    pub good_percent: u8,
    pub final_score: u8,
    pub best_hold_secs: f64,
}

/// Cheap, cloneable sender side of a session
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::Sender<Command>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| Error::SessionClosed)
    }

    /// Send a frame stamped with the session clock at the time of the call
    pub async fn frame(&self, sample: LandmarkSample) -> Result<()> {
        let captured_at = self.clock.now();
        self.frame_at(sample, captured_at).await
    }

    /// Send a frame with an explicit capture time
    pub async fn frame_at(&self, sample: LandmarkSample, captured_at: Timestamp) -> Result<()> {
        self.send(Command::Frame {
            sample,
            captured_at: Some(captured_at),
        })
        .await
    }

    pub async fn recalibrate(&self) -> Result<()> {
        self.send(Command::Recalibrate).await
    }

    pub async fn select_pose(&self, pose: Option<PoseKind>) -> Result<()> {
        self.send(Command::SelectPose(pose)).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Running session: handle, event stream and the task resolving to its summary
pub struct SpawnedSession {
    pub handle: SessionHandle,
    pub events: mpsc::Receiver<SessionEvent>,
    pub task: JoinHandle<SessionSummary>,
}

/// Start a session task on the current tokio runtime
pub fn spawn_session(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<SpawnedSession> {
    config.validate()?;

    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_queue);
    let (event_tx, events) = mpsc::channel(config.event_queue);

    let session = Session::new(config, clock.clone(), event_tx)?;
    let handle = SessionHandle {
        id: session.id,
        tx: cmd_tx,
        clock,
    };

    tracing::info!(session = %session.id, "session started");
    let task = tokio::spawn(session.run(cmd_rx));

    Ok(SpawnedSession {
        handle,
        events,
        task,
    })
}

enum Flow {
    Continue,
    Recalibrated,
    Stop,
}

struct Session {
    id: SessionId,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    events: mpsc::Sender<SessionEvent>,
    monitor: PostureMonitor,
    tracker: PoseTracker,
    toast_deadline: Option<Instant>,
    started_at: DateTime<Utc>,
    frames_received: u64,
    frames_processed: u64,
}

impl Session {
    fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Self> {
        Ok(Self {
            id: SessionId::new(),
            monitor: PostureMonitor::new(config.posture.clone()),
            tracker: PoseTracker::new(config.yoga.clone())?,
            clock,
            events,
            toast_deadline: None,
            started_at: wall_clock_now(),
            frames_received: 0,
            frames_processed: 0,
            config,
        })
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> SessionSummary {
        let timers = self.config.timers.clone();
        let mut countdown = periodic(timers.countdown_interval());
        let mut stats = periodic(timers.stats_interval());
        let mut hold = periodic(timers.hold_tick());

        loop {
            let toast = self.toast_deadline;

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!(session = %self.id, "all handles dropped");
                        break;
                    };
                    match self.handle_command(command).await {
                        Flow::Continue => {}
                        Flow::Recalibrated => countdown.reset(),
                        Flow::Stop => break,
                    }
                }
                _ = countdown.tick(), if self.monitor.countdown_remaining() > 0 => {
                    let remaining = self.monitor.countdown_tick();
                    self.publish(SessionEvent::Countdown { remaining }).await;
                }
                _ = stats.tick() => {
                    let stats = self.monitor.stats_tick();
                    self.publish(SessionEvent::Stats(stats)).await;
                }
                _ = hold.tick() => {
                    if self.tracker.is_holding() {
                        self.tracker.hold_tick(self.clock.now());
                        let snapshot = self.tracker.snapshot();
                        self.publish(SessionEvent::Pose(snapshot)).await;
                    }
                }
                _ = sleep_until(toast.unwrap_or_else(Instant::now)), if toast.is_some() => {
                    self.toast_deadline = None;
                    self.publish(SessionEvent::NotificationDismissed).await;
                }
            }
        }

        let summary = self.summary();
        tracing::info!(
            session = %self.id,
            frames_received = summary.frames_received,
            frames_processed = summary.frames_processed,
            good_percent = summary.good_percent,
            final_score = summary.final_score,
            "session stopped"
        );
        summary
    }

    async fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::Frame {
                sample,
                captured_at,
            } => {
                let now = captured_at.unwrap_or_else(|| self.clock.now());
                self.on_frame(&sample, now).await;
                Flow::Continue
            }
            Command::Recalibrate => {
                self.monitor.recalibrate();
                self.toast_deadline = None;
                let snapshot = self.monitor.snapshot();
                self.publish(SessionEvent::Posture(snapshot)).await;
                Flow::Recalibrated
            }
            Command::SelectPose(pose) => {
                self.tracker.select_pose(pose);
                let snapshot = self.tracker.snapshot();
                self.publish(SessionEvent::Pose(snapshot)).await;
                Flow::Continue
            }
            Command::Shutdown => Flow::Stop,
        }
    }

    async fn on_frame(&mut self, sample: &LandmarkSample, now: Timestamp) {
        self.frames_received += 1;
        let mut produced = false;

        match self.monitor.process_frame(sample, now) {
            Ok(Some(event)) => {
                produced = true;
                if let Some(notification) = &event.notification {
                    self.show_toast(notification);
                }
                self.publish(SessionEvent::Posture(event)).await;
            }
            Ok(None) => {}
            Err(err @ Error::CalibrationTimeout { .. }) => {
                produced = true;
                let notification = Notification::calibration_timed_out();
                self.show_toast(&notification);
                let mut event = self.monitor.snapshot();
                event.notification = Some(notification);
                self.publish(SessionEvent::CalibrationFailed {
                    message: err.to_string(),
                })
                .await;
                self.publish(SessionEvent::Posture(event)).await;
            }
            Err(err) => tracing::warn!(session = %self.id, "posture frame rejected: {}", err),
        }

        match self.tracker.process_frame(sample, now) {
            Ok(Some(event)) => {
                produced = true;
                self.publish(SessionEvent::Pose(event)).await;
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(session = %self.id, "pose frame rejected: {}", err),
        }

        if produced {
            self.frames_processed += 1;
        }
    }

    fn show_toast(&mut self, notification: &Notification) {
        tracing::debug!(session = %self.id, kind = ?notification.kind, "{}", notification.message);
        self.toast_deadline = Some(Instant::now() + self.config.timers.toast_ttl());
    }

    /// Routine updates are dropped when the queue is full; one-off
    /// notifications wait for room instead.
    async fn publish(&self, event: SessionEvent) {
        if event.is_one_off() {
            // a closed receiver means nobody is listening; keep running
            let _ = self.events.send(event).await;
            return;
        }

        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session = %self.id, "event queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    fn summary(&self) -> SessionSummary {
        let stats = self.monitor.score().stats();
        SessionSummary {
            session_id: self.id,
            started_at: self.started_at,
            ended_at: wall_clock_now(),
            frames_received: self.frames_received,
            frames_processed: self.frames_processed,
            good_secs: stats.good_secs,
            slouch_secs: stats.slouch_secs,
            good_percent: stats.good_percent(),
            final_score: self.monitor.score().published_score(),
            best_hold_secs: self.tracker.best_hold_secs(),
        }
    }
}

fn periodic(period: std::time::Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
