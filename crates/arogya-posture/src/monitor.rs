//! Frame-by-frame posture monitor.
//!
//! Owns the smoother, calibration sampler, baseline, stability window and
//! score engine for one session. Every mutation goes through `&mut self`, so
//! a frame pass, a timer tick and a recalibration can never interleave.

use arogya_core::{Error, LandmarkSample, Result, Timestamp};

use crate::calibration::{Baseline, CalibrationSampler, CalibrationStep};
use crate::config::PostureConfig;
use crate::events::{Notification, PostureEvent, PostureStatus, SessionStats};
use crate::score::ScoreEngine;
use crate::smoother::SignalSmoother;
use crate::stability::{StabilityClassifier, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Waiting for the lead-in countdown
    LeadIn { remaining: u32 },
    Calibrating,
    /// Gave up calibrating; frames are ignored until recalibration
    CalibrationFailed,
    Monitoring,
}

#[derive(Debug, Clone)]
pub struct PostureMonitor {
    config: PostureConfig,
    phase: Phase,
    smoother: SignalSmoother,
    calibration: CalibrationSampler,
    baseline: Option<Baseline>,
    stability: StabilityClassifier,
    score: ScoreEngine,
    stats: SessionStats,
    status: PostureStatus,
}

impl PostureMonitor {
    pub fn new(config: PostureConfig) -> Self {
        Self {
            phase: Phase::LeadIn {
                remaining: config.calibration.lead_in_ticks,
            },
            smoother: SignalSmoother::new(config.smoother.clone()),
            calibration: CalibrationSampler::new(config.calibration.clone()),
            baseline: None,
            stability: StabilityClassifier::new(config.stability.clone()),
            score: ScoreEngine::new(config.score.clone()),
            stats: SessionStats::default(),
            status: PostureStatus::Idle,
            config,
        }
    }

    /// Run one landmark sample through the pipeline.
    ///
    /// Returns `Ok(None)` when the frame is dropped (insufficient visibility,
    /// or calibration previously failed). Returns
    /// [`Error::CalibrationTimeout`] once, on the frame where calibration
    /// gives up.
    pub fn process_frame(
        &mut self,
        sample: &LandmarkSample,
        now: Timestamp,
    ) -> Result<Option<PostureEvent>> {
        if self.phase == Phase::CalibrationFailed {
            return Ok(None);
        }

        let Some(raw) = self.smoother.extract(sample) else {
            return Ok(None);
        };
        let smoothed = self.smoother.update(raw);

        match self.phase {
            Phase::LeadIn { remaining } if remaining > 0 => {
                self.status = PostureStatus::Idle;
                Ok(Some(self.event(None)))
            }
            Phase::LeadIn { .. } | Phase::Calibrating => {
                self.phase = Phase::Calibrating;
                self.status = PostureStatus::Calibrating;

                match self.calibration.offer(raw, smoothed, now) {
                    Ok(CalibrationStep::Collecting { .. }) => Ok(Some(self.event(None))),
                    Ok(CalibrationStep::Complete(baseline)) => {
                        tracing::info!(
                            offset_mean = baseline.offset_mean,
                            offset_std = baseline.offset_std,
                            v_ratio_mean = baseline.v_ratio_mean,
                            v_ratio_std = baseline.v_ratio_std,
                            "posture baseline captured"
                        );
                        self.baseline = Some(baseline);
                        self.phase = Phase::Monitoring;
                        Ok(Some(self.event(Some(Notification::calibrated()))))
                    }
                    Err(err) => {
                        tracing::warn!("calibration failed: {}", err);
                        self.phase = Phase::CalibrationFailed;
                        self.status = PostureStatus::Idle;
                        Err(err)
                    }
                }
            }
            Phase::Monitoring => {
                let Some(baseline) = self.baseline else {
                    return Err(Error::InvalidInput(
                        "monitoring without a baseline".to_string(),
                    ));
                };

                match self.stability.classify(&baseline, &smoothed) {
                    // window still filling: settling, no verdict yet
                    None => {
                        self.status = PostureStatus::Calibrating;
                        Ok(Some(self.event(None)))
                    }
                    Some(verdict) => {
                        let notification = self.score.update(verdict, now);
                        self.status = match verdict {
                            Verdict::Good => PostureStatus::Good,
                            Verdict::Slouch => PostureStatus::Slouch,
                        };
                        Ok(Some(self.event(notification)))
                    }
                }
            }
            Phase::CalibrationFailed => Ok(None),
        }
    }

    /// Advance the lead-in countdown by one tick; returns the ticks remaining
    pub fn countdown_tick(&mut self) -> u32 {
        match self.phase {
            Phase::LeadIn { remaining } => {
                let remaining = remaining.saturating_sub(1);
                self.phase = Phase::LeadIn { remaining };
                remaining
            }
            _ => 0,
        }
    }

    /// Periodic stats refresh; events carry the refreshed values
    pub fn stats_tick(&mut self) -> SessionStats {
        self.stats = self.score.stats();
        self.stats
    }

    /// Throw away baseline, samples, window and score in one step and restart
    /// the lead-in countdown.
    pub fn recalibrate(&mut self) {
        tracing::info!("recalibrating posture baseline");
        self.smoother.reset();
        self.calibration.reset();
        self.baseline = None;
        self.stability.reset();
        self.score.reset();
        self.stats = SessionStats::default();
        self.status = PostureStatus::Idle;
        self.phase = Phase::LeadIn {
            remaining: self.config.calibration.lead_in_ticks,
        };
    }

    /// Current state as an event, without processing a frame
    pub fn snapshot(&self) -> PostureEvent {
        self.event(None)
    }

    fn event(&self, notification: Option<Notification>) -> PostureEvent {
        PostureEvent {
            status: self.status,
            score: self.score.published_score(),
            is_bonus: self.score.is_bonus(),
            calibration_progress: self.calibration_progress(),
            session_good_secs: self.stats.good_secs,
            session_slouch_secs: self.stats.slouch_secs,
            session_good_percent: self.stats.good_percent(),
            notification,
        }
    }

    pub fn calibration_progress(&self) -> u8 {
        if self.baseline.is_some() {
            100
        } else {
            self.calibration.progress()
        }
    }

    pub fn countdown_remaining(&self) -> u32 {
        match self.phase {
            Phase::LeadIn { remaining } => remaining,
            _ => 0,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn calibration_failed(&self) -> bool {
        self.phase == Phase::CalibrationFailed
    }

    pub fn baseline(&self) -> Option<&Baseline> {
        self.baseline.as_ref()
    }

    pub fn status(&self) -> PostureStatus {
        self.status
    }

    pub fn score(&self) -> &ScoreEngine {
        &self.score
    }

    pub fn stability(&self) -> &StabilityClassifier {
        &self.stability
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn config(&self) -> &PostureConfig {
        &self.config
    }
}

impl Default for PostureMonitor {
    fn default() -> Self {
        Self::new(PostureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NotificationKind;
    use arogya_core::{Keypoint, Landmark};

    const FRAME_MS: i64 = 33;

    /// Shoulders 0.2 apart at y=0.5; `drop` moves the nose towards them.
    fn frame(nose_dx: f64, drop: f64) -> LandmarkSample {
        LandmarkSample::new()
            .with(Keypoint::Nose, Landmark::new(0.5 + nose_dx, 0.42 + drop, 0.95))
            .with(Keypoint::LeftShoulder, Landmark::new(0.6, 0.5, 0.95))
            .with(Keypoint::RightShoulder, Landmark::new(0.4, 0.5, 0.95))
    }

    struct Driver {
        monitor: PostureMonitor,
        frame: i64,
    }

    impl Driver {
        fn new() -> Self {
            Self {
                monitor: PostureMonitor::default(),
                frame: 0,
            }
        }

        fn now(&self) -> Timestamp {
            Timestamp::from_millis(self.frame * FRAME_MS)
        }

        fn feed(&mut self, sample: &LandmarkSample) -> Option<PostureEvent> {
            let now = self.now();
            self.frame += 1;
            self.monitor.process_frame(sample, now).unwrap()
        }

        fn calibrate(&mut self) {
            for _ in 0..3 {
                self.monitor.countdown_tick();
            }
            let upright = frame(0.0, 0.0);
            for _ in 0..60 {
                self.feed(&upright);
            }
            assert!(self.monitor.is_calibrated());
        }
    }

    #[test]
    fn test_idle_during_lead_in() {
        let mut driver = Driver::new();
        let event = driver.feed(&frame(0.0, 0.0)).unwrap();
        assert_eq!(event.status, PostureStatus::Idle);
        assert_eq!(event.calibration_progress, 0);

        assert_eq!(driver.monitor.countdown_tick(), 2);
        assert_eq!(driver.monitor.countdown_tick(), 1);
        assert_eq!(driver.monitor.countdown_tick(), 0);

        let event = driver.feed(&frame(0.0, 0.0)).unwrap();
        assert_eq!(event.status, PostureStatus::Calibrating);
        assert_eq!(event.calibration_progress, 2);
    }

    #[test]
    fn test_invisible_frame_is_dropped() {
        let mut driver = Driver::new();
        driver.calibrate();
        let before = driver.monitor.stability().len();

        let hidden = LandmarkSample::new()
            .with(Keypoint::Nose, Landmark::new(0.5, 0.4, 0.2))
            .with(Keypoint::LeftShoulder, Landmark::new(0.6, 0.5, 0.9))
            .with(Keypoint::RightShoulder, Landmark::new(0.4, 0.5, 0.9));
        assert!(driver.feed(&hidden).is_none());
        assert_eq!(driver.monitor.stability().len(), before);
    }

    #[test]
    fn test_calibration_emits_notification_once() {
        let mut driver = Driver::new();
        for _ in 0..3 {
            driver.monitor.countdown_tick();
        }

        let mut calibrated = 0;
        for _ in 0..80 {
            if let Some(PostureEvent {
                notification: Some(n),
                ..
            }) = driver.feed(&frame(0.0, 0.0))
            {
                assert_eq!(n.kind, NotificationKind::Ok);
                calibrated += 1;
            }
        }
        assert_eq!(calibrated, 1);
        assert_eq!(driver.monitor.calibration_progress(), 100);
    }

    #[test]
    fn test_no_verdict_while_window_fills() {
        let mut driver = Driver::new();
        driver.calibrate();

        for i in 0..9 {
            let event = driver.feed(&frame(0.0, 0.0)).unwrap();
            assert_eq!(event.status, PostureStatus::Calibrating, "frame {}", i);
        }
        let event = driver.feed(&frame(0.0, 0.0)).unwrap();
        assert_eq!(event.status, PostureStatus::Good);
    }

    #[test]
    fn test_slouch_detected_and_scored() {
        let mut driver = Driver::new();
        driver.calibrate();

        // nose sinks 0.06 => vRatio 0.4 -> 0.1, well past the 0.15 tolerance
        let slouched = frame(0.0, 0.06);
        let mut last = None;
        for _ in 0..120 {
            last = driver.feed(&slouched);
        }
        let event = last.unwrap();
        assert_eq!(event.status, PostureStatus::Slouch);
        assert!(driver.monitor.score().score() < 100.0);
        assert!(event.score <= 100);
    }

    #[test]
    fn test_recalibrate_resets_everything() {
        let mut driver = Driver::new();
        driver.calibrate();
        for _ in 0..120 {
            driver.feed(&frame(0.0, 0.06));
        }
        driver.monitor.stats_tick();
        assert!(driver.monitor.stats().slouch_secs > 0.0);

        driver.monitor.recalibrate();

        let snap = driver.monitor.snapshot();
        assert_eq!(snap.score, 100);
        assert!(!snap.is_bonus);
        assert_eq!(snap.calibration_progress, 0);
        assert_eq!(snap.status, PostureStatus::Idle);
        assert_eq!(snap.session_slouch_secs, 0.0);
        assert_eq!(snap.session_good_percent, 100);
        assert!(driver.monitor.stability().is_empty());
        assert!(driver.monitor.baseline().is_none());
        assert_eq!(driver.monitor.countdown_remaining(), 3);
    }

    #[test]
    fn test_calibration_timeout_then_recover() {
        let mut monitor = PostureMonitor::default();
        for _ in 0..3 {
            monitor.countdown_tick();
        }

        // alternate wildly so nothing but the first frame is accepted
        let mut failure = None;
        for i in 0..1_000i64 {
            let sample = frame(if i % 2 == 0 { 0.0 } else { 0.05 }, 0.0);
            match monitor.process_frame(&sample, Timestamp::from_millis(i * FRAME_MS)) {
                Ok(_) => {}
                Err(err) => {
                    failure = Some((i, err));
                    break;
                }
            }
        }

        let (at, err) = failure.expect("calibration must time out");
        assert!(matches!(err, Error::CalibrationTimeout { .. }));
        assert!(at * FRAME_MS > 30_000);
        assert!(monitor.calibration_failed());

        // ignored until recalibration
        assert_eq!(
            monitor
                .process_frame(&frame(0.0, 0.0), Timestamp::from_millis(40_000))
                .unwrap(),
            None
        );

        monitor.recalibrate();
        assert!(!monitor.calibration_failed());
        let event = monitor
            .process_frame(&frame(0.0, 0.0), Timestamp::from_millis(41_000))
            .unwrap()
            .unwrap();
        assert_eq!(event.status, PostureStatus::Idle);
    }
}
