//! Posture score state machine.
//!
//! ## Tiers
//!
//! | State                | Rate per frame |
//! |----------------------|----------------|
//! | slouch               | -0.04          |
//! | slouch > 15 s        | -0.10          |
//! | good                 | +0.02          |
//! | good > 30 s (bonus)  | +0.04          |
//!
//! Rates apply per processed frame, so the effective per-second rate follows
//! the capture frame rate.

use arogya_core::Timestamp;
use serde::{Deserialize, Serialize};

use crate::config::ScoreConfig;
use crate::events::{Notification, SessionStats};
use crate::stability::Verdict;

/// Mutable scoring state for one calibrated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    /// Always within [0, 100]
    pub score: f64,
    pub slouch_start: Option<Timestamp>,
    pub good_start: Option<Timestamp>,
    pub is_bonus: bool,
    pub last_notify: Option<Timestamp>,
    pub cumulative_good_secs: f64,
    pub cumulative_slouch_secs: f64,
}

impl ScoreState {
    pub fn new(initial_score: f64) -> Self {
        Self {
            score: initial_score.clamp(0.0, 100.0),
            slouch_start: None,
            good_start: None,
            is_bonus: false,
            last_notify: None,
            cumulative_good_secs: 0.0,
            cumulative_slouch_secs: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoreEngine {
    config: ScoreConfig,
    state: ScoreState,
    last_tick: Option<Timestamp>,
    last_publish: Option<Timestamp>,
    published: u8,
}

impl ScoreEngine {
    pub fn new(config: ScoreConfig) -> Self {
        let state = ScoreState::new(config.initial_score);
        let published = round_score(state.score);
        Self {
            config,
            state,
            last_tick: None,
            last_publish: None,
            published,
        }
    }

    /// Apply one stable verdict observed at `now`.
    ///
    /// Returns a notification when this frame crosses a nudge or bonus edge.
    pub fn update(&mut self, verdict: Verdict, now: Timestamp) -> Option<Notification> {
        let dt = self.last_tick.map(|t| now.secs_since(t)).unwrap_or(0.0);
        self.last_tick = Some(now);

        let notification = match verdict {
            Verdict::Slouch => self.on_slouch(now, dt),
            Verdict::Good => self.on_good(now, dt),
        };

        self.refresh_published(now);
        notification
    }

    fn on_slouch(&mut self, now: Timestamp, dt: f64) -> Option<Notification> {
        let state = &mut self.state;
        state.cumulative_slouch_secs += dt;
        state.good_start = None;
        state.is_bonus = false;

        let started = *state.slouch_start.get_or_insert(now);
        let extended = now.millis_since(started) > self.config.extended_slouch_ms;

        let decay = if extended {
            self.config.decay_extended
        } else {
            self.config.decay_normal
        };
        state.score = (state.score - decay).clamp(0.0, 100.0);

        let nudge_due = state
            .last_notify
            .map_or(true, |last| now.millis_since(last) > self.config.nudge_interval_ms);
        if extended && nudge_due {
            state.last_notify = Some(now);
            tracing::debug!(score = state.score, "extended slouch nudge");
            return Some(Notification::slouching_too_long());
        }
        None
    }

    fn on_good(&mut self, now: Timestamp, dt: f64) -> Option<Notification> {
        let state = &mut self.state;
        state.cumulative_good_secs += dt;
        state.slouch_start = None;

        let started = *state.good_start.get_or_insert(now);
        let bonus = now.millis_since(started) > self.config.bonus_good_ms;

        let gain = if bonus {
            self.config.gain_bonus
        } else {
            self.config.gain_normal
        };
        state.score = (state.score + gain).clamp(0.0, 100.0);

        let entered_bonus = bonus && !state.is_bonus;
        state.is_bonus = bonus;
        if entered_bonus {
            tracing::debug!(score = state.score, "bonus streak entered");
            return Some(Notification::bonus_entered());
        }
        None
    }

    fn refresh_published(&mut self, now: Timestamp) {
        let due = self
            .last_publish
            .map_or(true, |last| now.millis_since(last) > self.config.publish_interval_ms);
        if due {
            self.published = round_score(self.state.score);
            self.last_publish = Some(now);
        }
    }

    /// Throttled, rounded score for consumers
    pub fn published_score(&self) -> u8 {
        self.published
    }

    /// Unthrottled internal score
    pub fn score(&self) -> f64 {
        self.state.score
    }

    pub fn is_bonus(&self) -> bool {
        self.state.is_bonus
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    /// Cumulative time counters as of the last processed frame
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            good_secs: self.state.cumulative_good_secs,
            slouch_secs: self.state.cumulative_slouch_secs,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(ScoreConfig::default())
    }
}

fn round_score(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NotificationKind;

    const FRAME_MS: i64 = 33;

    fn at(frame: i64) -> Timestamp {
        Timestamp::from_millis(frame * FRAME_MS)
    }

    #[test]
    fn test_extended_slouch_accelerates_decay() {
        let mut engine = ScoreEngine::default();
        let mut previous = engine.score();
        let mut early_step = None;
        let mut late_step = None;

        for frame in 0..700 {
            engine.update(Verdict::Slouch, at(frame));
            let step = previous - engine.score();
            assert!(step >= 0.0, "score must not increase while slouching");

            let elapsed = frame * FRAME_MS;
            if elapsed == 33 * 100 {
                early_step = Some(step);
            }
            if elapsed == 33 * 600 {
                late_step = Some(step);
            }
            previous = engine.score();
        }

        assert!((early_step.unwrap() - 0.04).abs() < 1e-9);
        assert!((late_step.unwrap() - 0.10).abs() < 1e-9);
        assert!(engine.state().cumulative_slouch_secs > 23.0);
    }

    #[test]
    fn test_nudge_is_debounced() {
        let mut engine = ScoreEngine::default();
        let mut nudges = Vec::new();

        // 40 s of continuous slouching
        for frame in 0..1213 {
            if let Some(n) = engine.update(Verdict::Slouch, at(frame)) {
                assert_eq!(n.kind, NotificationKind::Warn);
                nudges.push(frame * FRAME_MS);
            }
        }

        assert_eq!(nudges.len(), 3);
        assert!(nudges[0] > 15_000 && nudges[0] <= 15_000 + FRAME_MS);
        for pair in nudges.windows(2) {
            assert!(pair[1] - pair[0] > 12_000);
        }
    }

    #[test]
    fn test_bonus_edge_and_reset() {
        let mut engine = ScoreEngine::new(ScoreConfig {
            initial_score: 50.0,
            ..Default::default()
        });

        let mut bonus_events = 0;
        let mut frame = 0;
        while frame * FRAME_MS <= 35_000 {
            if let Some(n) = engine.update(Verdict::Good, at(frame)) {
                assert_eq!(n.kind, NotificationKind::Bonus);
                bonus_events += 1;
            }
            frame += 1;
        }
        assert!(engine.is_bonus());
        assert_eq!(bonus_events, 1);
        assert!(engine.state().good_start.is_some());

        engine.update(Verdict::Slouch, at(frame));
        assert!(!engine.is_bonus());
        assert!(engine.state().good_start.is_none());

        // fresh streak needs another 30 s
        frame += 1;
        assert!(engine.update(Verdict::Good, at(frame)).is_none());
        assert!(!engine.is_bonus());
    }

    #[test]
    fn test_score_clamped() {
        let mut engine = ScoreEngine::new(ScoreConfig {
            initial_score: 0.05,
            ..Default::default()
        });
        for frame in 0..10 {
            engine.update(Verdict::Slouch, at(frame));
            assert!(engine.score() >= 0.0);
        }
        assert_eq!(engine.score(), 0.0);

        let mut engine = ScoreEngine::default();
        for frame in 0..2_000 {
            engine.update(Verdict::Good, at(frame));
            assert!(engine.score() <= 100.0);
        }
        assert_eq!(engine.published_score(), 100);
    }

    #[test]
    fn test_published_score_throttled() {
        let mut engine = ScoreEngine::new(ScoreConfig {
            initial_score: 50.0,
            decay_normal: 1.0,
            ..Default::default()
        });

        engine.update(Verdict::Slouch, Timestamp::from_millis(0));
        assert_eq!(engine.published_score(), 49);

        engine.update(Verdict::Slouch, Timestamp::from_millis(100));
        engine.update(Verdict::Slouch, Timestamp::from_millis(200));
        assert_eq!(engine.published_score(), 49);
        assert!((engine.score() - 47.0).abs() < 1e-9);

        engine.update(Verdict::Slouch, Timestamp::from_millis(401));
        assert_eq!(engine.published_score(), 46);
    }

    #[test]
    fn test_first_update_adds_no_time() {
        let mut engine = ScoreEngine::default();
        engine.update(Verdict::Good, Timestamp::from_millis(90_000));
        assert_eq!(engine.stats().good_secs, 0.0);

        engine.update(Verdict::Good, Timestamp::from_millis(91_000));
        assert!((engine.stats().good_secs - 1.0).abs() < 1e-9);
    }
}
