// src/notify/antiflutter.rs
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::engine::ForecastState;

/// Cooldown gate for outbound notifications.
/// - First alert always allowed.
/// - Inside cooldown only a state change passes; repeats are suppressed.
/// - State is updated explicitly via `record_alert` after a successful send.
#[derive(Debug, Clone, Default)]
pub struct AntiFlutter {
    cooldown: ChronoDuration,
    last_alert_ts: Option<DateTime<Utc>>,
    last_state: Option<ForecastState>,
}

impl AntiFlutter {
    /// `cooldown_secs` < 0 is treated as 0 (no cooldown).
    pub fn new(cooldown_secs: i64) -> Self {
        let secs = cooldown_secs.max(0);
        Self {
            cooldown: ChronoDuration::seconds(secs),
            last_alert_ts: None,
            last_state: None,
        }
    }

    /// Does NOT mutate state.
    pub fn should_alert(&self, state: ForecastState, now: DateTime<Utc>) -> bool {
        match (self.last_alert_ts, self.last_state) {
            (Some(ts), Some(last)) => {
                last != state || now.signed_duration_since(ts) >= self.cooldown
            }
            _ => true,
        }
    }

    pub fn record_alert(&mut self, state: ForecastState, now: DateTime<Utc>) {
        self.last_alert_ts = Some(now);
        self.last_state = Some(state);
    }
}
