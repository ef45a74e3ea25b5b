// src/notify/mod.rs
//! Cycle-outcome notifications: always logged, optionally pushed to webhooks.

pub mod antiflutter;
pub mod slack;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::forecast::NotifyConfig;
use crate::engine::{CycleReport, ForecastState};
use crate::ingest::FetchStatus;

pub use antiflutter::AntiFlutter;
pub use slack::SlackNotifier;

/// Summary of one finished refresh cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleEvent {
    pub state: ForecastState,
    /// State of the previous dispatched cycle; filled in by `NotifierMux`.
    pub previous_state: Option<ForecastState>,
    pub feature_count: usize,
    pub failed_sources: Vec<&'static str>,
    pub cached_sources: Vec<&'static str>,
    pub at: DateTime<Utc>,
}

impl CycleEvent {
    pub fn from_report(report: &CycleReport, at: DateTime<Utc>) -> Self {
        let with_status = |s: FetchStatus| {
            report
                .sources
                .iter()
                .filter(|src| src.status == s)
                .map(|src| src.name)
                .collect::<Vec<_>>()
        };
        Self {
            state: report.result.state,
            previous_state: None,
            feature_count: report.result.feature_count,
            failed_sources: with_status(FetchStatus::Failed),
            cached_sources: with_status(FetchStatus::Cached),
            at,
        }
    }

    pub fn changed(&self) -> bool {
        self.previous_state != Some(self.state)
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, ev: &CycleEvent) -> Result<()>;
}

pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, ev: &CycleEvent) -> Result<()> {
        match ev.state {
            ForecastState::Ok | ForecastState::Initializing => tracing::info!(
                state = %ev.state,
                features = ev.feature_count,
                failed = ?ev.failed_sources,
                cached = ?ev.cached_sources,
                "forecast updated"
            ),
            ForecastState::NoData | ForecastState::Error => tracing::warn!(
                state = %ev.state,
                failed = ?ev.failed_sources,
                "forecast degraded"
            ),
        }
        Ok(())
    }
}

/// Fans a cycle event out: the log sink sees every event, webhook sinks only
/// state changes and non-OK reminders that pass the cooldown gate.
pub struct NotifierMux {
    log: LogNotifier,
    webhooks: Vec<Arc<dyn Notifier>>,
    gate: AntiFlutter,
    last_state: Option<ForecastState>,
}

impl NotifierMux {
    pub fn new(webhooks: Vec<Arc<dyn Notifier>>, cooldown_secs: i64) -> Self {
        Self {
            log: LogNotifier,
            webhooks,
            gate: AntiFlutter::new(cooldown_secs),
            last_state: None,
        }
    }

    pub fn from_config(cfg: &NotifyConfig) -> Self {
        let mut webhooks: Vec<Arc<dyn Notifier>> = Vec::new();
        if let Some(url) = &cfg.slack_webhook_url {
            webhooks.push(Arc::new(SlackNotifier::new(url.clone())));
        } else {
            tracing::debug!("Slack disabled (no webhook url)");
        }
        Self::new(webhooks, cfg.cooldown_secs)
    }

    /// Returns how many webhook sinks accepted the event.
    pub async fn dispatch(&mut self, mut ev: CycleEvent) -> usize {
        ev.previous_state = self.last_state;
        self.last_state = Some(ev.state);

        if let Err(e) = self.log.send(&ev).await {
            tracing::warn!(error = ?e, "log notifier failed");
        }

        let wants_push = ev.changed() || ev.state != ForecastState::Ok;
        if self.webhooks.is_empty() || !wants_push || !self.gate.should_alert(ev.state, ev.at) {
            return 0;
        }

        let mut delivered = 0;
        for sink in &self.webhooks {
            match sink.send(&ev).await {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(error = ?e, sink = sink.name(), "notification failed"),
            }
        }
        if delivered > 0 {
            self.gate.record_alert(ev.state, ev.at);
        }
        delivered
    }
}
