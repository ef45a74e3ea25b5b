//! # Forecast engine
//! One refresh cycle: gather every source, patch failed or empty sources from
//! the cache, analyze, render, and fall back to the last good result when the
//! build stage fails or yields nothing.
//!
//! `Pipeline::run_cycle` never returns an error; every failure ends in a
//! `ForecastResult` with an appropriate state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::analyze::{analyze, AnalyzeParams};
use crate::cache::ForecastCache;
use crate::config::ForecastConfig;
use crate::ingest::http::SourceClient;
use crate::ingest::types::{CandidateItem, SourceProvider};
use crate::ingest::{ensure_metrics_described, gather, providers, FetchStatus, SourceOutcome};
use crate::notify::{CycleEvent, NotifierMux};
use crate::render::{self, Forecast, ForecastRenderer, HtmlRenderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastState {
    Initializing,
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "No Data")]
    NoData,
    Error,
}

impl ForecastState {
    pub fn as_str(self) -> &'static str {
        match self {
            ForecastState::Initializing => "Initializing",
            ForecastState::Ok => "OK",
            ForecastState::NoData => "No Data",
            ForecastState::Error => "Error",
        }
    }
}

impl fmt::Display for ForecastState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the host reads: state, HTML body and rendered item count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub state: ForecastState,
    pub rendered_html: String,
    pub feature_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl ForecastResult {
    pub fn initializing() -> Self {
        Self {
            state: ForecastState::Initializing,
            rendered_html: render::initializing_html(),
            feature_count: 0,
            updated_at: Utc::now(),
        }
    }

    fn no_data(now: DateTime<Utc>) -> Self {
        Self {
            state: ForecastState::NoData,
            rendered_html: render::no_data_html(),
            feature_count: 0,
            updated_at: now,
        }
    }

    fn error(message: &str, now: DateTime<Utc>) -> Self {
        Self {
            state: ForecastState::Error,
            rendered_html: render::error_html(message),
            feature_count: 0,
            updated_at: now,
        }
    }
}

/// How a cycle arrived at its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Fresh,
    /// Nothing usable this cycle; last success reused.
    ReusedAfterNoData,
    /// Build stage failed; last success reused.
    ReusedAfterError,
    NoData,
    Error,
}

#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub name: &'static str,
    pub status: FetchStatus,
    pub items: usize,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub result: ForecastResult,
    pub outcome: CycleOutcome,
    pub sources: Vec<SourceSummary>,
}

/// Replace empty or failed outcomes with the cached list for that source and
/// store fresh lists. Returns the merged raw candidates.
pub fn merge_with_cache(
    outcomes: &mut [SourceOutcome],
    cache: &mut ForecastCache,
) -> Vec<CandidateItem> {
    let mut raw = Vec::new();
    for o in outcomes.iter_mut() {
        match o.status {
            FetchStatus::Fresh => cache.store_source(o.kind, &o.items),
            FetchStatus::Empty | FetchStatus::Failed => {
                if let Some(cached) = cache.source_items(o.kind) {
                    tracing::info!(source = o.name, items = cached.len(), "using cached items");
                    o.items = cached.to_vec();
                    o.status = FetchStatus::Cached;
                }
            }
            FetchStatus::Cached => {}
        }
        raw.extend(o.items.iter().cloned());
    }
    raw
}

/// Providers, renderer and analysis settings. Stateless between cycles.
pub struct Pipeline {
    pub client: SourceClient,
    pub providers: Vec<Arc<dyn SourceProvider>>,
    pub renderer: Arc<dyn ForecastRenderer>,
    pub params: AnalyzeParams,
    pub min_feature_count: usize,
}

impl Pipeline {
    pub fn from_config(cfg: &ForecastConfig) -> Result<Self> {
        let client = SourceClient::new(&cfg.user_agent, cfg.github_token.clone())?;
        if !client.has_token() {
            tracing::warn!("no GitHub token configured; API requests are rate limited");
        }
        Ok(Self {
            client,
            providers: providers::from_config(cfg),
            renderer: Arc::new(HtmlRenderer),
            params: cfg.analyze_params(),
            min_feature_count: cfg.min_feature_count,
        })
    }

    /// Analyze and render. `Ok(None)` means no usable items.
    fn build(&self, raw: Vec<CandidateItem>, now: DateTime<Utc>) -> Result<Option<ForecastResult>> {
        let analysis = analyze(raw, &self.params);
        if analysis.unique_count == 0 {
            return Ok(None);
        }
        if analysis.unique_count < self.min_feature_count {
            tracing::warn!(
                unique = analysis.unique_count,
                min = self.min_feature_count,
                "degraded cycle: few unique features"
            );
        }

        let forecast = Forecast::from_analysis(analysis, now);
        let html = self
            .renderer
            .render(&forecast)
            .context("rendering forecast")?;
        Ok(Some(ForecastResult {
            state: ForecastState::Ok,
            rendered_html: html,
            feature_count: forecast.feature_count(),
            updated_at: now,
        }))
    }

    pub async fn run_cycle(&self, cache: &mut ForecastCache, now: DateTime<Utc>) -> CycleReport {
        ensure_metrics_described();
        let mut outcomes = gather(&self.providers, &self.client).await;
        let raw = merge_with_cache(&mut outcomes, cache);

        let (result, outcome) = match self.build(raw, now) {
            Ok(Some(r)) => {
                cache.store_success(&r);
                (r, CycleOutcome::Fresh)
            }
            Ok(None) => match cache.last_success() {
                Some(prev) => {
                    tracing::warn!("no usable items; keeping last successful forecast");
                    (prev.clone(), CycleOutcome::ReusedAfterNoData)
                }
                None => {
                    tracing::warn!("no usable items and nothing cached");
                    (ForecastResult::no_data(now), CycleOutcome::NoData)
                }
            },
            Err(e) => match cache.last_success() {
                Some(prev) => {
                    tracing::error!(
                        error = ?e,
                        "forecast build failed; keeping last successful forecast"
                    );
                    (prev.clone(), CycleOutcome::ReusedAfterError)
                }
                None => {
                    tracing::error!(error = ?e, "forecast build failed");
                    (ForecastResult::error(&format!("{e:#}"), now), CycleOutcome::Error)
                }
            },
        };

        counter!("forecast_cycles_total", "state" => result.state.as_str()).increment(1);
        gauge!("forecast_feature_count").set(result.feature_count as f64);

        let sources = outcomes
            .iter()
            .map(|o| SourceSummary {
                name: o.name,
                status: o.status,
                items: o.items.len(),
            })
            .collect();

        tracing::info!(
            state = %result.state,
            features = result.feature_count,
            ?outcome,
            "forecast cycle finished"
        );

        CycleReport {
            result,
            outcome,
            sources,
        }
    }
}

/// Single entrypoint for a refresh: pipeline plus the state it carries
/// between cycles.
pub struct Forecaster {
    pipeline: Pipeline,
    cache: ForecastCache,
    notifier: NotifierMux,
}

impl Forecaster {
    pub fn new(pipeline: Pipeline, notifier: NotifierMux) -> Self {
        Self {
            pipeline,
            cache: ForecastCache::new(),
            notifier,
        }
    }

    pub fn from_config(cfg: &ForecastConfig) -> Result<Self> {
        Ok(Self::new(
            Pipeline::from_config(cfg)?,
            NotifierMux::from_config(&cfg.notify),
        ))
    }

    pub async fn refresh(&mut self) -> ForecastResult {
        let now = Utc::now();
        let report = self.pipeline.run_cycle(&mut self.cache, now).await;
        self.notifier
            .dispatch(CycleEvent::from_report(&report, now))
            .await;
        report.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceKind;

    fn outcome(kind: SourceKind, status: FetchStatus, n: usize) -> SourceOutcome {
        SourceOutcome {
            kind,
            name: kind.display_name(),
            status,
            items: (0..n)
                .map(|i| CandidateItem::new(format!("{kind} {i}"), None, kind, 3, 3))
                .collect(),
        }
    }

    #[test]
    fn failed_source_is_patched_from_cache() {
        let mut cache = ForecastCache::new();
        let mut first = vec![outcome(SourceKind::Forum, FetchStatus::Fresh, 2)];
        assert_eq!(merge_with_cache(&mut first, &mut cache).len(), 2);

        let mut second = vec![
            outcome(SourceKind::Forum, FetchStatus::Failed, 0),
            outcome(SourceKind::Social, FetchStatus::Empty, 0),
        ];
        let raw = merge_with_cache(&mut second, &mut cache);
        assert_eq!(raw.len(), 2);
        assert_eq!(second[0].status, FetchStatus::Cached);
        assert_eq!(second[1].status, FetchStatus::Empty);
    }

    #[test]
    fn state_display_matches_host_strings() {
        assert_eq!(ForecastState::NoData.to_string(), "No Data");
        assert_eq!(ForecastState::Ok.to_string(), "OK");
        assert_eq!(
            serde_json::to_string(&ForecastState::NoData).unwrap(),
            "\"No Data\""
        );
    }
}
