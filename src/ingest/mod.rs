// src/ingest/mod.rs
pub mod http;
pub mod providers;
pub mod types;

use crate::ingest::http::SourceClient;
use crate::ingest::types::{CandidateItem, SourceKind, SourceProvider};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Instant;

/// One-time metrics registration (so series show up in any installed exporter).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "forecast_items_fetched_total",
            "Candidate items returned by source fetchers."
        );
        describe_counter!(
            "forecast_source_errors_total",
            "Source fetch failures (network, status, parse, timeout)."
        );
        describe_counter!(
            "forecast_dedup_dropped_total",
            "Candidates merged away by title deduplication."
        );
        describe_counter!("forecast_cycles_total", "Completed refresh cycles.");
        describe_gauge!(
            "forecast_feature_count",
            "Features rendered by the last refresh cycle."
        );
        describe_histogram!("forecast_fetch_ms", "Per-source fetch time in milliseconds.");
    });
}

/// Normalize display text: decode entities, strip tags, fold quotes and whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Typographic quotes to ASCII
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (incl. nbsp)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"[\s\u{00A0}]+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Titles longer than this are noise, not features
    if out.chars().count() > 300 {
        out = out.chars().take(300).collect();
    }

    out
}

/// Case-insensitive substring match against generic/meta title phrases.
pub fn is_denylisted(title: &str, denylist: &[String]) -> bool {
    let t = title.to_lowercase();
    denylist
        .iter()
        .any(|d| !d.is_empty() && t.contains(&d.to_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Live data from this cycle.
    Fresh,
    /// Fetch succeeded but had nothing usable.
    Empty,
    /// Network, status, parse error or timeout.
    Failed,
    /// Empty or failed, replaced by the last cached list.
    Cached,
}

#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub kind: SourceKind,
    pub name: &'static str,
    pub status: FetchStatus,
    pub items: Vec<CandidateItem>,
}

async fn fetch_one(provider: &dyn SourceProvider, client: &SourceClient) -> SourceOutcome {
    let t0 = Instant::now();
    let name = provider.name();
    let kind = provider.kind();

    let res = tokio::time::timeout(provider.timeout(), provider.fetch(client)).await;
    histogram!("forecast_fetch_ms", "source" => kind.tag())
        .record(t0.elapsed().as_secs_f64() * 1_000.0);

    let (status, items) = match res {
        Ok(Ok(items)) if items.is_empty() => {
            tracing::debug!(source = name, "source returned no items");
            (FetchStatus::Empty, items)
        }
        Ok(Ok(items)) => {
            counter!("forecast_items_fetched_total", "source" => kind.tag())
                .increment(items.len() as u64);
            tracing::debug!(source = name, items = items.len(), "source fetched");
            (FetchStatus::Fresh, items)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = ?e, source = name, "source fetch failed");
            counter!("forecast_source_errors_total", "source" => kind.tag()).increment(1);
            (FetchStatus::Failed, Vec::new())
        }
        Err(_) => {
            tracing::warn!(
                source = name,
                timeout_secs = provider.timeout().as_secs(),
                "source fetch timed out"
            );
            counter!("forecast_source_errors_total", "source" => kind.tag()).increment(1);
            (FetchStatus::Failed, Vec::new())
        }
    };

    SourceOutcome {
        kind,
        name,
        status,
        items,
    }
}

/// Fetch every provider concurrently. One failure never cancels the others;
/// outcomes come back in provider order.
pub async fn gather(
    providers: &[Arc<dyn SourceProvider>],
    client: &SourceClient,
) -> Vec<SourceOutcome> {
    ensure_metrics_described();
    let futs = providers.iter().map(|p| fetch_one(p.as_ref(), client));
    futures::future::join_all(futs).await
}
