// src/ingest/providers/catalog.rs
//! Third-party add-on catalog: GitHub repository search by topic.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::time::Duration;

use super::ProviderSettings;
use crate::analyze::scoring::{bump, level_from_count, STAR_THRESHOLDS};
use crate::ingest::http::{Auth, SourceClient};
use crate::ingest::types::{CandidateItem, Level, SourceKind, SourceProvider};
use crate::ingest::{is_denylisted, normalize_text};

const RECENT_DAYS: i64 = 90;
const MAX_DESCRIPTION_CHARS: usize = 120;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    #[serde(default)]
    name: String,
    description: Option<String>,
    html_url: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    created_at: Option<DateTime<Utc>>,
    pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    archived: bool,
}

fn repo_title(name: &str, description: Option<&str>) -> String {
    let name = normalize_text(name);
    let desc = description.map(normalize_text).unwrap_or_default();
    if desc.is_empty() {
        return name;
    }
    let desc: String = desc.chars().take(MAX_DESCRIPTION_CHARS).collect();
    format!("{name}: {desc}")
}

pub fn parse_search(
    body: &str,
    now: DateTime<Utc>,
    denylist: &[String],
) -> Result<Vec<CandidateItem>> {
    let resp: SearchResponse = serde_json::from_str(body).context("parsing repository search")?;
    let recent_cutoff = now - ChronoDuration::days(RECENT_DAYS);
    let mut out = Vec::with_capacity(resp.items.len());

    for r in resp.items {
        if r.archived {
            continue;
        }
        let title = repo_title(&r.name, r.description.as_deref());
        if title.is_empty() || is_denylisted(&title, denylist) {
            continue;
        }
        let recent = [r.created_at, r.pushed_at]
            .into_iter()
            .flatten()
            .any(|ts| ts >= recent_cutoff);

        let mut importance = level_from_count(r.stargazers_count, &STAR_THRESHOLDS);
        if recent {
            importance = bump(importance, 1);
        }
        out.push(CandidateItem {
            title,
            url: r.html_url,
            source: SourceKind::Catalog,
            importance,
            likelihood: Level::MIN,
        });
    }
    Ok(out)
}

pub struct CatalogProvider {
    settings: ProviderSettings,
}

impl CatalogProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SourceProvider for CatalogProvider {
    async fn fetch(&self, client: &SourceClient) -> Result<Vec<CandidateItem>> {
        let body = client
            .get_text(&self.settings.url, self.settings.timeout, Auth::Bearer)
            .await?;
        parse_search(&body, Utc::now(), &self.settings.denylist)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Catalog
    }

    fn name(&self) -> &'static str {
        "Community catalog"
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}
