// src/ingest/providers/github_pulls.rs
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{has_core_label, has_maintenance_label, label_names, GhLabel, ProviderSettings};
use crate::ingest::http::{Auth, SourceClient};
use crate::ingest::types::{CandidateItem, Level, SourceKind, SourceProvider};
use crate::ingest::{is_denylisted, normalize_text};

const FEATURE_LABELS: &[&str] = &["new-feature", "new-integration"];

#[derive(Debug, Deserialize)]
struct Pull {
    #[serde(default)]
    title: String,
    html_url: Option<String>,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    labels: Vec<GhLabel>,
}

fn is_chore_title(title: &str) -> bool {
    let t = title.to_ascii_lowercase();
    t.starts_with("bump ") || t.starts_with("update dependency") || t.starts_with("[ci]")
}

pub fn parse_pulls(body: &str, denylist: &[String]) -> Result<Vec<CandidateItem>> {
    let pulls: Vec<Pull> = serde_json::from_str(body)?;
    let mut out = Vec::with_capacity(pulls.len());

    for pr in pulls {
        let title = normalize_text(&pr.title);
        if title.is_empty() || is_chore_title(&title) || is_denylisted(&title, denylist) {
            continue;
        }
        let labels = label_names(&pr.labels);
        if has_maintenance_label(&labels) {
            continue;
        }

        let importance = if labels.iter().any(|l| l == "breaking-change") {
            Level::new(5)
        } else if has_core_label(&labels)
            || labels.iter().any(|l| FEATURE_LABELS.contains(&l.as_str()))
        {
            Level::new(4)
        } else {
            Level::new(3)
        };
        let likelihood = if pr.draft { Level::new(3) } else { Level::new(4) };

        out.push(CandidateItem {
            title,
            url: pr.html_url,
            source: SourceKind::TrackerPr,
            importance,
            likelihood,
        });
    }
    Ok(out)
}

pub struct PullRequestProvider {
    settings: ProviderSettings,
}

impl PullRequestProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SourceProvider for PullRequestProvider {
    async fn fetch(&self, client: &SourceClient) -> Result<Vec<CandidateItem>> {
        let body = client
            .get_text(&self.settings.url, self.settings.timeout, Auth::Bearer)
            .await?;
        parse_pulls(&body, &self.settings.denylist)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::TrackerPr
    }

    fn name(&self) -> &'static str {
        "GitHub pull requests"
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}
