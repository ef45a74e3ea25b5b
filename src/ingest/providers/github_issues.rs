// src/ingest/providers/github_issues.rs
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{has_core_label, has_maintenance_label, label_names, GhLabel, ProviderSettings};
use crate::analyze::scoring::{bump, level_from_count, REACTION_THRESHOLDS};
use crate::ingest::http::{Auth, SourceClient};
use crate::ingest::types::{CandidateItem, Level, SourceKind, SourceProvider};
use crate::ingest::{is_denylisted, normalize_text};

/// Reactions + comments needed before an issue counts as a signal.
const MIN_ENGAGEMENT: u64 = 3;

const ACTIVE_LABELS: &[&str] = &["in progress", "in-progress", "active", "accepted", "has-pr"];

#[derive(Debug, Deserialize)]
struct Issue {
    #[serde(default)]
    title: String,
    html_url: Option<String>,
    #[serde(default)]
    comments: u64,
    #[serde(default)]
    labels: Vec<GhLabel>,
    milestone: Option<serde_json::Value>,
    reactions: Option<Reactions>,
    /// Present when the "issue" is really a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Reactions {
    #[serde(default)]
    total_count: u64,
}

pub fn parse_issues(body: &str, denylist: &[String]) -> Result<Vec<CandidateItem>> {
    let issues: Vec<Issue> = serde_json::from_str(body)?;
    let mut out = Vec::with_capacity(issues.len());

    for it in issues {
        if it.pull_request.is_some() {
            continue;
        }
        let title = normalize_text(&it.title);
        if title.is_empty() || is_denylisted(&title, denylist) {
            continue;
        }
        let labels = label_names(&it.labels);
        if has_maintenance_label(&labels) {
            continue;
        }
        let reactions = it.reactions.as_ref().map_or(0, |r| r.total_count);
        if reactions + it.comments < MIN_ENGAGEMENT {
            continue;
        }

        let mut importance = level_from_count(reactions, &REACTION_THRESHOLDS);
        if has_core_label(&labels) {
            importance = bump(importance, 1);
        }

        let has_milestone = it.milestone.as_ref().is_some_and(|m| !m.is_null());
        let likelihood = if has_milestone {
            Level::new(4)
        } else if labels.iter().any(|l| ACTIVE_LABELS.contains(&l.as_str())) {
            Level::new(3)
        } else {
            Level::new(2)
        };

        out.push(CandidateItem {
            title,
            url: it.html_url,
            source: SourceKind::TrackerIssue,
            importance,
            likelihood,
        });
    }
    Ok(out)
}

pub struct IssueProvider {
    settings: ProviderSettings,
}

impl IssueProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SourceProvider for IssueProvider {
    async fn fetch(&self, client: &SourceClient) -> Result<Vec<CandidateItem>> {
        let body = client
            .get_text(&self.settings.url, self.settings.timeout, Auth::Bearer)
            .await?;
        parse_issues(&body, &self.settings.denylist)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::TrackerIssue
    }

    fn name(&self) -> &'static str {
        "GitHub issues"
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}
