// src/ingest/providers/discussions.rs
//! Architecture discussions (ADR/RFC proposals) from the project's
//! architecture repository.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;

use super::{label_names, GhLabel, ProviderSettings};
use crate::analyze::scoring::{cap, level_from_count, COMMENT_THRESHOLDS};
use crate::ingest::http::{Auth, SourceClient};
use crate::ingest::types::{CandidateItem, Level, SourceKind, SourceProvider};
use crate::ingest::{is_denylisted, normalize_text};

static RE_ADR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(adr|rfc)\b").unwrap());

#[derive(Debug, Deserialize)]
struct Discussion {
    #[serde(default)]
    title: String,
    html_url: Option<String>,
    #[serde(default)]
    comments: u64,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    labels: Vec<GhLabel>,
}

fn is_adr(title: &str, labels: &[String]) -> bool {
    RE_ADR.is_match(title) || labels.iter().any(|l| l == "adr" || l == "rfc")
}

pub fn parse_discussions(body: &str, denylist: &[String]) -> Result<Vec<CandidateItem>> {
    let rows: Vec<Discussion> = serde_json::from_str(body)?;
    let mut out = Vec::with_capacity(rows.len());

    for d in rows {
        if d.state.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("closed")) {
            continue;
        }
        let title = normalize_text(&d.title);
        if title.is_empty() || is_denylisted(&title, denylist) {
            continue;
        }
        let labels = label_names(&d.labels);
        let by_comments = level_from_count(d.comments, &COMMENT_THRESHOLDS);

        let (importance, likelihood) = if is_adr(&title, &labels) {
            (Level::new(4), Level::new(3))
        } else {
            (by_comments, cap(by_comments, 3))
        };

        out.push(CandidateItem {
            title,
            url: d.html_url,
            source: SourceKind::Discussion,
            importance,
            likelihood,
        });
    }
    Ok(out)
}

pub struct DiscussionProvider {
    settings: ProviderSettings,
}

impl DiscussionProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SourceProvider for DiscussionProvider {
    async fn fetch(&self, client: &SourceClient) -> Result<Vec<CandidateItem>> {
        let body = client
            .get_text(&self.settings.url, self.settings.timeout, Auth::Bearer)
            .await?;
        parse_discussions(&body, &self.settings.denylist)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Discussion
    }

    fn name(&self) -> &'static str {
        "Architecture discussions"
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adr_marker_sets_fixed_levels() {
        let body = r#"[
            {"title":"ADR-0042: Entity naming","comments":1,"state":"open"},
            {"title":"Rethink config entries","comments":45,"state":"open"},
            {"title":"Closed idea","comments":99,"state":"closed"}
        ]"#;
        let out = parse_discussions(body, &[]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].importance.get(), out[0].likelihood.get()), (4, 3));
        assert_eq!((out[1].importance.get(), out[1].likelihood.get()), (4, 3));
    }

    #[test]
    fn adr_word_boundary() {
        assert!(is_adr("RFC: new thing", &[]));
        assert!(!is_adr("Cardreader support", &[]));
    }
}
