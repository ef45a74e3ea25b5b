// src/ingest/providers/forum.rs
//! Community forum feature requests (Discourse `top.json`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use super::ProviderSettings;
use crate::analyze::scoring::{bump, level_from_count, LIKE_THRESHOLDS};
use crate::ingest::http::{Auth, SourceClient};
use crate::ingest::types::{CandidateItem, Level, SourceKind, SourceProvider};
use crate::ingest::{is_denylisted, normalize_text};

const HIGH_VIEW_COUNT: u64 = 10_000;

#[derive(Debug, Deserialize)]
struct TopResponse {
    topic_list: TopicList,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    #[serde(default)]
    topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    pinned: bool,
    #[serde(default)]
    closed: bool,
}

/// `https://forum.test/c/feature-requests/13/l/top.json` → `https://forum.test`
fn site_origin(endpoint: &str) -> Option<String> {
    let u = Url::parse(endpoint).ok()?;
    Some(u.origin().ascii_serialization())
}

pub fn parse_topics(body: &str, endpoint: &str, denylist: &[String]) -> Result<Vec<CandidateItem>> {
    let resp: TopResponse = serde_json::from_str(body).context("parsing forum top.json")?;
    let origin = site_origin(endpoint);
    let mut out = Vec::with_capacity(resp.topic_list.topics.len());

    for t in resp.topic_list.topics {
        if t.pinned || t.closed {
            continue;
        }
        let title = normalize_text(&t.title);
        if title.is_empty() || is_denylisted(&title, denylist) {
            continue;
        }
        let mut importance = level_from_count(t.like_count, &LIKE_THRESHOLDS);
        if t.views >= HIGH_VIEW_COUNT {
            importance = bump(importance, 1);
        }
        let url = origin
            .as_ref()
            .map(|o| format!("{o}/t/{}/{}", t.slug, t.id));

        // Forum votes rarely land directly; likelihood stays speculative.
        out.push(CandidateItem {
            title,
            url,
            source: SourceKind::Forum,
            importance,
            likelihood: Level::MIN,
        });
    }
    Ok(out)
}

pub struct ForumProvider {
    settings: ProviderSettings,
}

impl ForumProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SourceProvider for ForumProvider {
    async fn fetch(&self, client: &SourceClient) -> Result<Vec<CandidateItem>> {
        let body = client
            .get_text(&self.settings.url, self.settings.timeout, Auth::None)
            .await?;
        parse_topics(&body, &self.settings.url, &self.settings.denylist)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Forum
    }

    fn name(&self) -> &'static str {
        "Community forum"
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_topic_urls_from_endpoint_origin() {
        let body = r#"{"topic_list":{"topics":[
            {"id":7,"title":"About this category","slug":"about","pinned":true},
            {"id":42,"title":"Native Zigbee groups","slug":"native-zigbee-groups",
             "like_count":70,"views":12000}
        ]}}"#;
        let out = parse_topics(body, "https://forum.test/c/fr/13/l/top.json?period=monthly", &[])
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url.as_deref(), Some("https://forum.test/t/native-zigbee-groups/42"));
        assert_eq!(out[0].importance.get(), 5);
        assert_eq!(out[0].likelihood.get(), 1);
    }
}
