// src/ingest/providers/social.rs
//! Subreddit listing (`/r/<name>/.json`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::ProviderSettings;
use crate::analyze::scoring::{level_from_count, UPVOTE_THRESHOLDS};
use crate::ingest::http::{Auth, SourceClient};
use crate::ingest::types::{CandidateItem, Level, SourceKind, SourceProvider};
use crate::ingest::{is_denylisted, normalize_text};

const REDDIT_ORIGIN: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    permalink: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    stickied: bool,
}

pub fn parse_listing(body: &str, denylist: &[String]) -> Result<Vec<CandidateItem>> {
    let listing: Listing = serde_json::from_str(body).context("parsing reddit listing")?;
    let mut out = Vec::with_capacity(listing.data.children.len());

    for Child { data: p } in listing.data.children {
        if p.stickied {
            continue;
        }
        let title = normalize_text(&p.title);
        if title.is_empty() || is_denylisted(&title, denylist) {
            continue;
        }
        let importance = level_from_count(p.score.max(0) as u64, &UPVOTE_THRESHOLDS);
        let url = p.permalink.map(|pl| format!("{REDDIT_ORIGIN}{pl}"));
        out.push(CandidateItem {
            title,
            url,
            source: SourceKind::Social,
            importance,
            likelihood: Level::MIN,
        });
    }
    Ok(out)
}

pub struct SocialProvider {
    settings: ProviderSettings,
}

impl SocialProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SourceProvider for SocialProvider {
    async fn fetch(&self, client: &SourceClient) -> Result<Vec<CandidateItem>> {
        let body = client
            .get_text(&self.settings.url, self.settings.timeout, Auth::None)
            .await?;
        parse_listing(&body, &self.settings.denylist)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }

    fn name(&self) -> &'static str {
        "Reddit"
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}
