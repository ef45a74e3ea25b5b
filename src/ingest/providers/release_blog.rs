// src/ingest/providers/release_blog.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use super::ProviderSettings;
use crate::ingest::http::{Auth, SourceClient};
use crate::ingest::types::{CandidateItem, SourceKind, SourceProvider};
use crate::ingest::{is_denylisted, normalize_text};

/// Posts older than this describe shipped work, not upcoming work.
const MAX_POST_AGE_DAYS: i64 = 60;
const MAX_POSTS: usize = 10;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<i64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.unix_timestamp())
}

pub fn parse_feed(
    xml: &str,
    now: DateTime<Utc>,
    denylist: &[String],
) -> Result<Vec<CandidateItem>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing blog rss xml")?;
    let cutoff = (now - ChronoDuration::days(MAX_POST_AGE_DAYS)).timestamp();

    let mut out = Vec::new();
    for it in rss.channel.item {
        let title = normalize_text(it.title.as_deref().unwrap_or_default());
        if title.is_empty() || is_denylisted(&title, denylist) {
            continue;
        }
        // Undated posts are kept; feeds occasionally omit pubDate.
        if let Some(ts) = it.pub_date.as_deref().and_then(parse_rfc2822_to_unix) {
            if ts < cutoff {
                continue;
            }
        }
        // An official post about a feature means it is essentially decided.
        out.push(CandidateItem::new(
            title,
            it.link.map(|l| l.trim().to_string()),
            SourceKind::ReleaseBlog,
            4,
            5,
        ));
        if out.len() >= MAX_POSTS {
            break;
        }
    }
    Ok(out)
}

pub struct ReleaseBlogProvider {
    settings: ProviderSettings,
}

impl ReleaseBlogProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SourceProvider for ReleaseBlogProvider {
    async fn fetch(&self, client: &SourceClient) -> Result<Vec<CandidateItem>> {
        let body = client
            .get_text(&self.settings.url, self.settings.timeout, Auth::None)
            .await?;
        parse_feed(&body, Utc::now(), &self.settings.denylist)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::ReleaseBlog
    }

    fn name(&self) -> &'static str {
        "Release blog"
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
