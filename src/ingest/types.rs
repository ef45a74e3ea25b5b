// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::ingest::http::SourceClient;

/// Which fetcher produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    TrackerIssue,
    TrackerPr,
    ReleaseBlog,
    Discussion,
    Forum,
    Social,
    Catalog,
}

impl SourceKind {
    pub const ALL: [SourceKind; 7] = [
        SourceKind::TrackerIssue,
        SourceKind::TrackerPr,
        SourceKind::ReleaseBlog,
        SourceKind::Discussion,
        SourceKind::Forum,
        SourceKind::Social,
        SourceKind::Catalog,
    ];

    /// Stable machine tag, also used as metric label.
    pub fn tag(self) -> &'static str {
        match self {
            SourceKind::TrackerIssue => "tracker-issue",
            SourceKind::TrackerPr => "tracker-pr",
            SourceKind::ReleaseBlog => "release-blog",
            SourceKind::Discussion => "discussion",
            SourceKind::Forum => "forum",
            SourceKind::Social => "social",
            SourceKind::Catalog => "catalog",
        }
    }

    /// Badge text shown next to an item.
    pub fn display_name(self) -> &'static str {
        match self {
            SourceKind::TrackerIssue => "GitHub issue",
            SourceKind::TrackerPr => "GitHub PR",
            SourceKind::ReleaseBlog => "Release blog",
            SourceKind::Discussion => "Architecture discussion",
            SourceKind::Forum => "Community forum",
            SourceKind::Social => "Reddit",
            SourceKind::Catalog => "Community catalog",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A 1..=5 level. Construction always clamps, so a `Level` is never out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(5);

    pub fn new(raw: i64) -> Self {
        Level(raw.clamp(1, 5) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for Level {
    fn from(v: u8) -> Self {
        Level::new(i64::from(v))
    }
}

impl From<Level> for u8 {
    fn from(l: Level) -> Self {
        l.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateItem {
    pub title: String,
    pub url: Option<String>,
    pub source: SourceKind,
    pub importance: Level,
    pub likelihood: Level,
}

impl CandidateItem {
    pub fn new(
        title: impl Into<String>,
        url: Option<String>,
        source: SourceKind,
        importance: i64,
        likelihood: i64,
    ) -> Self {
        Self {
            title: title.into(),
            url,
            source,
            importance: Level::new(importance),
            likelihood: Level::new(likelihood),
        }
    }

    /// `importance * likelihood`, 1..=25.
    pub fn score(&self) -> u32 {
        u32::from(self.importance.get()) * u32::from(self.likelihood.get())
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch(&self, client: &SourceClient) -> Result<Vec<CandidateItem>>;
    fn kind(&self) -> SourceKind;
    fn name(&self) -> &'static str;

    fn timeout(&self) -> Duration {
        Duration::from_secs(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_clamps_into_range() {
        assert_eq!(Level::new(-3).get(), 1);
        assert_eq!(Level::new(0).get(), 1);
        assert_eq!(Level::new(3).get(), 3);
        assert_eq!(Level::new(99).get(), 5);
        assert_eq!(Level::from(7u8), Level::MAX);
    }

    #[test]
    fn score_is_product() {
        let it = CandidateItem::new("x", None, SourceKind::Forum, 4, 3);
        assert_eq!(it.score(), 12);
    }

    #[test]
    fn level_deserializes_clamped() {
        let l: Level = serde_json::from_str("9").unwrap();
        assert_eq!(l, Level::MAX);
    }

    #[test]
    fn source_kind_serializes_as_its_tag() {
        for kind in SourceKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.tag()));
            let back: SourceKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }
}
