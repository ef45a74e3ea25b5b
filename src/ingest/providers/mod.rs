// src/ingest/providers/mod.rs
//! One fetcher per signal source. Each module keeps its payload structs and a
//! pure `parse_*` function next to the `SourceProvider` impl, so fixture tests
//! exercise exactly the code that runs against the live endpoint.

pub mod catalog;
pub mod discussions;
pub mod forum;
pub mod github_issues;
pub mod github_pulls;
pub mod release_blog;
pub mod social;

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::forecast::{ForecastConfig, SourceEndpoint};
use crate::ingest::types::SourceProvider;

/// What every provider needs from configuration.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub url: String,
    pub timeout: Duration,
    pub denylist: Arc<[String]>,
}

impl ProviderSettings {
    fn from_endpoint(ep: &SourceEndpoint, denylist: &Arc<[String]>) -> Self {
        Self {
            url: ep.url.clone(),
            timeout: Duration::from_secs(ep.timeout_secs.max(1)),
            denylist: Arc::clone(denylist),
        }
    }
}

/// GitHub label object (issues, pulls).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GhLabel {
    #[serde(default)]
    pub name: String,
}

pub(crate) fn label_names(labels: &[GhLabel]) -> Vec<String> {
    labels.iter().map(|l| l.name.to_ascii_lowercase()).collect()
}

/// Labels marking chores rather than features.
pub(crate) const MAINTENANCE_LABELS: &[&str] = &[
    "stale",
    "dependency",
    "dependencies",
    "code-quality",
    "maintenance",
    "bugfix",
    "wontfix",
    "duplicate",
    "invalid",
    "question",
];

pub(crate) fn has_maintenance_label(labels: &[String]) -> bool {
    labels.iter().any(|l| MAINTENANCE_LABELS.contains(&l.as_str()))
}

pub(crate) fn has_core_label(labels: &[String]) -> bool {
    labels.iter().any(|l| l == "core" || l.ends_with(": core"))
}

/// Enabled providers in a fixed order (official sources first).
pub fn from_config(cfg: &ForecastConfig) -> Vec<Arc<dyn SourceProvider>> {
    let dl: Arc<[String]> = cfg.title_denylist.clone().into();
    let s = &cfg.sources;
    let mut out: Vec<Arc<dyn SourceProvider>> = Vec::new();

    if s.release_blog.enabled {
        out.push(Arc::new(release_blog::ReleaseBlogProvider::new(
            ProviderSettings::from_endpoint(&s.release_blog, &dl),
        )));
    }
    if s.tracker_pr.enabled {
        out.push(Arc::new(github_pulls::PullRequestProvider::new(
            ProviderSettings::from_endpoint(&s.tracker_pr, &dl),
        )));
    }
    if s.discussion.enabled {
        out.push(Arc::new(discussions::DiscussionProvider::new(
            ProviderSettings::from_endpoint(&s.discussion, &dl),
        )));
    }
    if s.tracker_issue.enabled {
        out.push(Arc::new(github_issues::IssueProvider::new(
            ProviderSettings::from_endpoint(&s.tracker_issue, &dl),
        )));
    }
    if s.forum.enabled {
        out.push(Arc::new(forum::ForumProvider::new(
            ProviderSettings::from_endpoint(&s.forum, &dl),
        )));
    }
    if s.social.enabled {
        out.push(Arc::new(social::SocialProvider::new(
            ProviderSettings::from_endpoint(&s.social, &dl),
        )));
    }
    if s.catalog.enabled {
        out.push(Arc::new(catalog::CatalogProvider::new(
            ProviderSettings::from_endpoint(&s.catalog, &dl),
        )));
    }
    out
}
