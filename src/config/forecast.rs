// src/config/forecast.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::analyze::{AnalyzeParams, BucketLimits};
use crate::ingest::http::DEFAULT_USER_AGENT;
use crate::source_weights::SourcePriority;

pub const ENV_CONFIG_PATH: &str = "FORECAST_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/forecast.toml";
pub const ENV_TOKEN: &str = "FORECAST_GITHUB_TOKEN";
pub const ENV_TOKEN_FALLBACK: &str = "GITHUB_TOKEN";
pub const ENV_REFRESH_SECS: &str = "FORECAST_REFRESH_SECS";
pub const ENV_SLACK_WEBHOOK: &str = "SLACK_WEBHOOK_URL";

const MIN_REFRESH_SECS: u64 = 60;

fn default_refresh_interval_secs() -> u64 {
    6 * 3600
}

fn default_denylist() -> Vec<String> {
    [
        "weekly thread",
        "community highlights",
        "release party",
        "show your setup",
        "share your",
        "what's your",
        "looking for help",
        "need help",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceEndpoint {
    pub enabled: bool,
    pub url: String,
    pub timeout_secs: u64,
}

impl SourceEndpoint {
    fn new(url: &str, timeout_secs: u64) -> Self {
        Self {
            enabled: true,
            url: url.to_string(),
            timeout_secs,
        }
    }
}

impl Default for SourceEndpoint {
    fn default() -> Self {
        Self {
            enabled: true,
            url: String::new(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    pub tracker_issue: SourceEndpoint,
    pub tracker_pr: SourceEndpoint,
    pub release_blog: SourceEndpoint,
    pub discussion: SourceEndpoint,
    pub forum: SourceEndpoint,
    pub social: SourceEndpoint,
    pub catalog: SourceEndpoint,
}

impl SourcesConfig {
    fn endpoints_mut(&mut self) -> [&mut SourceEndpoint; 7] {
        [
            &mut self.tracker_issue,
            &mut self.tracker_pr,
            &mut self.release_blog,
            &mut self.discussion,
            &mut self.forum,
            &mut self.social,
            &mut self.catalog,
        ]
    }

    /// A section that omits `url` keeps the built-in endpoint for that source.
    fn fill_missing_urls(&mut self) {
        let mut defaults = SourcesConfig::default();
        for (ep, def) in self.endpoints_mut().into_iter().zip(defaults.endpoints_mut()) {
            if ep.url.trim().is_empty() {
                ep.url = std::mem::take(&mut def.url);
            }
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            tracker_issue: SourceEndpoint::new(
                "https://api.github.com/repos/home-assistant/core/issues?state=open&sort=comments&direction=desc&per_page=50",
                20,
            ),
            tracker_pr: SourceEndpoint::new(
                "https://api.github.com/repos/home-assistant/core/pulls?state=open&sort=popularity&direction=desc&per_page=50",
                20,
            ),
            release_blog: SourceEndpoint::new(
                "https://www.home-assistant.io/blog/rss.xml",
                10,
            ),
            discussion: SourceEndpoint::new(
                "https://api.github.com/repos/home-assistant/architecture/issues?state=open&sort=updated&per_page=30",
                20,
            ),
            forum: SourceEndpoint::new(
                "https://community.home-assistant.io/c/feature-requests/13/l/top.json?period=monthly",
                15,
            ),
            social: SourceEndpoint::new(
                "https://www.reddit.com/r/homeassistant/.json?limit=25",
                10,
            ),
            catalog: SourceEndpoint::new(
                "https://api.github.com/search/repositories?q=topic:home-assistant-custom-component&sort=stars&order=desc&per_page=30",
                30,
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotifyConfig {
    pub slack_webhook_url: Option<String>,
    /// Minimum gap between two webhook posts for the same state.
    pub cooldown_secs: i64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            cooldown_secs: 24 * 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    pub refresh_interval_secs: u64,
    /// Bearer token for GitHub endpoints. `"ENV"` means read it from the environment.
    pub github_token: Option<String>,
    pub user_agent: String,
    /// Minimum `importance * likelihood` for a candidate to be considered.
    pub min_score: u32,
    /// Below this many unique items a cycle is logged as degraded.
    pub min_feature_count: usize,
    pub catalog_max: usize,
    pub buckets: BucketLimits,
    pub priority_overrides: HashMap<String, u8>,
    pub title_denylist: Vec<String>,
    pub sources: SourcesConfig,
    pub notify: NotifyConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            github_token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_score: 2,
            min_feature_count: 3,
            catalog_max: 5,
            buckets: BucketLimits::default(),
            priority_overrides: HashMap::new(),
            title_denylist: default_denylist(),
            sources: SourcesConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Parse and sanitize a TOML file. No environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading forecast config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing forecast config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: ForecastConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Resolution order:
    /// 1) $FORECAST_CONFIG_PATH (must exist)
    /// 2) config/forecast.toml
    /// 3) built-in defaults
    ///
    /// Environment overrides are applied on top in every case.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if p.exists() {
                Self::load_from(&p)?
            } else {
                let mut d = Self::default();
                d.sanitize();
                d
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) {
        let env_token = env::var(ENV_TOKEN)
            .or_else(|_| env::var(ENV_TOKEN_FALLBACK))
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let wants_env = self
            .github_token
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("env"));
        if wants_env {
            self.github_token = env_token;
        } else if env_token.is_some() {
            self.github_token = env_token;
        }

        if let Some(secs) = env::var(ENV_REFRESH_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.refresh_interval_secs = secs.max(MIN_REFRESH_SECS);
        }

        if let Ok(url) = env::var(ENV_SLACK_WEBHOOK) {
            if !url.trim().is_empty() {
                self.notify.slack_webhook_url = Some(url.trim().to_string());
            }
        }
    }

    fn sanitize(&mut self) {
        self.refresh_interval_secs = self.refresh_interval_secs.max(MIN_REFRESH_SECS);
        if !(0.0..=1.0).contains(&self.buckets.ratio) {
            self.buckets.ratio = BucketLimits::default().ratio;
        }
        self.buckets.clamp_to_caps();
        self.min_score = self.min_score.clamp(1, 25);
        self.title_denylist = clean_list(std::mem::take(&mut self.title_denylist));
        self.sources.fill_missing_urls();
        if self.user_agent.trim().is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        self.github_token = self
            .github_token
            .take()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self.notify.slack_webhook_url = self
            .notify
            .slack_webhook_url
            .take()
            .filter(|u| !u.trim().is_empty());
    }

    pub fn analyze_params(&self) -> AnalyzeParams {
        AnalyzeParams {
            min_score: self.min_score,
            limits: self.buckets,
            catalog_max: self.catalog_max,
            priority: SourcePriority::with_overrides(&self.priority_overrides),
        }
    }
}

/// Trim, lower-case, drop empties, dedup.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim().to_lowercase();
        if !t.is_empty() {
            set.insert(t);
        }
    }
    set.into_iter().collect()
}
