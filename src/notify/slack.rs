use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::{CycleEvent, Notifier};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }
}

pub fn format_message(ev: &CycleEvent) -> String {
    let mut text = format!(
        "*Feature forecast:* *{}* ({} features)",
        ev.state, ev.feature_count
    );
    if let Some(prev) = ev.previous_state {
        text.push_str(&format!(", was {prev}"));
    }
    if !ev.failed_sources.is_empty() {
        text.push_str(&format!("\nFailed sources: {}", ev.failed_sources.join(", ")));
    }
    if !ev.cached_sources.is_empty() {
        text.push_str(&format!("\nFrom cache: {}", ev.cached_sources.join(", ")));
    }
    text.push_str(&format!("\n@ {}", ev.at.to_rfc3339()));
    text
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, ev: &CycleEvent) -> Result<()> {
        let body = serde_json::json!({ "text": format_message(ev) });

        self.client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }
}
