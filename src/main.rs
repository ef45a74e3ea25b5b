//! Feature forecast service: binary entrypoint.
//! Loads config, runs the refresh schedule, accepts `refresh` (or `r`) on stdin
//! and logs every published result until Ctrl-C.

use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feature_forecast::{spawn_scheduler, ForecastConfig, Forecaster};

/// Compact logs by default, JSON lines with FORECAST_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feature_forecast=info,warn"));

    let json = std::env::var("FORECAST_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = ForecastConfig::load_default()?;
    tracing::info!(
        refresh_secs = cfg.refresh_interval_secs,
        slack = cfg.notify.slack_webhook_url.is_some(),
        "configuration loaded"
    );

    let forecaster = Forecaster::from_config(&cfg)?;
    let (handle, join) =
        spawn_scheduler(forecaster, Duration::from_secs(cfg.refresh_interval_secs));

    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let r = updates.borrow_and_update().clone();
            tracing::info!(
                state = %r.state,
                features = r.feature_count,
                html_chars = r.rendered_html.len(),
                updated_at = %r.updated_at.to_rfc3339(),
                "forecast published"
            );
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("ctrl-c received");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(l)) => match l.trim() {
                    "refresh" | "r" => {
                        if handle.request_refresh() {
                            tracing::info!("manual refresh queued");
                        }
                    }
                    "" => {}
                    other => tracing::warn!(input = other, "unknown command; use `refresh`"),
                },
                // stdin closed: keep running on the timer until ctrl-c
                Ok(None) => {
                    let _ = tokio::signal::ctrl_c().await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = ?e, "stdin read failed");
                    let _ = tokio::signal::ctrl_c().await;
                    break;
                }
            },
        }
    }

    handle.shutdown();
    join.await?;
    printer.abort();
    Ok(())
}
