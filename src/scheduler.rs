// src/scheduler.rs
//! Background refresh loop. One task owns the `Forecaster`, so cycles never
//! overlap; results are published through a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::{ForecastResult, Forecaster};

#[derive(Clone)]
pub struct SchedulerHandle {
    refresh_tx: mpsc::Sender<()>,
    latest_rx: watch::Receiver<ForecastResult>,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl SchedulerHandle {
    /// Queue a manual refresh. Returns false when one is already pending;
    /// requests made while a cycle runs collapse into a single follow-up cycle.
    pub fn request_refresh(&self) -> bool {
        match self.refresh_tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!("refresh already pending");
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!("scheduler stopped; refresh ignored");
                false
            }
        }
    }

    pub fn latest(&self) -> ForecastResult {
        self.latest_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ForecastResult> {
        self.latest_rx.clone()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Run a cycle immediately, then every `interval`, plus on manual request.
/// A manual cycle restarts the interval.
pub fn spawn_scheduler(
    mut forecaster: Forecaster,
    interval: Duration,
) -> (SchedulerHandle, JoinHandle<()>) {
    let (refresh_tx, mut refresh_rx) = mpsc::channel::<()>(1);
    let (latest_tx, latest_rx) = watch::channel(ForecastResult::initializing());
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = SchedulerHandle {
        refresh_tx,
        latest_rx,
        shutdown_tx: Arc::new(shutdown_tx),
    };

    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let manual = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => break,
                Some(()) = refresh_rx.recv() => true,
                _ = ticker.tick() => false,
            };
            tracing::debug!(manual, "refresh cycle starting");

            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    tracing::info!("shutdown during refresh; in-flight requests dropped");
                    break;
                }
                result = forecaster.refresh() => {
                    latest_tx.send_replace(result);
                }
            }

            if manual {
                ticker.reset();
            }
        }
        tracing::info!("scheduler stopped");
    });

    (handle, join)
}
