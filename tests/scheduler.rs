// tests/scheduler.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use feature_forecast::analyze::AnalyzeParams;
use feature_forecast::ingest::http::{SourceClient, DEFAULT_USER_AGENT};
use feature_forecast::notify::NotifierMux;
use feature_forecast::render::HtmlRenderer;
use feature_forecast::{
    spawn_scheduler, CandidateItem, ForecastState, Forecaster, Pipeline, SourceKind,
    SourceProvider,
};
use tokio::sync::Semaphore;

/// Blocks every fetch until a permit is released.
struct Gated {
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
}

#[async_trait::async_trait]
impl SourceProvider for Gated {
    async fn fetch(&self, _c: &SourceClient) -> anyhow::Result<Vec<CandidateItem>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.gate.acquire().await?.forget();
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(vec![CandidateItem::new("Area cards", None, SourceKind::TrackerPr, 4, 4)])
    }
    fn kind(&self) -> SourceKind {
        SourceKind::TrackerPr
    }
    fn name(&self) -> &'static str {
        "gated"
    }
    fn timeout(&self) -> Duration {
        Duration::from_secs(600)
    }
}

async fn wait_until(counter: &AtomicUsize, n: usize) {
    while counter.load(Ordering::SeqCst) < n {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn manual_requests_during_a_cycle_coalesce() {
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Semaphore::new(0));

    let provider: Arc<dyn SourceProvider> = Arc::new(Gated {
        started: started.clone(),
        finished: finished.clone(),
        gate: gate.clone(),
    });
    let pipeline = Pipeline {
        client: SourceClient::new(DEFAULT_USER_AGENT, None).unwrap(),
        providers: vec![provider],
        renderer: Arc::new(HtmlRenderer),
        params: AnalyzeParams::default(),
        min_feature_count: 1,
    };
    let forecaster = Forecaster::new(pipeline, NotifierMux::new(vec![], 0));
    let (handle, join) = spawn_scheduler(forecaster, Duration::from_secs(3600));

    assert_eq!(handle.latest().state, ForecastState::Initializing);

    // first (timer) cycle is in flight
    wait_until(&started, 1).await;
    assert!(handle.request_refresh());
    assert!(!handle.request_refresh());
    assert!(!handle.request_refresh());

    gate.add_permits(10);
    wait_until(&finished, 2).await;

    let mut rx = handle.subscribe();
    rx.wait_for(|r| r.state == ForecastState::Ok).await.unwrap();

    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(started.load(Ordering::SeqCst), 2, "three requests, one extra cycle");

    handle.shutdown();
    join.await.unwrap();
    assert_eq!(started.load(Ordering::SeqCst), 2);
}
