// src/lib.rs
// Public library surface for the binary, integration tests and embedding hosts.

pub mod analyze;
pub mod cache;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod notify;
pub mod render;
pub mod scheduler;
pub mod source_weights;

// ---- Re-exports for stable public API ----
pub use crate::cache::ForecastCache;
pub use crate::config::ForecastConfig;
pub use crate::engine::{ForecastResult, ForecastState, Forecaster, Pipeline};
pub use crate::ingest::types::{CandidateItem, Level, SourceKind, SourceProvider};
pub use crate::scheduler::{spawn_scheduler, SchedulerHandle};
