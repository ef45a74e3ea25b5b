// src/config/mod.rs
pub mod forecast;

pub use forecast::{ForecastConfig, NotifyConfig, SourceEndpoint, SourcesConfig};
