// src/analyze/mod.rs
//! Analysis stages between ingest and rendering:
//! score filter → dedup → catalog split → rank → bucketize.

pub mod buckets;
pub mod dedup;
pub mod rank;
pub mod scoring;

use metrics::counter;

use crate::ingest::types::{CandidateItem, SourceKind};
use crate::source_weights::SourcePriority;

pub use crate::analyze::buckets::{bucketize, BucketLimits, Buckets};
pub use crate::analyze::dedup::{dedup, normalized_key};
pub use crate::analyze::rank::rank;
pub use crate::analyze::scoring::{filter_min_score, level_from_count};

/// Everything the renderer needs from one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub buckets: Buckets,
    /// Ranked catalog picks, already truncated.
    pub catalog: Vec<CandidateItem>,
    /// Unique items after dedup, before truncation.
    pub unique_count: usize,
}

impl Analysis {
    /// Items that end up on screen.
    pub fn feature_count(&self) -> usize {
        self.buckets.len() + self.catalog.len()
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzeParams {
    pub min_score: u32,
    pub limits: BucketLimits,
    pub catalog_max: usize,
    pub priority: SourcePriority,
}

impl Default for AnalyzeParams {
    fn default() -> Self {
        Self {
            min_score: 2,
            limits: BucketLimits::default(),
            catalog_max: 5,
            priority: SourcePriority::default_seed(),
        }
    }
}

/// Run the pure part of the pipeline over the raw candidates of one cycle.
pub fn analyze(raw: Vec<CandidateItem>, params: &AnalyzeParams) -> Analysis {
    let (scored, weak) = filter_min_score(raw, params.min_score);
    let (unique, dup) = dedup(scored);
    counter!("forecast_dedup_dropped_total").increment(dup as u64);
    tracing::debug!(weak, dup, unique = unique.len(), "candidates merged");

    let unique_count = unique.len();
    let (catalog, features): (Vec<_>, Vec<_>) = unique
        .into_iter()
        .partition(|it| it.source == SourceKind::Catalog);

    let ranked = rank(features, &params.priority);
    let buckets = bucketize(&ranked, &params.limits);

    let mut catalog = rank(catalog, &params.priority);
    catalog.truncate(params.catalog_max);

    Analysis {
        buckets,
        catalog,
        unique_count,
    }
}
