// src/cache.rs
//! Process-lifetime fallback cache: last non-empty list per source and the
//! last successful forecast. Owned by whoever drives the cycles.

use std::collections::HashMap;

use crate::engine::ForecastResult;
use crate::ingest::types::{CandidateItem, SourceKind};

#[derive(Debug, Clone, Default)]
pub struct ForecastCache {
    per_source: HashMap<SourceKind, Vec<CandidateItem>>,
    last_success: Option<ForecastResult>,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_items(&self, kind: SourceKind) -> Option<&[CandidateItem]> {
        self.per_source.get(&kind).map(Vec::as_slice)
    }

    /// Empty lists never overwrite a previous good list.
    pub fn store_source(&mut self, kind: SourceKind, items: &[CandidateItem]) {
        if items.is_empty() {
            return;
        }
        self.per_source.insert(kind, items.to_vec());
    }

    pub fn last_success(&self) -> Option<&ForecastResult> {
        self.last_success.as_ref()
    }

    pub fn store_success(&mut self, result: &ForecastResult) {
        self.last_success = Some(result.clone());
    }
}
