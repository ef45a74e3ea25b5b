// src/analyze/buckets.rs
//! Proportional split of the ranked list into "Upcoming" and "Next".

use serde::Deserialize;

use crate::ingest::types::CandidateItem;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BucketLimits {
    pub upcoming_max: usize,
    pub next_max: usize,
    /// Lower bound of the split point.
    pub min_split: usize,
    /// Share of the ranked list that lands in "Upcoming".
    pub ratio: f64,
}

/// Hard ceilings for the two windows; configuration can only lower them.
pub const UPCOMING_CAP: usize = 10;
pub const NEXT_CAP: usize = 7;

impl Default for BucketLimits {
    fn default() -> Self {
        Self {
            upcoming_max: UPCOMING_CAP,
            next_max: NEXT_CAP,
            min_split: 6,
            ratio: 0.6,
        }
    }
}

impl BucketLimits {
    pub fn clamp_to_caps(&mut self) {
        self.upcoming_max = self.upcoming_max.min(UPCOMING_CAP);
        self.next_max = self.next_max.min(NEXT_CAP);
    }
}

/// Below this many upcoming items the forecast is considered thin.
pub const MIN_UPCOMING_WARN: usize = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    pub upcoming: Vec<CandidateItem>,
    pub next: Vec<CandidateItem>,
}

impl Buckets {
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.next.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn split_point(n: usize, limits: &BucketLimits) -> usize {
    let proportional = (limits.ratio.clamp(0.0, 1.0) * n as f64).floor() as usize;
    limits.min_split.max(proportional)
}

pub fn bucketize(ranked: &[CandidateItem], limits: &BucketLimits) -> Buckets {
    let n = ranked.len();
    let upcoming_end = limits
        .upcoming_max
        .min(UPCOMING_CAP)
        .min(split_point(n, limits))
        .min(n);
    let next_end = (upcoming_end + limits.next_max.min(NEXT_CAP)).min(n);

    let buckets = Buckets {
        upcoming: ranked[..upcoming_end].to_vec(),
        next: ranked[upcoming_end..next_end].to_vec(),
    };

    if buckets.upcoming.len() < MIN_UPCOMING_WARN {
        tracing::warn!(
            upcoming = buckets.upcoming.len(),
            total = n,
            "few upcoming features; rendering what is available"
        );
    }
    buckets
}
