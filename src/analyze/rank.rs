// src/analyze/rank.rs
//! Total order over unique candidates: score desc, then source priority desc.
//! `sort_by` is stable, so exact ties keep their input order.

use std::cmp::Reverse;

use crate::ingest::types::CandidateItem;
use crate::source_weights::SourcePriority;

pub fn rank(mut items: Vec<CandidateItem>, priority: &SourcePriority) -> Vec<CandidateItem> {
    items.sort_by_key(|it| (Reverse(it.score()), Reverse(priority.weight_for(it.source))));
    items
}
