//! Level derivation helpers shared by the source fetchers.
//!
//! Engagement counts (reactions, likes, stars, comments) map onto the 1..=5
//! scale through ascending threshold tables: a count below the first
//! threshold is level 1, each threshold reached adds one level.

use crate::ingest::types::{CandidateItem, Level};

pub const REACTION_THRESHOLDS: [u64; 4] = [5, 15, 40, 100];
pub const COMMENT_THRESHOLDS: [u64; 4] = [5, 15, 40, 80];
pub const LIKE_THRESHOLDS: [u64; 4] = [10, 25, 60, 150];
pub const UPVOTE_THRESHOLDS: [u64; 4] = [50, 150, 400, 1000];
pub const STAR_THRESHOLDS: [u64; 4] = [50, 200, 500, 1500];

/// Map a count onto 1..=5 given four ascending thresholds.
pub fn level_from_count(count: u64, thresholds: &[u64; 4]) -> Level {
    let reached = thresholds.iter().filter(|&&t| count >= t).count();
    Level::new(1 + reached as i64)
}

/// Raise a level by `by` steps, saturating at 5.
pub fn bump(level: Level, by: u8) -> Level {
    Level::new(i64::from(level.get()) + i64::from(by))
}

/// Cap a level at `max`.
pub fn cap(level: Level, max: u8) -> Level {
    Level::new(i64::from(level.get().min(max)))
}

pub fn passes_min_score(item: &CandidateItem, min_score: u32) -> bool {
    item.score() >= min_score
}

/// Drop items below the combined threshold. Returns (kept, dropped_count).
pub fn filter_min_score(items: Vec<CandidateItem>, min_score: u32) -> (Vec<CandidateItem>, usize) {
    let before = items.len();
    let kept: Vec<_> = items
        .into_iter()
        .filter(|it| passes_min_score(it, min_score))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
