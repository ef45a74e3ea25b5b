//! Title normalization and cross-source deduplication.
//!
//! Two candidates describe the same feature when their normalized keys are
//! equal. The key is built from the title: lower-case, punctuation turned into
//! whitespace, stop-words removed, remaining tokens sorted.
//!
//! On a collision the item with the higher `importance * likelihood` wins and
//! takes over the slot of the first occurrence; on a tie the first seen stays.

use std::collections::HashMap;

use crate::ingest::normalize_text;
use crate::ingest::types::CandidateItem;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "for", "from", "has", "have",
    "how", "i", "if", "in", "into", "is", "it", "its", "of", "on", "or", "our", "should", "so",
    "that", "the", "their", "this", "to", "via", "was", "we", "what", "when", "which", "will",
    "with", "would", "you", "your", "wip", "draft",
];

fn is_stop_word(tok: &str) -> bool {
    STOP_WORDS.contains(&tok)
}

/// Canonical dedup key for a title. Empty when nothing meaningful remains.
pub fn normalized_key(title: &str) -> String {
    let text = normalize_text(title).to_lowercase();
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|t| !is_stop_word(t))
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Merge near-identical candidates. Returns (unique, dropped_count).
pub fn dedup(items: Vec<CandidateItem>) -> (Vec<CandidateItem>, usize) {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<CandidateItem> = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for it in items {
        let key = normalized_key(&it.title);
        if key.is_empty() {
            tracing::debug!(title = %it.title, source = %it.source, "dropping item with empty key");
            dropped += 1;
            continue;
        }
        match slots.get(&key) {
            Some(&idx) => {
                dropped += 1;
                if it.score() > out[idx].score() {
                    out[idx] = it;
                }
            }
            None => {
                slots.insert(key, out.len());
                out.push(it);
            }
        }
    }

    (out, dropped)
}
