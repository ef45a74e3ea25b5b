//! # Source Priority
//!
//! Tie-break weights used by the ranker when two candidates share the same
//! `importance * likelihood` product. Official channels outrank community
//! chatter:
//!
//! release blog > pull requests > discussions > issues > forum > social/catalog
//!
//! Weights can be overridden per source tag from configuration; unknown tags
//! are ignored with a warning.

use std::collections::HashMap;

use crate::ingest::types::SourceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePriority {
    weights: HashMap<SourceKind, u8>,
}

impl Default for SourcePriority {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl SourcePriority {
    /// Built-in table.
    pub fn default_seed() -> Self {
        let mut weights = HashMap::new();
        for (k, w) in [
            (SourceKind::ReleaseBlog, 6),
            (SourceKind::TrackerPr, 5),
            (SourceKind::Discussion, 4),
            (SourceKind::TrackerIssue, 3),
            (SourceKind::Forum, 2),
            (SourceKind::Social, 1),
            (SourceKind::Catalog, 1),
        ] {
            weights.insert(k, w);
        }
        Self { weights }
    }

    /// Seed table with overrides keyed by source tag (e.g. `"forum" = 5`).
    pub fn with_overrides(overrides: &HashMap<String, u8>) -> Self {
        let mut out = Self::default_seed();
        for (tag, &w) in overrides {
            match parse_tag(tag) {
                Some(kind) => {
                    out.weights.insert(kind, w);
                }
                None => tracing::warn!(tag = %tag, "unknown source tag in priority overrides"),
            }
        }
        out
    }

    pub fn weight_for(&self, kind: SourceKind) -> u8 {
        self.weights.get(&kind).copied().unwrap_or(0)
    }
}

/// Accepts the tag form (`tracker-pr`) and the snake form (`tracker_pr`), any case.
fn parse_tag(tag: &str) -> Option<SourceKind> {
    let t = tag.trim().to_ascii_lowercase().replace('_', "-");
    SourceKind::ALL.into_iter().find(|k| k.tag() == t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_matches_policy() {
        let p = SourcePriority::default_seed();
        assert!(p.weight_for(SourceKind::ReleaseBlog) > p.weight_for(SourceKind::TrackerPr));
        assert!(p.weight_for(SourceKind::TrackerPr) > p.weight_for(SourceKind::Discussion));
        assert!(p.weight_for(SourceKind::Discussion) > p.weight_for(SourceKind::TrackerIssue));
        assert!(p.weight_for(SourceKind::TrackerIssue) > p.weight_for(SourceKind::Forum));
        assert!(p.weight_for(SourceKind::Forum) > p.weight_for(SourceKind::Social));
    }

    #[test]
    fn overrides_accept_both_spellings() {
        let mut o = HashMap::new();
        o.insert("Tracker_Issue".to_string(), 9u8);
        o.insert("forum".to_string(), 7u8);
        o.insert("nonsense".to_string(), 1u8);
        let p = SourcePriority::with_overrides(&o);
        assert_eq!(p.weight_for(SourceKind::TrackerIssue), 9);
        assert_eq!(p.weight_for(SourceKind::Forum), 7);
        assert_eq!(p.weight_for(SourceKind::ReleaseBlog), 6);
    }
}
