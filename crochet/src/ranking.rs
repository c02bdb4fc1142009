//! Tier classification for product search.
//!
//! A product name falls into exactly one `MatchTier` for a given query.
//! Tiers compare by their derived `Ord`, so sorting by tier puts exact matches
//! first, then prefixes, then inner substrings, then everything else.

pub use crate::interface::MatchTier;

/// Classify an already-lowercased name against an already-normalized query.
///
/// An empty query matches every name as a prefix; callers short-circuit the
/// empty query before ranking.
pub fn classify(name_lower: &str, query: &str) -> MatchTier {
    if name_lower == query {
        MatchTier::Exact
    } else if name_lower.starts_with(query) {
        MatchTier::Prefix
    } else if name_lower.contains(query) {
        MatchTier::Substring
    } else {
        MatchTier::NoMatch
    }
}

impl MatchTier {
    /// Whether the name contains the query at all
    pub fn is_match(self) -> bool {
        self != MatchTier::NoMatch
    }
}
