//! Product search: rank, don't filter.
//!
//! Typing a query never hides products. Names containing the query move to the
//! top, ordered exact > prefix > inner substring, and everything else keeps its
//! catalog order below them. Every step is stable, so products that tie keep
//! the order the catalog returned them in.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::catalog::Catalog;
use crate::interface::{Product, RankedProduct};
use crate::observable::{Observable, SubscriptionId};
use crate::ranking::{classify, MatchTier};

/// Trim and lowercase a raw query. An empty result means "no filter".
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Rank any items by a name accessor. See `rank` for the ordering contract.
pub fn rank_by<T, F>(items: &[T], query: &str, name: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    tiered(items, query, name)
        .into_iter()
        .map(|(_, item)| item.clone())
        .collect()
}

/// Rank products against a raw query.
///
/// - Empty or whitespace-only query: the input, unchanged.
/// - Otherwise: exact matches, then prefix matches, then inner substring
///   matches, then non-matches; original relative order within each group.
///
/// Matching is case-insensitive; returned products keep their original names.
pub fn rank(reference: &[Product], query: &str) -> Vec<Product> {
    #[cfg(feature = "perf-log")]
    let t0 = std::time::Instant::now();

    let ranked = rank_by(reference, query, |p| p.name.as_str());

    #[cfg(feature = "perf-log")]
    tracing::debug!(
        products = reference.len(),
        elapsed_us = t0.elapsed().as_micros() as u64,
        "[perf] rank"
    );

    ranked
}

/// Same order as `rank`, with each product's tier attached.
/// With an empty query every product is reported as `NoMatch`.
pub fn rank_with_tiers(reference: &[Product], query: &str) -> Vec<RankedProduct> {
    tiered(reference, query, |p| p.name.as_str())
        .into_iter()
        .map(|(tier, product)| RankedProduct {
            product: product.clone(),
            tier,
        })
        .collect()
}

fn tiered<'a, T, F>(items: &'a [T], query: &str, name: F) -> Vec<(MatchTier, &'a T)>
where
    F: Fn(&T) -> &str,
{
    let query = normalize_query(query);
    if query.is_empty() {
        return items.iter().map(|item| (MatchTier::NoMatch, item)).collect();
    }

    let mut keyed: Vec<(MatchTier, &T)> = items
        .iter()
        .map(|item| (classify(&name(item).to_lowercase(), &query), item))
        .collect();
    // sort_by_key is stable: equal tiers keep catalog order
    keyed.sort_by_key(|(tier, _)| *tier);
    keyed
}

/// The home screen's search state: the current query and the ranked catalog.
///
/// Re-ranks when the query changes and when the catalog commits a new load,
/// notifying display subscribers each time. Query changes and commits may
/// arrive on different threads; the display always ends up ranking the
/// current catalog by the current query.
pub struct SearchSession {
    catalog: Arc<Catalog>,
    query: RwLock<String>,
    /// Serializes "read catalog and query, rank, store display". Not held
    /// while listeners run.
    rerank: Mutex<()>,
    display: Observable<Vec<Product>>,
    catalog_subscription: SubscriptionId,
}

impl SearchSession {
    pub fn new(catalog: Arc<Catalog>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<SearchSession>| {
            let weak = weak.clone();
            let catalog_subscription = catalog.subscribe(move |_products| {
                if let Some(session) = weak.upgrade() {
                    session.refresh();
                }
            });
            let initial = catalog.products().as_ref().clone();
            Self {
                catalog,
                query: RwLock::new(String::new()),
                rerank: Mutex::new(()),
                display: Observable::new(initial),
                catalog_subscription,
            }
        })
    }

    /// Store the raw query and return the freshly ranked catalog
    pub fn set_query(&self, query: String) -> Vec<Product> {
        let ranked = {
            let _rerank = self.rerank.lock();
            let ranked = rank(&self.catalog.products(), &query);
            *self.query.write() = query;
            self.display.replace(ranked.clone());
            ranked
        };
        self.display.notify_current();
        ranked
    }

    pub fn query(&self) -> String {
        self.query.read().clone()
    }

    pub fn display_sequence(&self) -> Vec<Product> {
        self.display.get()
    }

    pub fn ranked_with_tiers(&self) -> Vec<RankedProduct> {
        rank_with_tiers(&self.catalog.products(), &self.query())
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Vec<Product>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.display.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.display.unsubscribe(id)
    }

    /// Re-rank the latest committed catalog with the stored query
    fn refresh(&self) {
        {
            let _rerank = self.rerank.lock();
            let query = self.query();
            self.display.replace(rank(&self.catalog.products(), &query));
        }
        self.display.notify_current();
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.catalog.unsubscribe(self.catalog_subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{CrochetError, ProductSource};

    struct NoSource;

    #[async_trait::async_trait]
    impl ProductSource for NoSource {
        async fn fetch_all(&self) -> Result<Vec<Product>, CrochetError> {
            Ok(Vec::new())
        }

        async fn save(&self, _product: Product) -> Result<(), CrochetError> {
            Ok(())
        }
    }

    fn products(names: &[&str]) -> Vec<Product> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Product {
                id: format!("p{}", i),
                name: name.to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Baby HAT \t"), "baby hat");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn test_exact_then_substring() {
        let r = products(&["Red Hat", "Hat", "Blue Hat", "hat"]);
        assert_eq!(names(&rank(&r, "hat")), vec!["Hat", "hat", "Red Hat", "Blue Hat"]);
    }

    #[test]
    fn test_prefix_keeps_catalog_order() {
        let r = products(&["Scarf", "Scarlet Bag"]);
        assert_eq!(names(&rank(&r, "scar")), vec!["Scarf", "Scarlet Bag"]);
    }

    #[test]
    fn test_no_match_is_identity() {
        let r = products(&["Bag", "Hat"]);
        assert_eq!(rank(&r, "xyz"), r);
    }

    #[test]
    fn test_empty_reference() {
        assert!(rank(&[], "anything").is_empty());
    }

    #[test]
    fn test_whitespace_query_is_identity() {
        let r = products(&["Baby Hat"]);
        assert_eq!(rank(&r, "  "), r);
    }

    #[test]
    fn test_non_matches_sink_but_stay() {
        let r = products(&["Bag", "Amigurumi Bear", "Bear Hat", "Coaster"]);
        assert_eq!(
            names(&rank(&r, "bear")),
            vec!["Bear Hat", "Amigurumi Bear", "Bag", "Coaster"]
        );
    }

    #[test]
    fn test_query_is_trimmed_before_matching() {
        let r = products(&["Tote", "Hat"]);
        assert_eq!(names(&rank(&r, "  HAT  ")), vec!["Hat", "Tote"]);
    }

    #[test]
    fn test_rank_with_tiers_reports_tiers() {
        let r = products(&["Red Hat", "Hat", "Hat Stand", "Bag"]);
        let tiers: Vec<MatchTier> = rank_with_tiers(&r, "hat")
            .into_iter()
            .map(|rp| rp.tier)
            .collect();
        assert_eq!(
            tiers,
            vec![MatchTier::Exact, MatchTier::Prefix, MatchTier::Substring, MatchTier::NoMatch]
        );
    }

    #[test]
    fn test_rank_with_tiers_empty_query() {
        let r = products(&["Hat"]);
        let ranked = rank_with_tiers(&r, "");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].tier, MatchTier::NoMatch);
    }

    #[test]
    fn test_rank_by_on_plain_strings() {
        let items = vec!["granny square".to_string(), "square".to_string()];
        let ranked = rank_by(&items, "square", |s| s.as_str());
        assert_eq!(ranked, vec!["square".to_string(), "granny square".to_string()]);
    }

    #[test]
    fn test_session_reranks_on_commit() {
        let catalog = Arc::new(Catalog::new(Arc::new(NoSource)));
        let session = SearchSession::new(Arc::clone(&catalog));
        session.set_query("hat".to_string());

        catalog.commit(1, products(&["Red Hat", "Hat", "Bag"]));
        assert_eq!(names(&session.display_sequence()), vec!["Hat", "Red Hat", "Bag"]);
    }

    #[test]
    fn test_commit_racing_query_change_leaves_consistent_display() {
        for round in 0..500 {
            let catalog = Arc::new(Catalog::new(Arc::new(NoSource)));
            catalog.commit(1, products(&["b", "1 a"]));
            let session = SearchSession::new(Arc::clone(&catalog));

            let committer = Arc::clone(&catalog);
            let handle = std::thread::spawn(move || {
                committer.commit(2, products(&["c", "x 1", "1", "d"]));
            });
            session.set_query("1".to_string());
            handle.join().unwrap();

            assert_eq!(
                session.display_sequence(),
                rank(&catalog.products(), &session.query()),
                "round {}",
                round
            );
        }
    }
}
