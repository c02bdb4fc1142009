//! Product catalog loader.
//!
//! Holds the reference set: the full product list exactly as the source
//! returned it. A load replaces it wholesale; nothing edits it in place.
//!
//! Loads may overlap (a screen revisited quickly). Each load takes a sequence
//! number when it starts and a completed fetch is committed only if no load
//! with a higher number has committed already, so a slow stale fetch can never
//! overwrite a newer catalog.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::interface::{CrochetError, LoadOutcome, Product, ProductSource};
use crate::observable::{Observable, SubscriptionId};
use crate::store::{runtime_handle, DropGuard};

/// The reference set together with the load that produced it
#[derive(Clone, Default)]
struct Committed {
    /// Sequence number of the committed load (0 = none yet)
    seq: u64,
    products: Arc<Vec<Product>>,
}

pub struct Catalog {
    source: Arc<dyn ProductSource>,
    committed: Observable<Committed>,
    next_seq: AtomicU64,
}

impl Catalog {
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self {
            source,
            committed: Observable::default(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Current reference set
    pub fn products(&self) -> Arc<Vec<Product>> {
        self.committed.read(|committed| Arc::clone(&committed.products))
    }

    pub fn source(&self) -> &Arc<dyn ProductSource> {
        &self.source
    }

    /// Fetch the catalog from the source.
    ///
    /// On failure the reference set is left as it was and the error is returned
    /// for the caller to surface. Dropping the returned future cancels the fetch.
    pub async fn load(&self) -> Result<LoadOutcome, CrochetError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "catalog load started");

        let token = CancellationToken::new();
        let _guard = DropGuard::new(token.clone());

        // Spawn on our runtime: the source may need tokio (reqwest) and the
        // caller may be a foreign executor with no runtime of its own
        let source = Arc::clone(&self.source);
        let handle = runtime_handle().spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Err(CrochetError::Cancelled),
                fetched = source.fetch_all() => fetched,
            }
        });

        let fetched = match handle.await {
            Ok(result) => result,
            // JoinError means the task panicked or was aborted
            Err(_join_error) => Err(CrochetError::Cancelled),
        };

        match fetched {
            Ok(products) => Ok(self.commit(seq, products)),
            Err(e) => {
                warn!(seq, error = %e, "catalog load failed, keeping previous catalog");
                Err(e)
            }
        }
    }

    /// Check-and-swap happens under the observable's write lock; listeners run
    /// after it is released, so a listener may start or commit another load.
    pub(crate) fn commit(&self, seq: u64, products: Vec<Product>) -> LoadOutcome {
        let product_count = products.len() as u64;
        let swapped = self.committed.try_update(|committed| {
            if seq <= committed.seq {
                return Err(committed.seq);
            }
            committed.seq = seq;
            committed.products = Arc::new(products);
            Ok(())
        });

        match swapped {
            Ok(()) => {
                info!(seq, product_count, "catalog committed");
                LoadOutcome::Committed { product_count }
            }
            Err(newer) => {
                debug!(seq, committed = newer, "discarding superseded catalog load");
                LoadOutcome::Superseded
            }
        }
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&Arc<Vec<Product>>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.committed
            .subscribe(move |committed| listener(&committed.products))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.committed.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Source whose successive fetches return scripted results after scripted delays
    struct ScriptedSource {
        script: Mutex<VecDeque<(Duration, Result<Vec<Product>, CrochetError>)>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<(Duration, Result<Vec<Product>, CrochetError>)>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ProductSource for ScriptedSource {
        async fn fetch_all(&self) -> Result<Vec<Product>, CrochetError> {
            let next = self.script.lock().pop_front();
            match next {
                Some((delay, result)) => {
                    tokio::time::sleep(delay).await;
                    result
                }
                None => Ok(Vec::new()),
            }
        }

        async fn save(&self, _product: Product) -> Result<(), CrochetError> {
            Ok(())
        }
    }

    fn product(name: &str) -> Product {
        Product {
            id: name.to_lowercase(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_commits_in_source_order() {
        let source = ScriptedSource::new(vec![(
            Duration::ZERO,
            Ok(vec![product("Scarf"), product("Beanie")]),
        )]);
        let catalog = Catalog::new(source);

        let outcome = catalog.load().await.unwrap();
        assert_eq!(outcome, LoadOutcome::Committed { product_count: 2 });
        let names: Vec<String> = catalog.products().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["Scarf", "Beanie"]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_catalog() {
        let source = ScriptedSource::new(vec![
            (Duration::ZERO, Ok(vec![product("Scarf")])),
            (Duration::ZERO, Err(CrochetError::Transport("offline".into()))),
        ]);
        let catalog = Catalog::new(source);

        catalog.load().await.unwrap();
        let err = catalog.load().await.unwrap_err();
        assert_eq!(err, CrochetError::Transport("offline".into()));
        assert_eq!(catalog.products().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_load_leaves_empty_catalog() {
        let source = ScriptedSource::new(vec![(
            Duration::ZERO,
            Err(CrochetError::Parse("bad json".into())),
        )]);
        let catalog = Catalog::new(source);

        assert!(catalog.load().await.is_err());
        assert!(catalog.products().is_empty());
    }

    #[tokio::test]
    async fn test_stale_load_finishing_last_is_discarded() {
        // First load is slow, second is fast: the first result arrives last
        let source = ScriptedSource::new(vec![
            (Duration::from_millis(80), Ok(vec![product("Old")])),
            (Duration::from_millis(5), Ok(vec![product("New")])),
        ]);
        let catalog = Catalog::new(source);

        let (first, second) = tokio::join!(catalog.load(), catalog.load());

        assert_eq!(first.unwrap(), LoadOutcome::Superseded);
        assert_eq!(second.unwrap(), LoadOutcome::Committed { product_count: 1 });
        assert_eq!(catalog.products()[0].name, "New");
    }

    #[tokio::test]
    async fn test_commit_notifies_subscribers() {
        let source = ScriptedSource::new(vec![(Duration::ZERO, Ok(vec![product("Hat")]))]);
        let catalog = Catalog::new(source);
        let seen = Arc::new(Mutex::new(0usize));
        let seen_clone = Arc::clone(&seen);
        catalog.subscribe(move |products| *seen_clone.lock() = products.len());

        catalog.load().await.unwrap();
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_older_sequence_cannot_overwrite_newer_commit() {
        let catalog = Catalog::new(ScriptedSource::new(Vec::new()));
        assert_eq!(
            catalog.commit(2, vec![product("New")]),
            LoadOutcome::Committed { product_count: 1 }
        );
        assert_eq!(catalog.commit(1, vec![product("Old")]), LoadOutcome::Superseded);
        assert_eq!(catalog.products()[0].name, "New");
    }

    #[test]
    fn test_listener_may_commit_again_without_deadlock() {
        let catalog = Arc::new(Catalog::new(ScriptedSource::new(Vec::new())));
        let weak = Arc::downgrade(&catalog);
        catalog.subscribe(move |products| {
            if products.len() == 1 {
                if let Some(catalog) = weak.upgrade() {
                    catalog.commit(5, vec![product("Hat"), product("Bag")]);
                }
            }
        });

        assert_eq!(
            catalog.commit(1, vec![product("Scarf")]),
            LoadOutcome::Committed { product_count: 1 }
        );
        assert_eq!(catalog.products().len(), 2);
        assert_eq!(catalog.commit(4, vec![product("Old")]), LoadOutcome::Superseded);
    }
}
