//! Inventory cache
//!
//! Read-through cache over the catalog. Serves the cached snapshot while it
//! is fresh and non-empty; otherwise refreshes. A failed refresh serves the
//! last-good snapshot instead of failing the caller: inventory
//! unavailability degrades the conversation, it never aborts a turn.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clerk_core::{Catalog, InventorySnapshot, Product, SearchFilters};

struct CacheState {
    snapshot: InventorySnapshot,
    last_fetched: Option<Instant>,
}

/// TTL read-through cache of the product catalog.
pub struct InventoryCache {
    catalog: Arc<dyn Catalog>,
    ttl: Duration,
    state: RwLock<CacheState>,
}

impl InventoryCache {
    pub fn new(catalog: Arc<dyn Catalog>, ttl: Duration) -> Self {
        Self {
            catalog,
            ttl,
            state: RwLock::new(CacheState {
                snapshot: InventorySnapshot::empty(),
                last_fetched: None,
            }),
        }
    }

    /// Current products, refreshed when stale. Never fails; the worst case
    /// is an empty list before the first successful fetch.
    pub async fn get(&self) -> Vec<Product> {
        {
            let state = self.state.read();
            let fresh = state
                .last_fetched
                .map(|at| at.elapsed() < self.ttl)
                .unwrap_or(false);
            if fresh && !state.snapshot.is_empty() {
                return state.snapshot.products.clone();
            }
        }

        match self.catalog.list_products(&SearchFilters::default()).await {
            Ok(products) => {
                tracing::debug!(count = products.len(), "Refreshed inventory snapshot");
                let mut state = self.state.write();
                state.snapshot = InventorySnapshot::new(products.clone());
                state.last_fetched = Some(Instant::now());
                products
            }
            Err(e) => {
                tracing::warn!("Inventory refresh failed, serving last-good snapshot: {}", e);
                self.state.read().snapshot.products.clone()
            }
        }
    }

    /// Drop the snapshot so the next `get` refetches.
    pub fn invalidate(&self) {
        self.state.write().last_fetched = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clerk_core::{Category, StoreError};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FlakyCatalog {
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Catalog for FlakyCatalog {
        async fn list_products(
            &self,
            _filters: &SearchFilters,
        ) -> Result<Vec<Product>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("catalog down".into()));
            }
            Ok(vec![Product {
                id: "p1".into(),
                name: "Suede Loafers".into(),
                category: Category::Shoes,
                price: 99.0,
                sizes: vec!["42".into()],
                stock: 3,
                tags: vec![],
                description: String::new(),
            }])
        }

        async fn search_products(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<Product>, StoreError> {
            Ok(vec![])
        }

        async fn category_counts(&self) -> Result<HashMap<String, usize>, StoreError> {
            Ok(HashMap::new())
        }
    }

    #[tokio::test]
    async fn test_fresh_snapshot_not_refetched() {
        let catalog = Arc::new(FlakyCatalog {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        });
        let cache = InventoryCache::new(catalog.clone(), Duration::from_secs(300));

        assert_eq!(cache.get().await.len(), 1);
        assert_eq!(cache.get().await.len(), 1);
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_last_good() {
        let catalog = Arc::new(FlakyCatalog {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        });
        let cache = InventoryCache::new(catalog.clone(), Duration::from_secs(300));

        assert_eq!(cache.get().await.len(), 1);

        catalog.fail.store(true, Ordering::SeqCst);
        cache.invalidate();

        // Refresh fails, but the previous snapshot is still served.
        assert_eq!(cache.get().await.len(), 1);
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_first_fetch_failure_yields_empty() {
        let catalog = Arc::new(FlakyCatalog {
            fail: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        });
        let cache = InventoryCache::new(catalog, Duration::from_secs(300));
        assert!(cache.get().await.is_empty());
    }
}
