//! Client-side query cache.
//!
//! Responses are stored under a logical [`QueryKey`] together with the time
//! they were fetched. A [`QueryOptions::stale_time`] decides when a read goes
//! back to the network; mutation handlers write server responses straight into
//! the cache or invalidate entries to force the next read to refetch.
//!
//! Entries nobody has read for their [`QueryOptions::gc_time`] are dropped the
//! next time the cache is written to.

mod optimistic;

pub use optimistic::*;

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::errors::ApiError;
use crate::models::OrderListQuery;

/// Logical identity of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Catalog,
    Cart,
    StoreStatus,
    AdminCatalog,
    AdminCategory(String),
    AdminOrders(OrderListQuery),
    AdminOrder(String),
}

impl QueryKey {
    /// Any page or filter of the admin order list.
    pub fn is_admin_orders(&self) -> bool {
        matches!(self, QueryKey::AdminOrders(_))
    }

    /// Queries derived from catalog data.
    pub fn is_catalog_data(&self) -> bool {
        matches!(
            self,
            QueryKey::Catalog | QueryKey::AdminCatalog | QueryKey::AdminCategory(_)
        )
    }

    /// Retention of values written directly with [`QueryCache::set_query_data`].
    pub fn gc_time(&self) -> Duration {
        match self {
            QueryKey::Catalog => QueryOptions::CATALOG.gc_time,
            QueryKey::StoreStatus => QueryOptions::STORE_STATUS.gc_time,
            QueryKey::Cart => QueryOptions::CART.gc_time,
            _ => QueryOptions::ADMIN.gc_time,
        }
    }
}

/// Freshness policy of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long fetched data is served without going back to the network
    pub stale_time: Duration,
    /// How long an unread entry is kept before it is collected
    pub gc_time: Duration,
}

impl QueryOptions {
    pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

    pub const CATALOG: Self = Self::new(Duration::from_secs(2 * 60), Duration::from_secs(15 * 60));
    pub const STORE_STATUS: Self = Self::fresh_for(Duration::from_secs(2 * 60));
    pub const CART: Self = Self::fresh_for(Duration::from_secs(30));
    pub const ADMIN: Self = Self::fresh_for(Duration::from_secs(30));

    pub const fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            stale_time,
            gc_time,
        }
    }

    /// Options with the given stale time and the default retention.
    pub const fn fresh_for(stale_time: Duration) -> Self {
        Self::new(stale_time, Self::DEFAULT_GC_TIME)
    }
}

struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    /// Last server-confirmed value while `data` holds a speculative patch
    confirmed: Option<Arc<dyn Any + Send + Sync>>,
    updated_at: Instant,
    last_read: Instant,
    gc_time: Duration,
    invalidated: bool,
}

impl CacheEntry {
    fn new<T: Send + Sync + 'static>(value: T, gc_time: Duration) -> Self {
        let now = Instant::now();
        Self {
            data: Arc::new(value),
            confirmed: None,
            updated_at: now,
            last_read: now,
            gc_time,
            invalidated: false,
        }
    }

    fn is_stale(&self, options: QueryOptions) -> bool {
        self.invalidated || self.updated_at.elapsed() >= options.stale_time
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_read) >= self.gc_time
    }

    fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.data.downcast_ref::<T>().cloned()
    }

    /// Clone the value out and count it as a read.
    fn read<T: Clone + 'static>(&mut self) -> Option<T> {
        let value = self.value::<T>()?;
        self.last_read = Instant::now();
        Some(value)
    }
}

/// Shared cache of query results.
#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, fresh or stale.
    pub async fn get_query_data<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        self.entries.write().await.get_mut(key).and_then(CacheEntry::read)
    }

    /// Store a value as freshly fetched, retained for the key's default gc time.
    pub async fn set_query_data<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        let gc_time = key.gc_time();
        self.insert(key, value, gc_time).await;
    }

    async fn insert<T: Send + Sync + 'static>(&self, key: QueryKey, value: T, gc_time: Duration) {
        let mut entries = self.entries.write().await;
        let collected = collect_expired(&mut entries, Instant::now());
        if collected > 0 {
            tracing::debug!(collected, "Collected unused queries");
        }
        entries.insert(key, CacheEntry::new(value, gc_time));
    }

    /// Drop every entry unread for longer than its gc time.
    pub async fn collect_garbage(&self) -> usize {
        collect_expired(&mut *self.entries.write().await, Instant::now())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Replace a cached value with `update(current)`, keeping its fetch time
    /// and staleness. Returns `false` (and changes nothing) when there is no
    /// value of type `T` or `update` declines with `None`.
    pub async fn update_query_data<T, F>(&self, key: &QueryKey, update: F) -> bool
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) -> Option<T>,
    {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        let Some(next) = entry.data.downcast_ref::<T>().and_then(update) else {
            return false;
        };
        entry.data = Arc::new(next);
        true
    }

    /// Mark an entry stale so the next read refetches. The value stays readable.
    pub async fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            entry.invalidated = true;
        }
    }

    /// Mark every entry matching `predicate` stale.
    pub async fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut entries = self.entries.write().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if predicate(key) {
                entry.invalidated = true;
                count += 1;
            }
        }
        count
    }

    pub async fn remove(&self, key: &QueryKey) {
        self.entries.write().await.remove(key);
    }

    /// Whether a read of `key` would go to the network.
    pub async fn is_stale(&self, key: &QueryKey, options: QueryOptions) -> bool {
        self.entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.is_stale(options))
            .unwrap_or(true)
    }

    /// Mark the cached value as confirmed by the server just now.
    pub async fn touch(&self, key: &QueryKey) -> bool {
        match self.entries.write().await.get_mut(key) {
            Some(entry) => {
                entry.updated_at = Instant::now();
                entry.invalidated = false;
                true
            }
            None => false,
        }
    }

    /// Accept the server's "not modified" answer for `key`.
    ///
    /// The answer refers to the last value the server sent, so a pending
    /// speculative patch is dropped in favour of it.
    async fn confirm_unchanged<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(key)?;
        if let Some(confirmed) = entry.confirmed.take() {
            entry.data = confirmed;
        }
        let value = entry.read::<T>()?;
        entry.updated_at = Instant::now();
        entry.invalidated = false;
        Some(value)
    }

    /// Serve `key` from the cache while fresh, otherwise run `fetcher`.
    ///
    /// A successful fetch replaces the entry. [`ApiError::NotModified`] keeps
    /// the last server-confirmed value and restarts its freshness window;
    /// without a cached value it is returned to the caller. Other failures
    /// leave the entry as it was.
    pub async fn fetch_query<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.get_mut(&key) {
                if !entry.is_stale(options) {
                    if let Some(value) = entry.read::<T>() {
                        tracing::debug!(?key, "Serving cached query");
                        return Ok(value);
                    }
                }
            }
        }

        match fetcher().await {
            Ok(value) => {
                self.insert(key, value.clone(), options.gc_time).await;
                Ok(value)
            }
            Err(ApiError::NotModified) => match self.confirm_unchanged::<T>(&key).await {
                Some(value) => {
                    tracing::debug!(?key, "Server confirmed cached query");
                    Ok(value)
                }
                None => Err(ApiError::NotModified),
            },
            Err(e) => Err(e),
        }
    }

    /// Invalidate and fetch `key` regardless of freshness.
    pub async fn refetch_query<T, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.invalidate(&key).await;
        self.fetch_query(key, options, fetcher).await
    }
}

fn collect_expired(entries: &mut HashMap<QueryKey, CacheEntry>, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now));
    before - entries.len()
}
