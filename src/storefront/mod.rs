//! Storefront handlers.
//!
//! [`Storefront`] is the client context built once by the embedding app. It
//! owns the [`ApiClient`] and the [`QueryCache`] and exposes the operations a
//! UI calls: reads go through the cache, mutations write the server's
//! response back into it or invalidate what they made stale.

mod admin;
mod cart;
mod catalog;
mod checkout;
mod store;

pub use admin::*;
pub use cart::*;
pub use store::*;

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::cache::{QueryCache, QueryKey, QueryOptions, Speculation};
use crate::client::ApiClient;
use crate::config::Config;
use crate::errors::{ApiError, GENERIC_AUTH_MESSAGE};

/// Client context shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct Storefront {
    config: Arc<Config>,
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl Storefront {
    pub fn new(config: Arc<Config>, api: ApiClient) -> Self {
        Self {
            config,
            api,
            cache: Arc::new(QueryCache::new()),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user_id(&self) -> Option<i64> {
        self.api.user_id()
    }

    /// Whether the current user is listed in the configured admin ids.
    pub fn is_admin(&self) -> bool {
        self.user_id()
            .map(|id| self.config.is_admin(id))
            .unwrap_or(false)
    }

    /// Admin console for the current user.
    ///
    /// This only hides admin screens from other users; the backend enforces
    /// access on every admin endpoint.
    pub fn admin(&self) -> Result<AdminConsole<'_>, ApiError> {
        if !self.is_admin() {
            return Err(ApiError::Forbidden(
                "The admin console is only available to store administrators".to_string(),
            ));
        }
        Ok(AdminConsole::new(self))
    }

    fn require_user(&self) -> Result<i64, ApiError> {
        self.user_id()
            .ok_or_else(|| ApiError::Auth(GENERIC_AUTH_MESSAGE.to_string()))
    }

    /// Settle a speculative patch by refetching its key in the background.
    pub fn reconcile(&self, speculation: Speculation) -> JoinHandle<()> {
        let storefront = self.clone();
        tokio::spawn(async move {
            let key = speculation.key();
            if let Err(e) = storefront.refetch(key).await {
                tracing::warn!(?key, "Failed to reconcile speculative update: {}", e);
            }
        })
    }

    /// Fetch `key` from the server regardless of freshness.
    pub async fn refetch(&self, key: &QueryKey) -> Result<(), ApiError> {
        let cache = &self.cache;
        let api = &self.api;
        match key {
            QueryKey::Catalog => self.refresh_catalog().await.map(drop),
            QueryKey::Cart => cache
                .refetch_query(key.clone(), QueryOptions::CART, || api.get_cart())
                .await
                .map(drop),
            QueryKey::StoreStatus => self.refresh_store_status().await.map(drop),
            QueryKey::AdminCatalog => cache
                .refetch_query(key.clone(), QueryOptions::ADMIN, || api.get_admin_catalog())
                .await
                .map(drop),
            QueryKey::AdminCategory(id) => cache
                .refetch_query(key.clone(), QueryOptions::ADMIN, || {
                    api.get_admin_category(id)
                })
                .await
                .map(drop),
            QueryKey::AdminOrders(query) => cache
                .refetch_query(key.clone(), QueryOptions::ADMIN, || api.get_orders(query))
                .await
                .map(drop),
            QueryKey::AdminOrder(id) => cache
                .refetch_query(key.clone(), QueryOptions::ADMIN, || api.get_admin_order(id))
                .await
                .map(drop),
        }
    }

    /// Warm the store status and catalog concurrently at startup.
    ///
    /// Failures are logged; the screens that need the data fetch it again.
    pub async fn prefetch_critical(&self) {
        let (status, catalog) = tokio::join!(self.store_status(), self.catalog());
        if let Err(e) = status {
            tracing::warn!("Failed to prefetch store status: {}", e);
        }
        if let Err(e) = catalog {
            tracing::warn!("Failed to prefetch catalog: {}", e);
        }
    }
}
