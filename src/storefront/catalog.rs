//! Catalog reads.

use super::Storefront;
use crate::cache::{QueryKey, QueryOptions};
use crate::errors::ApiError;
use crate::models::CatalogResponse;

impl Storefront {
    /// The public catalog, served from the cache while fresh.
    ///
    /// A 304 answer with nothing cached to fall back on means the stored ETag
    /// belongs to an earlier session; it is discarded and the catalog fetched
    /// unconditionally.
    pub async fn catalog(&self) -> Result<CatalogResponse, ApiError> {
        let first = self
            .cache
            .fetch_query(QueryKey::Catalog, QueryOptions::CATALOG, || {
                self.api.get_catalog()
            })
            .await;

        match first {
            Err(ApiError::NotModified) => {
                tracing::info!("Catalog unchanged but not cached, refetching without ETag");
                self.api.forget_catalog_etag().await?;
                self.cache
                    .fetch_query(QueryKey::Catalog, QueryOptions::CATALOG, || {
                        self.api.get_catalog()
                    })
                    .await
            }
            other => other,
        }
    }

    /// Revalidate the catalog with the server now.
    pub async fn refresh_catalog(&self) -> Result<CatalogResponse, ApiError> {
        self.cache.invalidate(&QueryKey::Catalog).await;
        self.catalog().await
    }
}
