//! Cart mutations.
//!
//! Every successful mutation stores the cart the server returned. Every failed
//! one invalidates the cached cart and refetches it before the error reaches
//! the caller, so the UI never keeps showing a cart the server rejected.

use std::future::Future;
use tokio::task::JoinHandle;

use super::Storefront;
use crate::cache::{QueryKey, QueryOptions};
use crate::errors::ApiError;
use crate::models::{
    AddToCartRequest, Cart, CatalogResponse, RemoveCartItemRequest, UpdateCartItemRequest,
};

/// Result of a successful add-to-cart.
#[derive(Debug)]
pub struct AddToCartOutcome {
    /// Cart as returned by the server
    pub cart: Cart,
    /// Background refetch settling the speculative stock decrement
    pub catalog_sync: JoinHandle<()>,
}

impl Storefront {
    /// The current user's cart.
    pub async fn cart(&self) -> Result<Cart, ApiError> {
        self.require_user()?;
        self.cache
            .fetch_query(QueryKey::Cart, QueryOptions::CART, || self.api.get_cart())
            .await
    }

    /// Add `quantity` units of a product variant to the cart.
    ///
    /// On success the cached catalog is patched to show the reduced stock right
    /// away and a background refetch replaces the patch with server data.
    pub async fn add_to_cart(
        &self,
        product_id: &str,
        variant_id: &str,
        quantity: i64,
    ) -> Result<AddToCartOutcome, ApiError> {
        if quantity < 1 {
            return Err(ApiError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }
        self.ensure_accepting_orders().await?;
        self.require_user()?;

        let request = AddToCartRequest {
            product_id: product_id.to_string(),
            variant_id: variant_id.to_string(),
            quantity,
        };
        let cart = self.settle_cart(self.api.add_to_cart(&request)).await?;

        let speculation = self
            .cache
            .speculate(QueryKey::Catalog, |catalog: &CatalogResponse| {
                catalog.with_variant_stock_decremented(product_id, variant_id, quantity)
            })
            .await;
        let catalog_sync = self.reconcile(speculation);

        Ok(AddToCartOutcome { cart, catalog_sync })
    }

    /// Set the quantity of a cart line.
    pub async fn update_cart_item(&self, item_id: &str, quantity: i64) -> Result<Cart, ApiError> {
        if item_id.is_empty() || quantity < 1 {
            return Err(ApiError::InvalidInput(
                "Select an item and a quantity of at least 1".to_string(),
            ));
        }
        self.require_user()?;

        let request = UpdateCartItemRequest {
            item_id: item_id.to_string(),
            quantity,
        };
        self.settle_cart(self.api.update_cart_item(&request)).await
    }

    /// Remove a cart line.
    pub async fn remove_cart_item(&self, item_id: &str) -> Result<Cart, ApiError> {
        if item_id.is_empty() {
            return Err(ApiError::InvalidInput("Select an item to remove".to_string()));
        }
        self.require_user()?;

        let request = RemoveCartItemRequest {
            item_id: item_id.to_string(),
        };
        self.settle_cart(self.api.remove_cart_item(&request)).await
    }

    /// Await a cart mutation and bring the cached cart in line with its outcome.
    async fn settle_cart<Fut>(&self, mutation: Fut) -> Result<Cart, ApiError>
    where
        Fut: Future<Output = Result<Cart, ApiError>>,
    {
        match mutation.await {
            Ok(cart) => {
                self.cache.set_query_data(QueryKey::Cart, cart.clone()).await;
                Ok(cart)
            }
            Err(e) => {
                tracing::warn!("Cart mutation failed, resyncing cart: {}", e);
                let resync = self
                    .cache
                    .refetch_query(QueryKey::Cart, QueryOptions::CART, || self.api.get_cart())
                    .await;
                if let Err(resync_error) = resync {
                    tracing::warn!("Failed to resync cart: {}", resync_error);
                }
                Err(e)
            }
        }
    }
}
