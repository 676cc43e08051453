//! Admin console operations.
//!
//! Order management, broadcast messaging, store sleep mode and catalog
//! management. Obtained through [`Storefront::admin`].

use super::Storefront;
use crate::cache::{QueryKey, QueryOptions};
use crate::errors::ApiError;
use crate::models::{
    AdminCategoryDetail, AdminOrdersResponse, BroadcastRequest, BroadcastResponse,
    CatalogResponse, Category, CategoryPayload, Order, OrderListQuery, OrderStatus, Product,
    ProductPayload, StoreStatus, UpdateStatusRequest, UpdateStoreStatusRequest,
};

/// Admin view of a [`Storefront`].
#[derive(Clone, Copy)]
pub struct AdminConsole<'a> {
    storefront: &'a Storefront,
}

impl<'a> AdminConsole<'a> {
    pub(super) fn new(storefront: &'a Storefront) -> Self {
        Self { storefront }
    }

    // ==================== ORDERS ====================

    /// One page of the order list.
    pub async fn orders(&self, query: &OrderListQuery) -> Result<AdminOrdersResponse, ApiError> {
        let sf = self.storefront;
        sf.cache
            .fetch_query(QueryKey::AdminOrders(query.clone()), QueryOptions::ADMIN, || {
                sf.api.get_orders(query)
            })
            .await
    }

    pub async fn order(&self, order_id: &str) -> Result<Order, ApiError> {
        let sf = self.storefront;
        sf.cache
            .fetch_query(
                QueryKey::AdminOrder(order_id.to_string()),
                QueryOptions::ADMIN,
                || sf.api.get_admin_order(order_id),
            )
            .await
    }

    /// Accept or reject an order.
    ///
    /// A rejection without a reason fails here, before anything is sent.
    #[tracing::instrument(skip(self, reason))]
    pub async fn change_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        reason: Option<&str>,
    ) -> Result<Order, ApiError> {
        let request = UpdateStatusRequest::new(status, reason)?;
        let sf = self.storefront;

        let order = sf.api.update_order_status(order_id, &request).await?;
        tracing::info!(status = order.status.as_str(), "Order status changed");

        sf.cache
            .set_query_data(QueryKey::AdminOrder(order.id.clone()), order.clone())
            .await;
        sf.cache.invalidate_where(QueryKey::is_admin_orders).await;
        Ok(order)
    }

    /// Delete an order. Deletion is final once the server confirms it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: &str) -> Result<(), ApiError> {
        let sf = self.storefront;
        sf.api.delete_order(order_id).await?;
        tracing::info!("Order deleted");

        sf.cache
            .remove(&QueryKey::AdminOrder(order_id.to_string()))
            .await;
        sf.cache.invalidate_where(QueryKey::is_admin_orders).await;
        Ok(())
    }

    /// URL of the order's uploaded payment receipt.
    pub fn receipt_url(&self, order: &Order) -> Option<String> {
        self.storefront.api.order_receipt_url(order)
    }

    // ==================== MESSAGING & STORE ====================

    pub async fn broadcast(&self, request: &BroadcastRequest) -> Result<BroadcastResponse, ApiError> {
        request.validate()?;
        let response = self.storefront.api.send_broadcast(request).await?;
        tracing::info!(
            sent = response.sent_count,
            failed = response.failed_count,
            "Broadcast finished"
        );
        Ok(response)
    }

    /// Toggle sleep mode. A blank message falls back to the default notice.
    pub async fn set_sleep_mode(
        &self,
        sleep: bool,
        message: Option<&str>,
    ) -> Result<StoreStatus, ApiError> {
        let sf = self.storefront;
        let request = UpdateStoreStatusRequest::new(sleep, message);
        let status = sf.api.set_store_sleep_mode(&request).await?;
        sf.cache
            .set_query_data(QueryKey::StoreStatus, status.clone())
            .await;
        Ok(status)
    }

    // ==================== CATALOG ====================

    pub async fn catalog(&self) -> Result<CatalogResponse, ApiError> {
        let sf = self.storefront;
        sf.cache
            .fetch_query(QueryKey::AdminCatalog, QueryOptions::ADMIN, || {
                sf.api.get_admin_catalog()
            })
            .await
    }

    pub async fn category(&self, category_id: &str) -> Result<AdminCategoryDetail, ApiError> {
        let sf = self.storefront;
        sf.cache
            .fetch_query(
                QueryKey::AdminCategory(category_id.to_string()),
                QueryOptions::ADMIN,
                || sf.api.get_admin_category(category_id),
            )
            .await
    }

    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
        let product = self.storefront.api.create_product(payload).await?;
        self.catalog_changed().await;
        Ok(product)
    }

    pub async fn update_product(
        &self,
        product_id: &str,
        payload: &ProductPayload,
    ) -> Result<Product, ApiError> {
        let product = self.storefront.api.update_product(product_id, payload).await?;
        self.catalog_changed().await;
        Ok(product)
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<(), ApiError> {
        self.storefront.api.delete_product(product_id).await?;
        self.catalog_changed().await;
        Ok(())
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        let payload = category_payload(name)?;
        let category = self.storefront.api.create_category(&payload).await?;
        self.catalog_changed().await;
        Ok(category)
    }

    pub async fn update_category(&self, category_id: &str, name: &str) -> Result<Category, ApiError> {
        let payload = category_payload(name)?;
        let category = self
            .storefront
            .api
            .update_category(category_id, &payload)
            .await?;
        self.catalog_changed().await;
        Ok(category)
    }

    pub async fn delete_category(&self, category_id: &str) -> Result<(), ApiError> {
        self.storefront.api.delete_category(category_id).await?;
        self.storefront
            .cache
            .remove(&QueryKey::AdminCategory(category_id.to_string()))
            .await;
        self.catalog_changed().await;
        Ok(())
    }

    async fn catalog_changed(&self) {
        self.storefront
            .cache
            .invalidate_where(QueryKey::is_catalog_data)
            .await;
    }
}

fn category_payload(name: &str) -> Result<CategoryPayload, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("Enter a category name".to_string()));
    }
    Ok(CategoryPayload {
        name: name.to_string(),
    })
}
