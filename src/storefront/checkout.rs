use super::Storefront;
use crate::cache::QueryKey;
use crate::errors::ApiError;
use crate::models::{CreateOrderRequest, Order};

impl Storefront {
    /// Submit the checkout form with its payment receipt.
    ///
    /// The order consumes the cart and reserves stock, so both the cart and
    /// the catalog are invalidated once it is placed.
    #[tracing::instrument(skip(self, request))]
    pub async fn place_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        request.validate()?;
        self.ensure_accepting_orders().await?;
        self.require_user()?;

        let order = self.api.create_order(request).await?;
        tracing::info!(order_id = %order.id, "Order placed");

        self.cache.invalidate(&QueryKey::Cart).await;
        self.cache.invalidate(&QueryKey::Catalog).await;
        Ok(order)
    }
}
