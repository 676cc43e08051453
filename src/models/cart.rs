//! Cart models matching the backend cart schema.

use serde::{Deserialize, Serialize};

/// A line in the user's cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    /// Cart-item id, unique within the cart
    pub id: String,
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    pub quantity: i64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The user's cart. `total_amount` is computed by the server on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub user_id: i64,
    pub items: Vec<CartItem>,
    pub total_amount: f64,
}

impl Cart {
    pub fn item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Request body for POST /cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: String,
    pub variant_id: String,
    pub quantity: i64,
}

/// Request body for PATCH /cart/item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub item_id: String,
    pub quantity: i64,
}

/// Request body for DELETE /cart/item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCartItemRequest {
    pub item_id: String,
}
