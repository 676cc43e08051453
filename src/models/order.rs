//! Order models matching the backend order schema.

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Order lifecycle status. The backend uses the Russian literals on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    #[serde(rename = "принят")]
    Accepted,
    #[serde(rename = "отказано")]
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Accepted => "принят",
            OrderStatus::Rejected => "отказано",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "принят" => Some(OrderStatus::Accepted),
            "отказано" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }

    /// Label for admin status badges.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Accepted => "Принят",
            OrderStatus::Rejected => "Отказано",
        }
    }

    pub fn requires_reason(&self) -> bool {
        matches!(self, OrderStatus::Rejected)
    }
}

/// A line of a placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    pub quantity: i64,
    pub price: f64,
}

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<String>,
    pub status: OrderStatus,
    /// Present iff `status` is `Rejected`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub can_edit_address: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_receipt_file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_receipt_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_receipt_filename: Option<String>,
}

impl Order {
    /// Last six characters of the id, used as the human-facing order number.
    pub fn short_id(&self) -> &str {
        let start = self
            .id
            .char_indices()
            .rev()
            .nth(5)
            .map(|(index, _)| index)
            .unwrap_or(0);
        &self.id[start..]
    }
}

/// Order row in the admin list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub created_at: String,
    pub items_count: i64,
}

/// Page of the admin order list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminOrdersResponse {
    pub orders: Vec<OrderSummary>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Query parameters for GET /admin/orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub include_deleted: bool,
}

impl OrderListQuery {
    /// Query pairs in the order the backend documents them. Unset values are omitted.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(cursor) = self.cursor.as_ref().filter(|c| !c.is_empty()) {
            pairs.push(("cursor".to_string(), cursor.clone()));
        }
        if self.include_deleted {
            pairs.push(("include_deleted".to_string(), "true".to_string()));
        }
        pairs
    }
}

/// Request body for PATCH /admin/order/{id}/status.
///
/// Fields are private: the constructors guarantee a rejection carries a
/// non-blank reason and an acceptance carries none.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpdateStatusRequest {
    status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
}

impl UpdateStatusRequest {
    pub fn accept() -> Self {
        Self {
            status: OrderStatus::Accepted,
            rejection_reason: None,
        }
    }

    pub fn reject(reason: &str) -> Result<Self, ApiError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::InvalidInput(
                "A rejection reason is required".to_string(),
            ));
        }
        Ok(Self {
            status: OrderStatus::Rejected,
            rejection_reason: Some(reason.to_string()),
        })
    }

    /// Build a request from a dialog's selected status and free-text reason.
    pub fn new(status: OrderStatus, reason: Option<&str>) -> Result<Self, ApiError> {
        match status {
            OrderStatus::Accepted => Ok(Self::accept()),
            OrderStatus::Rejected => Self::reject(reason.unwrap_or_default()),
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }
}

/// Uploaded payment receipt.
#[derive(Debug, Clone)]
pub struct ReceiptFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Checkout form submitted as multipart to POST /order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub comment: Option<String>,
    pub delivery_type: Option<String>,
    pub payment_type: Option<String>,
    pub payment_receipt: ReceiptFile,
}

impl CreateOrderRequest {
    /// Check required fields before anything is uploaded.
    pub fn validate(&self) -> Result<(), ApiError> {
        let missing: Vec<&str> = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "Required fields are missing: {}",
                missing.join(", ")
            )));
        }
        if self.payment_receipt.bytes.is_empty() {
            return Err(ApiError::InvalidInput(
                "A payment receipt is required".to_string(),
            ));
        }
        Ok(())
    }
}
