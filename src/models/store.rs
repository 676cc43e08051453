//! Store status and broadcast models.

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Store-wide sleep mode flag shown to customers as a banner.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreStatus {
    pub is_sleep_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_message: Option<String>,
}

impl StoreStatus {
    /// Default notice when sleep mode has no custom message.
    pub const DEFAULT_SLEEP_MESSAGE: &'static str = "The store is temporarily not accepting orders";

    /// Message to show while the store sleeps, or `None` when open.
    pub fn sleep_notice(&self) -> Option<&str> {
        if !self.is_sleep_mode {
            return None;
        }
        Some(
            self.sleep_message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(Self::DEFAULT_SLEEP_MESSAGE),
        )
    }
}

/// Request body for PATCH /admin/store/sleep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStoreStatusRequest {
    pub sleep: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UpdateStoreStatusRequest {
    /// A blank message is sent as absent.
    pub fn new(sleep: bool, message: Option<&str>) -> Self {
        Self {
            sleep,
            message: message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        }
    }
}

/// Broadcast audience.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastSegment {
    #[default]
    All,
}

/// Request body for POST /admin/broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub segment: BroadcastSegment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl BroadcastRequest {
    pub fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            segment: BroadcastSegment::All,
            link: None,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() || self.message.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "Fill in the title and the message text".to_string(),
            ));
        }
        Ok(())
    }
}

/// Delivery report for a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BroadcastResponse {
    pub success: bool,
    pub sent_count: i64,
    pub total_count: i64,
    pub failed_count: i64,
}

impl BroadcastResponse {
    /// Human-readable delivery summary.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Broadcast finished. Recipients: {}. Delivered: {}.",
            self.total_count, self.sent_count
        );
        if self.failed_count > 0 {
            summary.push_str(&format!(
                " Failed: {} (unreachable customers were removed).",
                self.failed_count
            ));
        }
        summary
    }
}
