//! Error handling module for the storefront client.
//!
//! Every backend failure is normalized into [`ApiError`] so UI handlers can
//! decide on user feedback and cache invalidation by matching on the variant.

use std::time::Duration;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const NETWORK_UNAVAILABLE: &str = "NETWORK_UNAVAILABLE";
    pub const NOT_MODIFIED: &str = "NOT_MODIFIED";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    pub const STORE_SLEEPING: &str = "STORE_SLEEPING";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Message shown when the backend rejects stale or forged Telegram init data.
pub const STALE_AUTH_MESSAGE: &str = "Telegram data is invalid or expired. Refresh the page.";

/// Fallback message for a 401 without a usable body.
pub const GENERIC_AUTH_MESSAGE: &str = "Authentication error. Refresh the page.";

/// Client error type.
///
/// `Clone` because a deduplicated request hands the same result to every
/// caller that joined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request did not complete within its timeout tier
    Timeout { after: Duration },
    /// Connection-level failure (DNS, refused connection, reset)
    NetworkUnavailable(String),
    /// The catalog has not changed since the stored ETag
    NotModified,
    /// 401 from the backend
    Auth(String),
    /// 4xx other than 401
    Validation { status: u16, message: String },
    /// 5xx from the backend
    Server { status: u16, message: String },
    /// A success response that is not JSON, usually a wrong base URL
    Config(String),
    /// Response body did not match the expected shape, or the status was
    /// neither a success nor an error (an unsolicited 3xx)
    InvalidResponse(String),
    /// Rejected locally before any network call
    InvalidInput(String),
    /// The store is in sleep mode and does not accept orders
    StoreSleeping(String),
    /// Admin-only operation requested by a non-admin identity
    Forbidden(String),
    /// Durable client storage failure
    Storage(String),
}

impl ApiError {
    /// Get the HTTP status this error was derived from, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::NotModified => Some(304),
            ApiError::Auth(_) => Some(401),
            ApiError::Validation { status, .. } => Some(*status),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Timeout { .. } => codes::TIMEOUT,
            ApiError::NetworkUnavailable(_) => codes::NETWORK_UNAVAILABLE,
            ApiError::NotModified => codes::NOT_MODIFIED,
            ApiError::Auth(_) => codes::UNAUTHORIZED,
            ApiError::Validation { .. } => codes::VALIDATION_ERROR,
            ApiError::Server { .. } => codes::SERVER_ERROR,
            ApiError::Config(_) => codes::CONFIG_ERROR,
            ApiError::InvalidResponse(_) => codes::INVALID_RESPONSE,
            ApiError::InvalidInput(_) => codes::INVALID_INPUT,
            ApiError::StoreSleeping(_) => codes::STORE_SLEEPING,
            ApiError::Forbidden(_) => codes::FORBIDDEN,
            ApiError::Storage(_) => codes::STORAGE_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ApiError::Timeout { after } => format!(
                "The server did not respond within {} seconds.",
                after.as_secs_f64()
            ),
            ApiError::NotModified => "Not modified".to_string(),
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::Server { message, .. } => message.clone(),
            ApiError::NetworkUnavailable(msg)
            | ApiError::Auth(msg)
            | ApiError::Config(msg)
            | ApiError::InvalidResponse(msg)
            | ApiError::InvalidInput(msg)
            | ApiError::StoreSleeping(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Storage(msg) => msg.clone(),
        }
    }

    /// True for the conditional-GET cache-hit signal.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, ApiError::NotModified)
    }

    /// Text for a transient user notification.
    ///
    /// `NotModified` means "keep what you have" and is never shown.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ApiError::NotModified => None,
            other => Some(other.message()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Storage error: {:?}", err);
        ApiError::Storage(format!("Storage error: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ApiError::InvalidResponse(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            tracing::error!("Response body error: {:?}", err);
            return ApiError::InvalidResponse(format!("Failed to read response: {}", err));
        }
        tracing::error!("Network error: {:?}", err);
        if err.is_connect() || err.is_request() {
            ApiError::NetworkUnavailable(
                "Unable to connect to the server. Check that the backend is running and reachable."
                    .to_string(),
            )
        } else {
            ApiError::NetworkUnavailable(format!("Network error: {}", err))
        }
    }
}
