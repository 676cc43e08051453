//! HTTP client for the storefront backend.
//!
//! [`ApiClient`] is the single chokepoint for every backend call: it builds
//! the URL, applies the header policy, enforces the timeout tier, runs the
//! catalog conditional GET and normalizes every failure into [`ApiError`].

pub mod dedup;
mod endpoint;
mod identity;

pub use dedup::RequestDeduplicator;
pub use endpoint::*;
pub use identity::*;

use once_cell::sync::OnceCell;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{ApiError, GENERIC_AUTH_MESSAGE, STALE_AUTH_MESSAGE};
use crate::models::{
    AddToCartRequest, AdminCategoryDetail, AdminOrdersResponse, BroadcastRequest,
    BroadcastResponse, Cart, CatalogResponse, Category, CategoryPayload, CreateOrderRequest, Order,
    OrderListQuery, Product, ProductPayload, RemoveCartItemRequest, StoreStatus,
    UpdateCartItemRequest, UpdateStatusRequest, UpdateStoreStatusRequest,
};
use crate::storage::ClientStorage;

/// Lower-cased fragments of backend 401 messages meaning the Telegram init data is stale.
pub const STALE_AUTH_MARKERS: &[&str] = &[
    "telegram",
    "устарел",
    "неверные данные",
    "недействительная подпись",
];

/// Legacy path segment of deployments that served the frontend under `/app`.
const LEGACY_API_SEGMENT: &str = "/app/api";

/// Body of an outgoing request.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Form),
}

/// Method, body, extra headers and query of an outgoing request.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn json<B: Serialize>(method: Method, body: &B) -> Result<Self, ApiError> {
        Ok(Self {
            method,
            body: RequestBody::Json(serde_json::to_value(body)?),
            ..Self::default()
        })
    }

    pub fn multipart(form: Form) -> Self {
        Self {
            method: Method::POST,
            body: RequestBody::Multipart(form),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }
}

/// Response payload, decoded according to its content type.
enum Payload {
    Json(Value),
    Text(String),
}

/// Successful response body plus the catalog ETag it was served with.
struct Exchange {
    value: Option<Value>,
    etag: Option<String>,
}

/// Typed client for the storefront REST API.
///
/// Cheap to clone; clones share the HTTP pool, the memoized base URL, the
/// storage handle and the in-flight request map.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<Config>,
    base_url: Arc<OnceCell<String>>,
    storage: Arc<dyn ClientStorage>,
    identity: Arc<dyn IdentityProvider>,
    dedup: Arc<RequestDeduplicator>,
    timeouts: TimeoutPolicy,
}

impl ApiClient {
    pub fn new(
        config: Arc<Config>,
        storage: Arc<dyn ClientStorage>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            base_url: Arc::new(OnceCell::new()),
            storage,
            identity,
            dedup: Arc::new(RequestDeduplicator::new()),
            timeouts: TimeoutPolicy::default(),
        }
    }

    /// Replace the timeout table.
    pub fn with_timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn timeouts(&self) -> TimeoutPolicy {
        self.timeouts
    }

    pub fn user_id(&self) -> Option<i64> {
        self.identity.user_id()
    }

    pub fn deduplicator(&self) -> &RequestDeduplicator {
        &self.dedup
    }

    /// Resolved base URL, computed on first use.
    pub fn base_url(&self) -> &str {
        self.base_url.get_or_init(|| {
            let configured = self.config.api_base_url.as_str();
            if configured.starts_with("http://") || configured.starts_with("https://") {
                configured.replacen(LEGACY_API_SEGMENT, "/api", 1)
            } else {
                format!("{}{}", self.config.public_url.trim_end_matches('/'), configured)
            }
        })
    }

    /// Send a request and decode the JSON response into `T`.
    ///
    /// A 204 decodes as JSON `null`, so `()` and `Option<_>` targets succeed.
    /// The catalog ETag is stored only once the body has decoded.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let Exchange { value, etag } = self.request_value(endpoint, options).await?;
        let decoded = serde_json::from_value(value.unwrap_or(Value::Null))?;

        if let Some(etag) = etag {
            if let Err(e) = self.storage.set_item(CATALOG_ETAG_KEY, &etag).await {
                tracing::warn!("Failed to persist catalog ETag: {}", e);
            }
        }

        Ok(decoded)
    }

    #[tracing::instrument(skip(self, options), fields(method = %options.method))]
    async fn request_value(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Exchange, ApiError> {
        let url = format!("{}{}", self.base_url(), endpoint);
        let timeout = self.timeouts.for_request(endpoint, &options.method);
        let headers = self.build_headers(endpoint, &options).await;

        let mut builder = self
            .http
            .request(options.method, url)
            .headers(headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        tracing::debug!(?timeout, "Sending request");
        match tokio::time::timeout(timeout, self.exchange(endpoint, builder)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(?timeout, "Request timed out");
                Err(ApiError::Timeout { after: timeout })
            }
        }
    }

    async fn build_headers(&self, endpoint: &str, options: &RequestOptions) -> HeaderMap {
        let mut headers = options.headers.clone();

        if !is_public(endpoint) {
            if let Some(user_id) = self.identity.user_id() {
                headers.insert(IDENTITY_HEADER, HeaderValue::from(user_id));
            }
        }

        if is_conditional(endpoint) {
            match self.storage.get_item(CATALOG_ETAG_KEY).await {
                Ok(Some(etag)) => match HeaderValue::from_str(&etag) {
                    Ok(value) => {
                        headers.insert(IF_NONE_MATCH, value);
                    }
                    Err(_) => tracing::warn!(%etag, "Ignoring unusable stored ETag"),
                },
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to read catalog ETag: {}", e),
            }
        }

        match options.body {
            // The HTTP stack writes the multipart boundary itself
            RequestBody::Multipart(_) => {
                headers.remove(CONTENT_TYPE);
            }
            _ => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
            }
        }

        headers
    }

    async fn exchange(
        &self,
        endpoint: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<Exchange, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(Exchange {
                value: None,
                etag: None,
            });
        }

        if status == StatusCode::NOT_MODIFIED && is_conditional(endpoint) {
            tracing::debug!("Catalog not modified");
            return Err(ApiError::NotModified);
        }

        let etag = response
            .headers()
            .get(ETAG)
            .filter(|_| is_conditional(endpoint))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        let payload = if is_json {
            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                Payload::Json(Value::Null)
            } else {
                Payload::Json(serde_json::from_slice(&bytes)?)
            }
        } else {
            Payload::Text(response.text().await?)
        };

        if !status.is_success() {
            return Err(error_from_response(status, &payload));
        }

        let value = match payload {
            Payload::Json(value) => value,
            Payload::Text(_) => {
                return Err(ApiError::Config(format!(
                    "The API returned a non-JSON response. Check that the API base URL ({}) points at the API.",
                    self.base_url()
                )));
            }
        };

        Ok(Exchange {
            value: Some(value),
            etag,
        })
    }

    /// Drop the stored catalog ETag so the next fetch is unconditional.
    pub async fn forget_catalog_etag(&self) -> Result<(), ApiError> {
        self.storage.remove_item(CATALOG_ETAG_KEY).await
    }

    pub async fn catalog_etag(&self) -> Result<Option<String>, ApiError> {
        self.storage.get_item(CATALOG_ETAG_KEY).await
    }

    // ==================== CLIENT API ====================

    /// GET /catalog, conditional on the stored ETag and deduplicated.
    pub async fn get_catalog(&self) -> Result<CatalogResponse, ApiError> {
        let client = self.clone();
        self.dedup
            .run("catalog", move || async move {
                client.request("/catalog", RequestOptions::get()).await
            })
            .await
    }

    /// GET /cart, deduplicated.
    pub async fn get_cart(&self) -> Result<Cart, ApiError> {
        let client = self.clone();
        self.dedup
            .run("cart", move || async move {
                client.request("/cart", RequestOptions::get()).await
            })
            .await
    }

    pub async fn add_to_cart(&self, data: &AddToCartRequest) -> Result<Cart, ApiError> {
        self.request("/cart", RequestOptions::json(Method::POST, data)?)
            .await
    }

    pub async fn update_cart_item(&self, data: &UpdateCartItemRequest) -> Result<Cart, ApiError> {
        self.request("/cart/item", RequestOptions::json(Method::PATCH, data)?)
            .await
    }

    pub async fn remove_cart_item(&self, data: &RemoveCartItemRequest) -> Result<Cart, ApiError> {
        self.request("/cart/item", RequestOptions::json(Method::DELETE, data)?)
            .await
    }

    /// POST /order as multipart with the payment receipt attached.
    pub async fn create_order(&self, data: &CreateOrderRequest) -> Result<Order, ApiError> {
        let receipt = &data.payment_receipt;
        let part = Part::bytes(receipt.bytes.clone())
            .file_name(receipt.file_name.clone())
            .mime_str(&receipt.mime_type)
            .map_err(|e| ApiError::InvalidInput(format!("Invalid receipt type: {}", e)))?;

        let mut form = Form::new()
            .text("name", data.name.clone())
            .text("phone", data.phone.clone())
            .text("address", data.address.clone());
        let optional = [
            ("comment", &data.comment),
            ("delivery_type", &data.delivery_type),
            ("payment_type", &data.payment_type),
        ];
        for (field, value) in optional {
            if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                form = form.text(field, value.clone());
            }
        }
        let form = form.part("payment_receipt", part);

        self.request("/order", RequestOptions::multipart(form)).await
    }

    pub async fn get_store_status(&self) -> Result<StoreStatus, ApiError> {
        let client = self.clone();
        self.dedup
            .run("store-status", move || async move {
                client.request("/store/status", RequestOptions::get()).await
            })
            .await
    }

    // ==================== ADMIN API ====================

    pub async fn get_orders(&self, query: &OrderListQuery) -> Result<AdminOrdersResponse, ApiError> {
        self.request("/admin/orders", RequestOptions::get().query(query.to_pairs()))
            .await
    }

    pub async fn get_admin_order(&self, order_id: &str) -> Result<Order, ApiError> {
        self.request(&format!("/admin/order/{}", order_id), RequestOptions::get())
            .await
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        data: &UpdateStatusRequest,
    ) -> Result<Order, ApiError> {
        self.request(
            &format!("/admin/order/{}/status", order_id),
            RequestOptions::json(Method::PATCH, data)?,
        )
        .await
    }

    pub async fn delete_order(&self, order_id: &str) -> Result<(), ApiError> {
        self.request(&format!("/admin/order/{}", order_id), RequestOptions::delete())
            .await
    }

    pub async fn get_admin_catalog(&self) -> Result<CatalogResponse, ApiError> {
        self.request("/admin/catalog", RequestOptions::get()).await
    }

    pub async fn get_admin_category(
        &self,
        category_id: &str,
    ) -> Result<AdminCategoryDetail, ApiError> {
        self.request(
            &format!("/admin/category/{}", category_id),
            RequestOptions::get(),
        )
        .await
    }

    pub async fn create_product(&self, data: &ProductPayload) -> Result<Product, ApiError> {
        self.request("/admin/product", RequestOptions::json(Method::POST, data)?)
            .await
    }

    pub async fn update_product(
        &self,
        product_id: &str,
        data: &ProductPayload,
    ) -> Result<Product, ApiError> {
        self.request(
            &format!("/admin/product/{}", product_id),
            RequestOptions::json(Method::PATCH, data)?,
        )
        .await
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<(), ApiError> {
        self.request(
            &format!("/admin/product/{}", product_id),
            RequestOptions::delete(),
        )
        .await
    }

    pub async fn create_category(&self, data: &CategoryPayload) -> Result<Category, ApiError> {
        self.request("/admin/category", RequestOptions::json(Method::POST, data)?)
            .await
    }

    pub async fn update_category(
        &self,
        category_id: &str,
        data: &CategoryPayload,
    ) -> Result<Category, ApiError> {
        self.request(
            &format!("/admin/category/{}", category_id),
            RequestOptions::json(Method::PATCH, data)?,
        )
        .await
    }

    pub async fn delete_category(&self, category_id: &str) -> Result<(), ApiError> {
        self.request(
            &format!("/admin/category/{}", category_id),
            RequestOptions::delete(),
        )
        .await
    }

    pub async fn send_broadcast(&self, data: &BroadcastRequest) -> Result<BroadcastResponse, ApiError> {
        self.request("/admin/broadcast", RequestOptions::json(Method::POST, data)?)
            .await
    }

    pub async fn set_store_sleep_mode(
        &self,
        data: &UpdateStoreStatusRequest,
    ) -> Result<StoreStatus, ApiError> {
        self.request(
            "/admin/store/sleep",
            RequestOptions::json(Method::PATCH, data)?,
        )
        .await
    }

    // ==================== DERIVED URLS ====================

    /// URL of a product image.
    ///
    /// Data URLs and absolute URLs pass through; anything else is a stored
    /// file id served by the backend.
    pub fn product_image_url(&self, image: &str) -> Option<String> {
        let image = image.trim();
        if image.is_empty() {
            return None;
        }
        if image.starts_with("data:image")
            || image.starts_with("http://")
            || image.starts_with("https://")
        {
            return Some(image.to_string());
        }
        Some(format!(
            "{}/product/image/{}",
            self.base_url().trim_end_matches('/'),
            image
        ))
    }

    /// URL of an order's payment receipt, when one was uploaded.
    pub fn order_receipt_url(&self, order: &Order) -> Option<String> {
        order.payment_receipt_file_id.as_ref()?;
        Some(format!(
            "{}/admin/order/{}/receipt",
            self.base_url().trim_end_matches('/'),
            order.id
        ))
    }
}

/// Build the error for a non-success response.
fn error_from_response(status: StatusCode, payload: &Payload) -> ApiError {
    if status == StatusCode::UNAUTHORIZED {
        return match backend_message(payload) {
            Some(message) => {
                let lower = message.to_lowercase();
                if STALE_AUTH_MARKERS.iter().any(|marker| lower.contains(marker)) {
                    ApiError::Auth(STALE_AUTH_MESSAGE.to_string())
                } else {
                    ApiError::Auth(message)
                }
            }
            None => ApiError::Auth(GENERIC_AUTH_MESSAGE.to_string()),
        };
    }

    let message = error_message(status, payload);
    if status.is_client_error() {
        ApiError::Validation {
            status: status.as_u16(),
            message,
        }
    } else if status.is_server_error() {
        ApiError::Server {
            status: status.as_u16(),
            message,
        }
    } else {
        ApiError::InvalidResponse(format!("Unexpected response status: {}", message))
    }
}

/// Human-readable error text, falling back to the status line when the body has none.
fn error_message(status: StatusCode, payload: &Payload) -> String {
    backend_message(payload).unwrap_or_else(|| {
        format!(
            "API request failed: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string()
    })
}

/// Error text the backend sent: `detail`, then `message`, then `error`, then the raw body.
fn backend_message(payload: &Payload) -> Option<String> {
    match payload {
        Payload::Json(Value::Null) => None,
        Payload::Json(body) => ["detail", "message", "error"]
            .iter()
            .filter_map(|field| body.get(field))
            .find_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::String(_) | Value::Null | Value::Bool(false) => None,
                other => Some(other.to_string()),
            })
            .or_else(|| Some(body.to_string())),
        Payload::Text(text) if !text.trim().is_empty() => Some(text.clone()),
        Payload::Text(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn client_for(api_base_url: &str) -> ApiClient {
        let config = Config {
            api_base_url: api_base_url.to_string(),
            ..Config::from_lookup(|_| None)
        };
        ApiClient::new(
            Arc::new(config),
            Arc::new(MemoryStorage::new()),
            Arc::new(StaticIdentity(None)),
        )
    }

    #[test]
    fn test_base_url_rewrites_legacy_segment_once() {
        let client = client_for("https://shop.example.com/app/api");
        assert_eq!(client.base_url(), "https://shop.example.com/api");
        // Memoized for the client and its clones
        assert!(std::ptr::eq(client.base_url(), client.clone().base_url()));
    }

    #[test]
    fn test_relative_base_url_joins_origin() {
        let client = client_for("/api");
        assert_eq!(client.base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn test_error_message_field_precedence() {
        let status = StatusCode::BAD_REQUEST;
        let body = json!({"error": "e", "message": "m", "detail": "d"});
        assert_eq!(error_message(status, &Payload::Json(body)), "d");

        let body = json!({"error": "e", "message": "m"});
        assert_eq!(error_message(status, &Payload::Json(body)), "m");

        let body = json!({"error": "e", "detail": ""});
        assert_eq!(error_message(status, &Payload::Json(body)), "e");

        let body = json!({"code": 17});
        assert_eq!(error_message(status, &Payload::Json(body)), "{\"code\":17}");

        assert_eq!(
            error_message(status, &Payload::Text("bad gateway page".to_string())),
            "bad gateway page"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, &Payload::Text(String::new())),
            "API request failed: 404 Not Found"
        );
    }

    #[test]
    fn test_structured_detail_is_serialized() {
        let body = json!({"detail": [{"loc": ["body", "quantity"], "msg": "field required"}]});
        let message = error_message(StatusCode::UNPROCESSABLE_ENTITY, &Payload::Json(body));
        assert!(message.contains("field required"));
    }

    #[test]
    fn test_error_classification() {
        let stale = error_from_response(
            StatusCode::UNAUTHORIZED,
            &Payload::Json(json!({"detail": "Данные Telegram устарели"})),
        );
        assert_eq!(stale, ApiError::Auth(STALE_AUTH_MESSAGE.to_string()));

        let other = error_from_response(
            StatusCode::UNAUTHORIZED,
            &Payload::Json(json!({"detail": "Missing header"})),
        );
        assert_eq!(other, ApiError::Auth("Missing header".to_string()));

        let validation = error_from_response(
            StatusCode::CONFLICT,
            &Payload::Json(json!({"detail": "Not enough stock"})),
        );
        assert_eq!(
            validation,
            ApiError::Validation {
                status: 409,
                message: "Not enough stock".to_string()
            }
        );

        let server = error_from_response(
            StatusCode::BAD_GATEWAY,
            &Payload::Text(String::new()),
        );
        assert!(matches!(server, ApiError::Server { status: 502, .. }));
    }

    #[test]
    fn test_bodyless_unauthorized_is_generic() {
        let empty = error_from_response(StatusCode::UNAUTHORIZED, &Payload::Text(String::new()));
        assert_eq!(empty, ApiError::Auth(GENERIC_AUTH_MESSAGE.to_string()));

        let null = error_from_response(StatusCode::UNAUTHORIZED, &Payload::Json(Value::Null));
        assert_eq!(null, ApiError::Auth(GENERIC_AUTH_MESSAGE.to_string()));
    }

    #[test]
    fn test_unexpected_status_is_not_a_server_error() {
        let redirect = error_from_response(StatusCode::NOT_MODIFIED, &Payload::Text(String::new()));
        assert_eq!(
            redirect,
            ApiError::InvalidResponse(
                "Unexpected response status: API request failed: 304 Not Modified".to_string()
            )
        );

        let moved = error_from_response(
            StatusCode::MOVED_PERMANENTLY,
            &Payload::Text("<html>moved</html>".to_string()),
        );
        assert!(matches!(moved, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_product_image_url() {
        let client = client_for("https://shop.example.com/api");
        assert_eq!(client.product_image_url("  "), None);
        assert_eq!(
            client.product_image_url("data:image/png;base64,AAAA").as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(
            client.product_image_url("https://cdn.example.com/a.jpg").as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert_eq!(
            client.product_image_url("65f1c0ffee65f1c0ffee65f1").as_deref(),
            Some("https://shop.example.com/api/product/image/65f1c0ffee65f1c0ffee65f1")
        );
    }
}
