//! Endpoint classification: timeout tiers, public allow-list, conditional GET.

use reqwest::Method;
use std::time::Duration;

/// Endpoints served without the identity header so they stay anonymous and cacheable.
pub const PUBLIC_ENDPOINTS: &[&str] = &["/catalog", "/store/status"];

/// The single endpoint fetched with `If-None-Match`.
pub const CONDITIONAL_ENDPOINT: &str = "/catalog";

/// Storage key for the last catalog ETag.
pub const CATALOG_ETAG_KEY: &str = "catalog-etag";

/// Whether `endpoint` is on the public allow-list.
pub fn is_public(endpoint: &str) -> bool {
    let path = path_of(endpoint);
    PUBLIC_ENDPOINTS.iter().any(|public| path.starts_with(public))
}

/// Whether `endpoint` uses the ETag conditional GET.
pub fn is_conditional(endpoint: &str) -> bool {
    path_of(endpoint) == CONDITIONAL_ENDPOINT
}

fn path_of(endpoint: &str) -> &str {
    endpoint.split('?').next().unwrap_or(endpoint)
}

/// Timeout class of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutTier {
    /// Fan-out to many recipients
    Broadcast,
    /// Catalog and admin order list payloads
    Large,
    /// Deletes are expected to be fast
    Delete,
    Default,
}

impl TimeoutTier {
    /// Classify a request. The first matching rule wins.
    pub fn classify(endpoint: &str, method: &Method) -> Self {
        let path = path_of(endpoint);
        if path.contains("/admin/broadcast") {
            TimeoutTier::Broadcast
        } else if path.contains("/catalog") || path.contains("/admin/orders") {
            TimeoutTier::Large
        } else if *method == Method::DELETE {
            TimeoutTier::Delete
        } else {
            TimeoutTier::Default
        }
    }
}

/// Timeout per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub broadcast: Duration,
    pub large: Duration,
    pub delete: Duration,
    pub default: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            broadcast: Duration::from_secs(120),
            large: Duration::from_secs(8),
            delete: Duration::from_secs(3),
            default: Duration::from_secs(5),
        }
    }
}

impl TimeoutPolicy {
    pub fn for_tier(&self, tier: TimeoutTier) -> Duration {
        match tier {
            TimeoutTier::Broadcast => self.broadcast,
            TimeoutTier::Large => self.large,
            TimeoutTier::Delete => self.delete,
            TimeoutTier::Default => self.default,
        }
    }

    pub fn for_request(&self, endpoint: &str, method: &Method) -> Duration {
        self.for_tier(TimeoutTier::classify(endpoint, method))
    }
}
