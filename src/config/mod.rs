//! Configuration module for the storefront client.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! Each setting lists its source keys in precedence order; the first key with a
//! non-blank value wins.

use std::env;
use std::path::PathBuf;

/// Source keys for the API base URL.
pub const API_URL_KEYS: &[&str] = &[
    "NEXT_PUBLIC_API_URL",
    "NEXT_PUBLIC_VITE_API_URL",
    "VITE_API_URL",
];

/// Source keys for the comma-separated admin id allow-list.
pub const ADMIN_IDS_KEYS: &[&str] = &["NEXT_PUBLIC_VITE_ADMIN_IDS", "VITE_ADMIN_IDS"];

/// Source keys for the public origin the app is served from.
pub const PUBLIC_URL_KEYS: &[&str] = &[
    "NEXT_PUBLIC_VITE_PUBLIC_URL",
    "VITE_PUBLIC_URL",
    "RAILWAY_PUBLIC_DOMAIN",
];

/// Source keys for the development user id sent as `X-Dev-User-Id`.
pub const DEV_USER_ID_KEYS: &[&str] = &["STOREFRONT_DEV_USER_ID", "DEV_USER_ID"];

pub const STORAGE_PATH_KEYS: &[&str] = &["STOREFRONT_STORAGE_PATH"];

pub const LOG_LEVEL_KEYS: &[&str] = &["STOREFRONT_LOG_LEVEL"];

pub const DEFAULT_API_URL: &str = "/api";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_STORAGE_PATH: &str = "./data/client.sqlite";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Normalized API base URL, absolute or origin-relative (always ends in `/api`)
    pub api_base_url: String,
    /// Origin used to resolve a relative API base URL
    pub public_url: String,
    /// Telegram user ids with access to the admin console
    pub admin_ids: Vec<i64>,
    /// Identity to use outside of Telegram (local development)
    pub dev_user_id: Option<i64>,
    /// Path to the SQLite file backing durable client storage
    pub storage_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = normalize_api_base_url(
            &resolve(API_URL_KEYS, &lookup).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        );

        let public_url = normalize_public_url(
            &resolve(PUBLIC_URL_KEYS, &lookup).unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string()),
        );

        let admin_ids = resolve(ADMIN_IDS_KEYS, &lookup)
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default();

        let dev_user_id = resolve(DEV_USER_ID_KEYS, &lookup).and_then(|raw| raw.parse().ok());

        let storage_path = resolve(STORAGE_PATH_KEYS, &lookup)
            .unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_string())
            .into();

        let log_level =
            resolve(LOG_LEVEL_KEYS, &lookup).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        Self {
            api_base_url,
            public_url,
            admin_ids,
            dev_user_id,
            storage_path,
            log_level,
        }
    }

    /// Whether the given user id is on the admin allow-list.
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Whether the API base URL is origin-relative.
    pub fn uses_relative_api_url(&self) -> bool {
        self.api_base_url.starts_with('/')
    }
}

/// Return the first non-blank value among `keys`, stripped of surrounding quotes.
pub fn resolve<F>(keys: &[&str], lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(key))
        .map(|value| clean_value(&value))
        .find(|value| !value.is_empty())
}

fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix(['"', '\''])
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(['"', '\'']).unwrap_or(trimmed);
    trimmed.trim().to_string()
}

/// Normalize the API base URL so it always ends in `/api`.
///
/// Absolute URLs lose a trailing slash, origin-relative paths are kept, bare
/// hosts get `https://`. A frontend deployed under `/app` is folded back to the
/// API root.
pub fn normalize_api_base_url(raw: &str) -> String {
    let value = clean_value(raw);

    let base = if value.is_empty() {
        DEFAULT_API_URL.to_string()
    } else if value.starts_with("http://") || value.starts_with("https://") {
        value.trim_end_matches('/').to_string()
    } else if value.starts_with('/') {
        value
    } else {
        format!("https://{}", value.trim_start_matches('/'))
    };

    let mut base = base.replace("/app/api", "/api");
    if let Some(stripped) = base.strip_suffix("/app") {
        base = stripped.to_string();
    }

    if !base.ends_with("/api") {
        base = format!("{}/api", base.trim_end_matches('/'));
    }

    base
}

/// Normalize the public origin, adding `https://` when the scheme is missing.
pub fn normalize_public_url(raw: &str) -> String {
    let value = clean_value(raw);
    if value.is_empty() {
        return DEFAULT_PUBLIC_URL.to_string();
    }
    let value = value.trim_end_matches('/');
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("https://{}", value)
    }
}

/// Parse a comma-separated id list, ignoring entries that are not integers.
pub fn parse_admin_ids(raw: &str) -> Vec<i64> {
    clean_value(raw)
        .split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect()
}
