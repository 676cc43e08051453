//! Storefront client smoke run
//!
//! Resolves configuration, warms the critical queries against the configured
//! backend and logs what it found.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_client::{ApiClient, Config, SqliteStorage, StaticIdentity, Storefront};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting storefront client");
    tracing::info!("API base URL: {}", config.api_base_url);
    tracing::info!("Storage path: {:?}", config.storage_path);

    if config.uses_relative_api_url() {
        tracing::warn!(
            "API URL is relative; requests go to {}. Set NEXT_PUBLIC_API_URL for a separate backend.",
            config.public_url
        );
    }
    if config.admin_ids.is_empty() {
        tracing::warn!("No admin ids configured (VITE_ADMIN_IDS). The admin console is disabled!");
    }

    let storage = Arc::new(SqliteStorage::open(&config.storage_path).await?);
    let identity = Arc::new(StaticIdentity(config.dev_user_id));
    let config = Arc::new(config);

    let api = ApiClient::new(config.clone(), storage, identity);
    tracing::info!("Resolved base URL: {}", api.base_url());

    let storefront = Storefront::new(config, api);
    storefront.prefetch_critical().await;

    let status = storefront.store_status().await?;
    match status.sleep_notice() {
        Some(notice) => tracing::info!("Store is in sleep mode: {}", notice),
        None => tracing::info!("Store is accepting orders"),
    }

    let catalog = storefront.catalog().await?;
    tracing::info!(
        "Catalog loaded with {} categories and {} products",
        catalog.categories.len(),
        catalog.products.len()
    );
    if let Some(etag) = storefront.api().catalog_etag().await? {
        tracing::info!("Catalog ETag: {}", etag);
    }

    if storefront.is_admin() {
        tracing::info!("Current user is a store administrator");
    }

    Ok(())
}
