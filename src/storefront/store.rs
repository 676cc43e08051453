//! Store status: the sleep-mode banner and the ordering guard.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Storefront;
use crate::cache::{QueryKey, QueryOptions};
use crate::errors::ApiError;
use crate::models::StoreStatus;

/// Polling period matching the store status freshness window.
pub const STORE_STATUS_POLL_INTERVAL: Duration = QueryOptions::STORE_STATUS.stale_time;

impl Storefront {
    pub async fn store_status(&self) -> Result<StoreStatus, ApiError> {
        self.cache
            .fetch_query(QueryKey::StoreStatus, QueryOptions::STORE_STATUS, || {
                self.api.get_store_status()
            })
            .await
    }

    pub async fn refresh_store_status(&self) -> Result<StoreStatus, ApiError> {
        self.cache
            .refetch_query(QueryKey::StoreStatus, QueryOptions::STORE_STATUS, || {
                self.api.get_store_status()
            })
            .await
    }

    /// Poll the store status every `period` and publish it.
    ///
    /// The receiver starts with the cached status, if any. Polling stops once
    /// every receiver is dropped.
    pub async fn watch_store_status(
        &self,
        period: Duration,
    ) -> (watch::Receiver<Option<StoreStatus>>, JoinHandle<()>) {
        let initial = self
            .cache
            .get_query_data::<StoreStatus>(&QueryKey::StoreStatus)
            .await;
        let (tx, rx) = watch::channel(initial);
        let storefront = self.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                match storefront.refresh_store_status().await {
                    Ok(status) => {
                        tx.send_if_modified(|current| {
                            if current.as_ref() == Some(&status) {
                                false
                            } else {
                                *current = Some(status);
                                true
                            }
                        });
                    }
                    Err(e) => tracing::warn!("Failed to poll store status: {}", e),
                }
            }
            tracing::debug!("Store status watcher stopped");
        });

        (rx, handle)
    }

    /// Refuse ordering while the store sleeps.
    ///
    /// An unreachable status endpoint does not block the user; the backend
    /// rejects orders during sleep mode on its own.
    pub(crate) async fn ensure_accepting_orders(&self) -> Result<(), ApiError> {
        match self.store_status().await {
            Ok(status) => match status.sleep_notice() {
                Some(notice) => Err(ApiError::StoreSleeping(notice.to_string())),
                None => Ok(()),
            },
            Err(e) => {
                tracing::debug!("Store status unavailable, not blocking: {}", e);
                Ok(())
            }
        }
    }
}
