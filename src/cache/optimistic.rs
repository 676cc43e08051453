//! Speculative cache patches.
//!
//! A speculation writes the locally predicted outcome of a mutation into the
//! cache and marks the entry stale in the same step, so the patched value is
//! visible immediately and any later read goes back to the server. The caller
//! then refetches the key to reconcile.

use std::sync::Arc;

use super::{QueryCache, QueryKey};

/// Record of a speculative patch awaiting reconciliation with the server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a speculation must be reconciled by refetching its key"]
pub struct Speculation {
    key: QueryKey,
    applied: bool,
}

impl Speculation {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Whether the patch changed the cached value. `false` when nothing of
    /// the expected type was cached or the patch declined.
    pub fn applied(&self) -> bool {
        self.applied
    }
}

impl QueryCache {
    /// Apply `patch` to the cached value of `key` and mark it stale.
    ///
    /// The entry is marked stale even when the patch does not apply, since the
    /// mutation that prompted it has already reached the server.
    pub async fn speculate<T, F>(&self, key: QueryKey, patch: F) -> Speculation
    where
        T: Send + Sync + 'static,
        F: FnOnce(&T) -> Option<T>,
    {
        let applied = {
            let mut entries = self.entries.write().await;
            match entries.get_mut(&key) {
                Some(entry) => {
                    entry.invalidated = true;
                    match entry.data.downcast_ref::<T>().and_then(patch) {
                        Some(next) => {
                            let previous = std::mem::replace(&mut entry.data, Arc::new(next));
                            entry.confirmed.get_or_insert(previous);
                            true
                        }
                        None => false,
                    }
                }
                None => false,
            }
        };
        tracing::debug!(?key, applied, "Applied speculative patch");
        Speculation { key, applied }
    }
}
