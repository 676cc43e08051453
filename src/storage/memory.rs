//! In-memory client storage.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::ClientStorage;
use crate::errors::ApiError;

/// Storage that lives only as long as the value.
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, ApiError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), ApiError> {
        self.items.write().await.remove(key);
        Ok(())
    }
}
