//! SQLite-backed client storage.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use super::{init_storage, ClientStorage};
use crate::errors::ApiError;

/// Client storage persisted in a SQLite file.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the storage file at `path`.
    pub async fn open(path: &Path) -> Result<Self, ApiError> {
        let pool = init_storage(path).await?;
        Ok(Self::new(pool))
    }

    /// When the item was last written, as RFC 3339.
    pub async fn updated_at(&self, key: &str) -> Result<Option<String>, ApiError> {
        let row = sqlx::query("SELECT updated_at FROM client_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("updated_at")))
    }
}

#[async_trait]
impl ClientStorage for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, ApiError> {
        let row = sqlx::query("SELECT value FROM client_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), ApiError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO client_storage (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM client_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
