//! Durable client storage.
//!
//! A small string key/value store that outlives the process, used for the
//! catalog ETag. SQLite is the durable backend; [`MemoryStorage`] serves tests
//! and sessions that should not persist anything.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use crate::errors::ApiError;

/// Key/value storage that survives between client sessions.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, ApiError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), ApiError>;

    async fn remove_item(&self, key: &str) -> Result<(), ApiError>;
}

/// Initialize the storage connection pool and run migrations.
pub async fn init_storage(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run storage migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS client_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
