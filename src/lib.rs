//! Storefront client
//!
//! Client layer of the Telegram Mini App storefront: a typed REST client with
//! request deduplication, ETag-conditional catalog fetching and tiered
//! timeouts, plus a query cache with optimistic cart and catalog updates.

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod storage;
pub mod storefront;

pub use cache::{QueryCache, QueryKey, QueryOptions, Speculation};
pub use client::{ApiClient, IdentityProvider, SessionIdentity, StaticIdentity};
pub use config::Config;
pub use errors::ApiError;
pub use storage::{ClientStorage, MemoryStorage, SqliteStorage};
pub use storefront::{AdminConsole, Storefront};
