//! Data models for the storefront client.
//!
//! These mirror the backend's JSON schema (snake_case field names) and carry
//! no behavior beyond small derived views.

mod cart;
mod catalog;
mod order;
mod store;

pub use cart::*;
pub use catalog::*;
pub use order::*;
pub use store::*;
