//! Identity of the current user.
//!
//! Inside Telegram the id comes from the WebApp init data; outside it a
//! development id from configuration stands in.

use std::sync::RwLock;

/// Header carrying the user id on authenticated endpoints (`X-Dev-User-Id`).
pub const IDENTITY_HEADER: &str = "x-dev-user-id";

/// Source of the current user's id.
pub trait IdentityProvider: Send + Sync {
    fn user_id(&self) -> Option<i64>;
}

/// Fixed identity, `None` for an anonymous session.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticIdentity(pub Option<i64>);

impl IdentityProvider for StaticIdentity {
    fn user_id(&self) -> Option<i64> {
        self.0
    }
}

/// Identity that the host can set once the WebApp has initialized.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    user_id: RwLock<Option<i64>>,
}

impl SessionIdentity {
    pub fn new(user_id: Option<i64>) -> Self {
        Self {
            user_id: RwLock::new(user_id),
        }
    }

    pub fn set(&self, user_id: Option<i64>) {
        let mut guard = self.user_id.write().unwrap_or_else(|e| e.into_inner());
        *guard = user_id;
    }
}

impl IdentityProvider for SessionIdentity {
    fn user_id(&self) -> Option<i64> {
        *self.user_id.read().unwrap_or_else(|e| e.into_inner())
    }
}
