//! Authenticated user and session shapes.

use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// Identity reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Tokens for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct AuthSession {
    access_token: String,
    refresh_token: String,
    /// Expiry as unix seconds.
    expires_at: i64,
    user: AuthUser,
}

impl AuthSession {
    /// Whether the access token has expired at `now` (unix seconds).
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}
