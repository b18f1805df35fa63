//! Shared state for HTTP handlers.

use std::sync::Arc;

use crate::ProfileService;
use crate::auth::AuthProvider;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Profile, game record, settings and ranking operations.
    pub service: Arc<ProfileService>,
    /// Provider used by the auth callback.
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    /// Creates the state from a service and an auth provider.
    pub fn new(service: ProfileService, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            service: Arc::new(service),
            auth,
        }
    }
}
