//! Authentication: provider seam, callback redirects and the persisted store.

mod callback;
mod error;
mod provider;
mod session;
mod store;

pub use callback::{CallbackOutcome, CallbackRedirect, resolve_callback};
pub use error::{AuthError, AuthErrorKind};
pub use provider::{AuthProvider, HostedAuthClient};
pub use session::{AuthSession, AuthUser};
pub use store::{AuthStore, PersistedAuth};
