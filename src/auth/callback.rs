//! Resolution of the `/auth/callback` redirect.

use tracing::{info, instrument, warn};

use crate::auth::{AuthErrorKind, AuthProvider, AuthSession};

/// Where the callback sends the browser next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CallbackRedirect {
    /// A session was issued.
    #[strum(to_string = "/auth")]
    SignedIn,
    /// The code was accepted without a session.
    #[strum(to_string = "/auth?message=email_confirmed")]
    EmailConfirmed,
    /// The provider rejected the code.
    #[strum(to_string = "/auth?error=callback_error")]
    CallbackError,
    /// Anything else went wrong.
    #[strum(to_string = "/auth?error=unknown_error")]
    UnknownError,
}

impl CallbackRedirect {
    /// Redirect target path and query.
    pub fn location(&self) -> String {
        self.to_string()
    }
}

/// Redirect plus the session that was obtained, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    /// Where to send the browser.
    pub redirect: CallbackRedirect,
    /// Session to keep when signed in.
    pub session: Option<AuthSession>,
}

/// Exchanges the callback `code` and decides the redirect.
#[instrument(skip(provider, code), fields(has_code = code.is_some()))]
pub async fn resolve_callback<P>(provider: &P, code: Option<&str>) -> CallbackOutcome
where
    P: AuthProvider + ?Sized,
{
    let Some(code) = code.filter(|c| !c.trim().is_empty()) else {
        warn!("Callback without code");
        return CallbackOutcome {
            redirect: CallbackRedirect::UnknownError,
            session: None,
        };
    };

    let (redirect, session) = match provider.exchange_code(code).await {
        Ok(Some(session)) => (CallbackRedirect::SignedIn, Some(session)),
        Ok(None) => (CallbackRedirect::EmailConfirmed, None),
        Err(e) if e.kind == AuthErrorKind::Provider => {
            warn!(error = %e, "Callback code rejected");
            (CallbackRedirect::CallbackError, None)
        }
        Err(e) => {
            warn!(error = %e, "Callback exchange failed");
            (CallbackRedirect::UnknownError, None)
        }
    };

    info!(redirect = %redirect, "Callback resolved");
    CallbackOutcome { redirect, session }
}
