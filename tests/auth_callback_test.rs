//! Tests for auth callback redirect resolution.

use stacktris::{
    AuthError, AuthProvider, AuthSession, AuthUser, CallbackRedirect, resolve_callback,
};

/// Provider that answers every exchange the same way.
enum FakeProvider {
    Session,
    NoSession,
    Rejects,
    Unreachable,
}

fn session() -> AuthSession {
    AuthSession::new(
        "access".to_string(),
        "refresh".to_string(),
        1_900_000_000,
        AuthUser::new("uid-1".to_string(), Some("neo@example.com".to_string())),
    )
}

#[async_trait::async_trait]
impl AuthProvider for FakeProvider {
    async fn exchange_code(&self, _code: &str) -> Result<Option<AuthSession>, AuthError> {
        match self {
            FakeProvider::Session => Ok(Some(session())),
            FakeProvider::NoSession => Ok(None),
            FakeProvider::Rejects => Err(AuthError::provider("invalid flow state")),
            FakeProvider::Unreachable => Err(AuthError::transport("connection refused")),
        }
    }

    async fn get_session(&self, _access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_valid_session_redirects_to_auth() {
    let outcome = resolve_callback(&FakeProvider::Session, Some("code-1")).await;
    assert_eq!(outcome.redirect, CallbackRedirect::SignedIn);
    assert_eq!(outcome.redirect.location(), "/auth");
    assert_eq!(outcome.session, Some(session()));
}

#[tokio::test]
async fn test_no_session_redirects_to_email_confirmed() {
    let outcome = resolve_callback(&FakeProvider::NoSession, Some("code-1")).await;
    assert_eq!(outcome.redirect.location(), "/auth?message=email_confirmed");
    assert!(outcome.session.is_none());
}

#[tokio::test]
async fn test_provider_error_redirects_to_callback_error() {
    let outcome = resolve_callback(&FakeProvider::Rejects, Some("code-1")).await;
    assert_eq!(outcome.redirect.location(), "/auth?error=callback_error");
    assert!(outcome.session.is_none());
}

#[tokio::test]
async fn test_transport_failure_redirects_to_unknown_error() {
    let outcome = resolve_callback(&FakeProvider::Unreachable, Some("code-1")).await;
    assert_eq!(outcome.redirect.location(), "/auth?error=unknown_error");
}

#[tokio::test]
async fn test_missing_code_redirects_to_unknown_error() {
    let outcome = resolve_callback(&FakeProvider::Session, None).await;
    assert_eq!(outcome.redirect, CallbackRedirect::UnknownError);

    let blank = resolve_callback(&FakeProvider::Session, Some("")).await;
    assert_eq!(blank.redirect, CallbackRedirect::UnknownError);
}

#[test]
fn test_session_expiry() {
    let s = session();
    assert!(!s.is_expired(1_899_999_999));
    assert!(s.is_expired(1_900_000_000));
}
