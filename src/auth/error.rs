//! Authentication error types.

use derive_more::{Display, Error};

/// What part of the auth flow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AuthErrorKind {
    /// The provider answered with an error.
    #[display("provider")]
    Provider,
    /// The provider could not be reached or answered with something unreadable.
    #[display("transport")]
    Transport,
    /// The local auth store could not be read or written.
    #[display("storage")]
    Storage,
}

/// Authentication error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Auth {} error: {} at {}:{}", kind, message, file, line)]
pub struct AuthError {
    /// Failure category.
    pub kind: AuthErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl AuthError {
    /// Creates a new auth error with caller location tracking.
    #[track_caller]
    pub fn new(kind: AuthErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Provider-reported failure.
    #[track_caller]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Provider, message)
    }

    /// Network or decoding failure.
    #[track_caller]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Transport, message)
    }

    /// Local persistence failure.
    #[track_caller]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::Storage, message)
    }
}

impl From<reqwest::Error> for AuthError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        Self::transport(format!("HTTP error: {}", err))
    }
}
