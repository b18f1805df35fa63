//! Client-side auth state, persisted as JSON.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::auth::{AuthError, AuthProvider, AuthSession, AuthUser};

/// The persisted subset of [`AuthStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuth {
    /// Signed-in user.
    pub user: Option<AuthUser>,
    /// Current session.
    pub session: Option<AuthSession>,
}

/// Current user, session and loading flag.
///
/// Every change to `user` or `session` is written through to the backing
/// file when one is set. `loading` stays in memory.
#[derive(Debug, Clone, Default)]
pub struct AuthStore {
    user: Option<AuthUser>,
    session: Option<AuthSession>,
    loading: bool,
    path: Option<PathBuf>,
}

impl AuthStore {
    /// Creates an empty store with no backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store persisted at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the file exists but cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref().to_path_buf();
        let persisted = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| AuthError::storage(format!("Failed to read auth store: {}", e)))?;
            serde_json::from_str::<PersistedAuth>(&content)
                .map_err(|e| AuthError::storage(format!("Failed to parse auth store: {}", e)))?
        } else {
            debug!("No persisted auth state");
            PersistedAuth::default()
        };

        info!(signed_in = persisted.session.is_some(), "Auth store opened");
        Ok(Self {
            user: persisted.user,
            session: persisted.session,
            loading: false,
            path: Some(path),
        })
    }

    /// Signed-in user.
    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// Current session.
    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    /// Whether an auth request is in flight.
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Replaces the user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if persisting fails.
    #[instrument(skip(self, user))]
    pub fn set_user(&mut self, user: Option<AuthUser>) -> Result<(), AuthError> {
        self.user = user;
        self.persist()
    }

    /// Replaces the session. A new session also sets its user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if persisting fails.
    #[instrument(skip(self, session), fields(has_session = session.is_some()))]
    pub fn set_session(&mut self, session: Option<AuthSession>) -> Result<(), AuthError> {
        if let Some(ref s) = session {
            self.user = Some(s.user().clone());
        }
        self.session = session;
        self.persist()
    }

    /// Sets the in-flight flag.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Clears user and session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if persisting fails.
    #[instrument(skip(self))]
    pub fn sign_out(&mut self) -> Result<(), AuthError> {
        self.user = None;
        self.session = None;
        info!("Signed out");
        self.persist()
    }

    /// Checks the stored session against `provider` and returns the user it
    /// belongs to. An expired token, or one the provider no longer accepts,
    /// signs the store out. Without a session there is nothing to check.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the provider cannot be reached or persisting
    /// fails. The store is left unchanged when the provider errors.
    #[instrument(skip(self, provider))]
    pub async fn verify(
        &mut self,
        provider: &dyn AuthProvider,
        now: i64,
    ) -> Result<Option<AuthUser>, AuthError> {
        let Some(session) = self.session.clone() else {
            debug!("No session to verify");
            return Ok(None);
        };
        if session.is_expired(now) {
            warn!(expires_at = session.expires_at(), "Stored session expired");
            self.sign_out()?;
            return Ok(None);
        }
        match provider.get_session(session.access_token()).await? {
            Some(user) => {
                if self.user.as_ref() != Some(&user) {
                    self.set_user(Some(user.clone()))?;
                }
                Ok(Some(user))
            }
            None => {
                warn!("Stored session was revoked");
                self.sign_out()?;
                Ok(None)
            }
        }
    }

    /// Snapshot of what gets written to disk.
    pub fn persisted(&self) -> PersistedAuth {
        PersistedAuth {
            user: self.user.clone(),
            session: self.session.clone(),
        }
    }

    fn persist(&self) -> Result<(), AuthError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.persisted())
            .map_err(|e| AuthError::storage(format!("Failed to encode auth store: {}", e)))?;
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AuthError::storage(format!("Failed to create store directory: {}", e))
                })?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        // Write beside the target and rename so readers never see a partial file.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| AuthError::storage(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| AuthError::storage(format!("Failed to write auth store: {}", e)))?;
        tmp.persist(path)
            .map_err(|e| AuthError::storage(format!("Failed to replace auth store: {}", e)))?;
        debug!(path = %path.display(), "Auth store persisted");
        Ok(())
    }
}
