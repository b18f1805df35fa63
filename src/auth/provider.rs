//! Auth provider seam and the hosted-service HTTP client.

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::auth::{AuthError, AuthSession, AuthUser};

/// Operations the application needs from an auth provider.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchanges a one-time callback code for a session.
    ///
    /// `Ok(None)` means the code was accepted but no session was issued,
    /// as happens after an email confirmation link.
    async fn exchange_code(&self, code: &str) -> Result<Option<AuthSession>, AuthError>;

    /// Looks up the user behind an access token. `Ok(None)` when the token
    /// is no longer valid.
    async fn get_session(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError>;
}

/// Thin client for a hosted auth service.
#[derive(Debug, Clone)]
pub struct HostedAuthClient {
    service_url: String,
    anon_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    expires_at: i64,
    user: Option<AuthUser>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(alias = "error_description", alias = "msg")]
    message: Option<String>,
}

impl HostedAuthClient {
    /// Creates a client for the service at `service_url`.
    #[instrument(skip_all)]
    pub fn new(service_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let service_url = service_url.into().trim_end_matches('/').to_string();
        info!(service_url = %service_url, "Creating HostedAuthClient");
        Self {
            service_url,
            anon_key: anon_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Returns the service base URL.
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    async fn provider_error(response: reqwest::Response) -> AuthError {
        let status = response.status();
        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.to_string());
        warn!(status = %status, message = %message, "Auth provider returned an error");
        AuthError::provider(format!("{}: {}", status, message))
    }
}

#[async_trait::async_trait]
impl AuthProvider for HostedAuthClient {
    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<Option<AuthSession>, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=pkce", self.service_url);
        debug!(url = %url, "Exchanging callback code");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::provider_error(response).await);
        }

        let body: TokenResponse = response.json().await?;
        let session = match (body.access_token, body.user) {
            (Some(access_token), Some(user)) => Some(AuthSession::new(
                access_token,
                body.refresh_token,
                body.expires_at,
                user,
            )),
            _ => None,
        };
        info!(has_session = session.is_some(), "Callback code exchanged");
        Ok(session)
    }

    #[instrument(skip(self, access_token))]
    async fn get_session(&self, access_token: &str) -> Result<Option<AuthUser>, AuthError> {
        let url = format!("{}/auth/v1/user", self.service_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Access token rejected");
                Ok(None)
            }
            status if status.is_success() => Ok(Some(response.json().await?)),
            _ => Err(Self::provider_error(response).await),
        }
    }
}
