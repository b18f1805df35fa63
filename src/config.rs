//! Application configuration.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Environment variable overriding the auth service URL.
pub const ENV_SERVICE_URL: &str = "STACKTRIS_SERVICE_URL";
/// Environment variable overriding the auth anon key.
pub const ENV_ANON_KEY: &str = "STACKTRIS_ANON_KEY";
/// Environment variable overriding the database path.
pub const ENV_DATABASE_URL: &str = "STACKTRIS_DATABASE_URL";
/// Environment variable overriding the auth store path.
pub const ENV_AUTH_STORE: &str = "STACKTRIS_AUTH_STORE";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hosted auth service base URL.
    #[serde(default)]
    service_url: String,

    /// Public key sent with every auth request.
    #[serde(default)]
    anon_key: String,

    /// SQLite database path.
    #[serde(default = "default_database_url")]
    database_url: String,

    /// Where the CLI keeps its auth store.
    #[serde(default = "default_auth_store_path")]
    auth_store_path: String,

    /// HTTP bind host.
    #[serde(default = "default_host")]
    host: String,

    /// HTTP bind port.
    #[serde(default = "default_port")]
    port: u16,
}

fn default_database_url() -> String {
    "stacktris.db".to_string()
}

fn default_auth_store_path() -> String {
    ".stacktris/auth.json".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: String::new(),
            anon_key: String::new(),
            database_url: default_database_url(),
            auth_store_path: default_auth_store_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(database_url = %config.database_url, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `.env`, then the optional file, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is given but invalid.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            debug!("Loaded .env");
        }
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies overrides looked up by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup(ENV_SERVICE_URL) {
            self.service_url = v;
        }
        if let Some(v) = lookup(ENV_ANON_KEY) {
            self.anon_key = v;
        }
        if let Some(v) = lookup(ENV_DATABASE_URL) {
            self.database_url = v;
        }
        if let Some(v) = lookup(ENV_AUTH_STORE) {
            self.auth_store_path = v;
        }
        self
    }

    /// Overrides the bind address.
    pub fn with_bind(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Fails unless the auth service is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the missing value.
    pub fn require_auth_service(&self) -> Result<(), ConfigError> {
        if self.service_url.trim().is_empty() {
            return Err(ConfigError::new(format!("{} is not set", ENV_SERVICE_URL)));
        }
        if self.anon_key.trim().is_empty() {
            return Err(ConfigError::new(format!("{} is not set", ENV_ANON_KEY)));
        }
        Ok(())
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new config error with caller location tracking.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
