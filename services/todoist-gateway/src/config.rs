//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The Todoist client secret is loaded from TODOIST_CLIENT_SECRET or
//! client_secret_file, never from the TOML itself.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use todoist_auth::{AUTHORIZE_ENDPOINT, BridgeConfig, DEFAULT_SCOPE, TOKEN_ENDPOINT};
use todoist_client::DEFAULT_API_BASE_URL;
use url::Url;

use crate::session::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL, SessionLimits};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub todoist: TodoistConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Origin this gateway is reachable at, used to build the callback URI
    pub public_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Client redirect URIs a session may be delivered to
    #[serde(default)]
    pub allowed_redirect_uris: Vec<String>,
    /// Lifetime of an issued session, from the moment it is issued
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

/// Todoist OAuth app and API settings
#[derive(Debug, Deserialize)]
pub struct TodoistConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
    /// Path to a file holding the client secret (alternative to TODOIST_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_max_connections() -> usize {
    1000
}

fn default_session_ttl_secs() -> u64 {
    DEFAULT_SESSION_TTL.as_secs()
}

fn default_max_sessions() -> usize {
    DEFAULT_MAX_SESSIONS
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_authorize_url() -> String {
    AUTHORIZE_ENDPOINT.to_string()
}

fn default_token_url() -> String {
    TOKEN_ENDPOINT.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

fn require_http_url(field: &'static str, value: &str) -> common::Result<()> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(common::Error::Url {
            field,
            value: value.to_string(),
        }),
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Client secret resolution order:
    /// 1. TODOIST_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(id) = std::env::var("TODOIST_CLIENT_ID") {
            config.todoist.client_id = id;
        }
        if config.todoist.client_id.trim().is_empty() {
            return Err(common::Error::Config(
                "todoist.client_id is required (or set TODOIST_CLIENT_ID)".into(),
            ));
        }

        require_http_url("server.public_url", &config.server.public_url)?;
        if config.server.public_url.ends_with('/') {
            return Err(common::Error::Config(format!(
                "public_url must not end with '/', got: {}",
                config.server.public_url
            )));
        }
        require_http_url("todoist.api_base_url", &config.todoist.api_base_url)?;
        require_http_url("todoist.authorize_url", &config.todoist.authorize_url)?;
        require_http_url("todoist.token_url", &config.todoist.token_url)?;

        if config.server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }
        if config.server.allowed_redirect_uris.is_empty() {
            return Err(common::Error::Config(
                "server.allowed_redirect_uris must list at least one client redirect URI".into(),
            ));
        }
        for uri in &config.server.allowed_redirect_uris {
            require_http_url("server.allowed_redirect_uris", uri)?;
        }
        if config.server.session_ttl_secs == 0 || config.server.max_sessions == 0 {
            return Err(common::Error::Config(
                "session_ttl_secs and max_sessions must be greater than 0".into(),
            ));
        }

        // Resolve client secret: env var takes precedence over file
        if let Ok(secret) = std::env::var("TODOIST_CLIENT_SECRET") {
            config.todoist.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.todoist.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.todoist.client_secret = Some(Secret::new(secret));
            }
        }
        if config
            .todoist
            .client_secret
            .as_ref()
            .is_none_or(Secret::is_blank)
        {
            return Err(common::Error::Config(
                "Todoist client secret missing: set TODOIST_CLIENT_SECRET or client_secret_file"
                    .into(),
            ));
        }

        Ok(config)
    }

    /// Settings for the credential bridge.
    pub fn bridge_config(&self) -> common::Result<BridgeConfig> {
        let client_secret = self
            .todoist
            .client_secret
            .clone()
            .ok_or_else(|| common::Error::Config("Todoist client secret not loaded".into()))?;

        Ok(BridgeConfig {
            client_id: self.todoist.client_id.clone(),
            client_secret,
            authorize_url: self.todoist.authorize_url.clone(),
            token_url: self.todoist.token_url.clone(),
            api_base_url: self.todoist.api_base_url.clone(),
            scope: self.todoist.scope.clone(),
            public_url: self.server.public_url.clone(),
            allowed_redirect_uris: self.server.allowed_redirect_uris.clone(),
        })
    }

    /// Session lifetime and capacity for the in-memory store.
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            ttl: Duration::from_secs(self.server.session_ttl_secs),
            max_sessions: self.server.max_sessions,
        }
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("todoist-gateway.toml")
    }
}
