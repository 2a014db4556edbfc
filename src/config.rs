//! Board client configuration
//!
//! ## Environment
//! ```bash
//! BOARD_API_ROOT=http://localhost:8000/api/      # API discovery document
//! BOARD_TOKEN_URL=http://localhost:8000/api/token/
//! BOARD_SOCKET_URL=ws://localhost:8080/socket?channel=...
//! BOARD_ORIGIN=http://localhost:8000             # page origin for CSRF checks
//! BOARD_STORAGE_PATH=.board_storage.json         # persisted token
//! BOARD_REQUEST_TIMEOUT=30                        # seconds
//! BOARD_USERNAME=alice BOARD_PASSWORD=secret      # optional login
//! ```

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL ({value}): {reason}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("{var} must be a number of seconds, got {value}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// URL of the API root discovery document
    pub api_root: String,
    /// Token endpoint used by login
    pub token_url: String,
    /// Realtime endpoint, if any
    pub socket_url: Option<String>,
    /// Origin the client acts on behalf of; defaults to the API root's origin
    pub origin: String,
    /// File the session token is persisted in
    pub storage_path: PathBuf,
    pub request_timeout: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl BoardConfig {
    pub const DEFAULT_API_ROOT: &'static str = "http://localhost:8000/api/";
    pub const DEFAULT_STORAGE_PATH: &'static str = ".board_storage.json";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Configuration for an API root with everything else defaulted
    pub fn new(api_root: impl Into<String>) -> Result<Self, ConfigError> {
        let api_root = api_root.into();
        Self::from_lookup(|var| (var == "BOARD_API_ROOT").then(|| api_root.clone()))
    }

    /// Load from `BOARD_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from any variable source
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_root = get("BOARD_API_ROOT").unwrap_or_else(|| Self::DEFAULT_API_ROOT.to_string());
        let root_url = parse_url("BOARD_API_ROOT", &api_root)?;

        let token_url = match get("BOARD_TOKEN_URL") {
            Some(url) => {
                parse_url("BOARD_TOKEN_URL", &url)?;
                url
            }
            None => root_url
                .join("token/")
                .map(String::from)
                .map_err(|e| ConfigError::InvalidUrl {
                    var: "BOARD_API_ROOT",
                    value: api_root.clone(),
                    reason: e.to_string(),
                })?,
        };

        let socket_url = match get("BOARD_SOCKET_URL") {
            Some(url) => {
                parse_url("BOARD_SOCKET_URL", &url)?;
                Some(url)
            }
            None => None,
        };

        let origin = match get("BOARD_ORIGIN") {
            Some(origin) => {
                parse_url("BOARD_ORIGIN", &origin)?;
                origin
            }
            None => root_url.origin().ascii_serialization(),
        };

        let storage_path = get("BOARD_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_STORAGE_PATH));

        let request_timeout = match get("BOARD_REQUEST_TIMEOUT") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: "BOARD_REQUEST_TIMEOUT",
                    value,
                })?,
            None => Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_root,
            token_url,
            socket_url,
            origin,
            storage_path,
            request_timeout,
            username: get("BOARD_USERNAME"),
            password: get("BOARD_PASSWORD"),
        })
    }

    /// Login credentials, when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
