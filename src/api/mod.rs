//! REST API access
//!
//! This module provides the HTTP side of the board: request authentication
//! hooks, the [`ApiClient`] that talks to the REST backend, and the typed
//! [`Collection`]s records are synchronized into.

pub mod auth;
pub mod client;
pub mod collection;

use thiserror::Error;

pub use auth::{is_safe_method, parse_cookie, CsrfHook, OutgoingRequest, RequestHook};
pub use client::{ApiClient, FetchOptions};
pub use collection::Collection;

/// API access errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with {status}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("invalid JSON from server: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("response is missing `{0}`")]
    MissingField(&'static str),
}

impl ApiError {
    /// HTTP status code when the server answered with an error
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
