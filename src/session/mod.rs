//! Session management: the bearer token lifecycle
//!
//! The session owns the optional API token, restores it from storage on
//! startup, writes it back on every change, and injects it into outgoing
//! requests as `Authorization: Token <token>`.
//!
//! ## Usage
//! ```ignore
//! let session = Arc::new(Session::new(Arc::new(FileStorage::new(".board_storage.json"))));
//! session.load();
//! session.save(Some("9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b"));
//! assert!(session.authenticated());
//! session.delete();
//! ```

pub mod storage;

use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header::{HeaderValue, AUTHORIZATION};

use crate::api::auth::{OutgoingRequest, RequestHook};

pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

/// Storage key holding the raw token
pub const TOKEN_KEY: &str = "apiToken";

/// Process-wide authentication state, shared through an `Arc`
pub struct Session {
    token: RwLock<Option<String>>,
    storage: Arc<dyn Storage>,
}

impl Session {
    /// Create an unauthenticated session over `storage`
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            token: RwLock::new(None),
            storage,
        }
    }

    /// Session that forgets its token when the process exits
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Restore a persisted token. No-op when nothing is stored.
    pub fn load(&self) {
        match self.storage.get_item(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => {
                *self.token.write() = Some(token);
                tracing::debug!("restored API token from storage");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "failed to read API token from storage"),
        }
    }

    /// Set the token and persist it. `None` (or an empty token) logs out and
    /// removes the stored key.
    pub fn save(&self, token: Option<&str>) {
        let token = token.filter(|t| !t.is_empty()).map(str::to_string);

        let result = match &token {
            Some(value) => self.storage.set_item(TOKEN_KEY, value),
            None => self.storage.remove_item(TOKEN_KEY),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist API token");
        }

        *self.token.write() = token;
    }

    /// Log out
    pub fn delete(&self) {
        self.save(None);
    }

    pub fn authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

impl RequestHook for Session {
    fn before_send(&self, request: &mut OutgoingRequest) {
        let Some(token) = self.token() else {
            return;
        };
        match HeaderValue::from_str(&format!("Token {}", token)) {
            Ok(value) => {
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("API token contains characters not allowed in a header"),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::{Method, Url};

    fn request(method: Method, url: &str) -> OutgoingRequest {
        OutgoingRequest::new(method, Url::parse(url).unwrap(), false)
    }

    #[test]
    fn test_save_and_delete() {
        let session = Session::in_memory();
        assert!(!session.authenticated());

        session.save(Some("abc123"));
        assert!(session.authenticated());
        assert_eq!(session.token().as_deref(), Some("abc123"));

        session.delete();
        assert!(!session.authenticated());
    }

    #[test]
    fn test_empty_token_is_logged_out() {
        let session = Session::in_memory();
        session.save(Some(""));
        assert!(!session.authenticated());
    }

    #[test]
    fn test_save_persists_and_delete_removes() {
        let storage = Arc::new(MemoryStorage::new());
        let session = Session::new(storage.clone());

        session.save(Some("abc123"));
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));

        session.save(None);
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_load_restores_token() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "persisted").unwrap();

        let session = Session::new(storage);
        assert!(!session.authenticated());
        session.load();
        assert_eq!(session.token().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_load_without_token_is_noop() {
        let session = Session::in_memory();
        session.load();
        assert!(!session.authenticated());
    }

    #[test]
    fn test_authorization_header_on_every_request() {
        let session = Session::in_memory();
        session.save(Some("abc123"));

        for (method, url) in [
            (Method::GET, "http://localhost:8000/api/tasks/"),
            (Method::POST, "http://localhost:8000/api/tasks/"),
            (Method::DELETE, "http://elsewhere:9000/tasks/1"),
        ] {
            let mut req = request(method, url);
            session.before_send(&mut req);
            assert_eq!(req.headers.get(AUTHORIZATION).unwrap(), "Token abc123");
        }
    }

    #[test]
    fn test_no_authorization_header_when_logged_out() {
        let session = Session::in_memory();
        let mut req = request(Method::GET, "http://localhost:8000/api/");
        session.before_send(&mut req);
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }
}
