//! Common behavior of synchronized records

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Links;

/// A keyed attribute bag synchronized with a server-side resource.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identity used by collections and detail URLs
    type Key: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync;

    /// Model name, also used as the `model` field of realtime frames
    const RESOURCE: &'static str;

    /// Server-assigned identity, `None` for records not yet created
    fn key(&self) -> Option<Self::Key>;

    fn links(&self) -> &Links;

    /// Detail URL: the `self` link when present, else built from the
    /// collection URL and the key.
    fn url(&self, collection_url: &str) -> Option<String> {
        if let Some(url) = self.links().self_url() {
            return Some(url.to_string());
        }
        self.key().map(|key| member_url(collection_url, &key))
    }
}

/// Build `<collection>/<key>` with the key percent-encoded.
pub fn member_url(collection_url: &str, key: &impl fmt::Display) -> String {
    let key = key.to_string();
    let encoded = urlencoding::encode(&key);
    if collection_url.ends_with('/') {
        format!("{}{}", collection_url, encoded)
    } else {
        format!("{}/{}", collection_url, encoded)
    }
}
