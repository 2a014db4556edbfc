//! Hyperlinked relations attached to every record

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relation name -> URL map (`self`, `tasks`, `sprint`, `assigned`, `channel`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(BTreeMap<String, String>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    /// URL for a relation, if the server provided one
    pub fn get(&self, rel: &str) -> Option<&str> {
        self.0.get(rel).map(String::as_str).filter(|url| !url.is_empty())
    }

    /// The record's own canonical URL
    pub fn self_url(&self) -> Option<&str> {
        self.get("self")
    }

    pub fn insert(&mut self, rel: impl Into<String>, url: impl Into<String>) {
        self.0.insert(rel.into(), url.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(rel, url)| (rel.as_str(), url.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Links {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_deserialize_from_object() {
        let links: Links = serde_json::from_str(
            r#"{"self":"http://api/tasks/1","sprint":"http://api/sprints/2"}"#,
        )
        .unwrap();

        assert_eq!(links.self_url(), Some("http://api/tasks/1"));
        assert_eq!(links.get("sprint"), Some("http://api/sprints/2"));
        assert_eq!(links.get("assigned"), None);
    }

    #[test]
    fn test_empty_url_is_treated_as_missing() {
        let links: Links = [("self", "")].into_iter().collect();
        assert_eq!(links.self_url(), None);
    }
}
