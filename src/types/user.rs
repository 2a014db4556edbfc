//! User records

use serde::{Deserialize, Serialize};

use super::{Links, Record};

/// A board member. Detail routes are looked up by username.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl Record for User {
    type Key = String;
    const RESOURCE: &'static str = "user";

    fn key(&self) -> Option<String> {
        Some(self.username.clone()).filter(|name| !name.is_empty())
    }

    fn links(&self) -> &Links {
        &self.links
    }
}
