//! Sprint records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Links, Record};

/// A time-boxed sprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl Sprint {
    /// List URL of the tasks in this sprint
    pub fn tasks_url(&self) -> Option<&str> {
        self.links.get("tasks")
    }

    /// Realtime endpoint for this sprint's board
    pub fn channel_url(&self) -> Option<&str> {
        self.links.get("channel")
    }
}

impl Record for Sprint {
    type Key = u64;
    const RESOURCE: &'static str = "sprint";

    fn key(&self) -> Option<u64> {
        self.id
    }

    fn links(&self) -> &Links {
        &self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprint_links() {
        let json = r#"{
            "id": 2, "name": "Sprint 2", "description": null, "end": "2024-06-01",
            "links": {
                "self": "http://api/sprints/2",
                "tasks": "http://api/tasks/?sprint=2",
                "channel": "ws://localhost:8080/2"
            }
        }"#;
        let sprint: Sprint = serde_json::from_str(json).unwrap();

        assert_eq!(sprint.key(), Some(2));
        assert_eq!(sprint.tasks_url(), Some("http://api/tasks/?sprint=2"));
        assert_eq!(sprint.channel_url(), Some("ws://localhost:8080/2"));
        assert_eq!(sprint.end, NaiveDate::from_ymd_opt(2024, 6, 1));
    }
}
