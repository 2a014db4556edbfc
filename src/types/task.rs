//! Task records and board status transitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Links, Record, Sprint};

/// Column a task sits in on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskStatus {
    Unassigned = 0,
    Todo = 1,
    Active = 2,
    Testing = 3,
    Done = 4,
}

impl TaskStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Unassigned),
            1 => Some(TaskStatus::Todo),
            2 => Some(TaskStatus::Active),
            3 => Some(TaskStatus::Testing),
            4 => Some(TaskStatus::Done),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Unassigned => "unassigned",
            TaskStatus::Todo => "todo",
            TaskStatus::Active => "active",
            TaskStatus::Testing => "testing",
            TaskStatus::Done => "done",
        }
    }
}

impl From<TaskStatus> for u8 {
    fn from(status: TaskStatus) -> Self {
        status.code()
    }
}

/// A task on the board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Sprint foreign key, `None` for backlog tasks
    #[serde(default)]
    pub sprint: Option<u64>,
    #[serde(default)]
    pub status: u8,
    #[serde(default)]
    pub order: i64,
    /// Username of the assignee
    #[serde(default)]
    pub assigned: Option<String>,
    #[serde(default)]
    pub started: Option<NaiveDate>,
    #[serde(default)]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub completed: Option<NaiveDate>,
    /// Read-only label computed by the server
    #[serde(default, skip_serializing)]
    pub status_display: Option<String>,
    #[serde(default, skip_serializing_if = "Links::is_empty")]
    pub links: Links,
    /// Backlog signal sent with a move; `Some(1)` means "moved to backlog"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<u8>,
}

/// Field changes produced by a board move, persisted in one update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskUpdate {
    pub status: u8,
    pub sprint: Option<u64>,
    pub order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<u8>,
    /// `Some(None)` clears the date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<Option<NaiveDate>>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::from_code(self.status)
    }

    pub fn in_backlog(&self) -> bool {
        self.sprint.is_none()
    }

    pub fn in_sprint(&self, sprint: &Sprint) -> bool {
        sprint.id.is_some() && sprint.id == self.sprint
    }

    /// Board column class: `unassigned` without a sprint, else the status name
    pub fn status_class(&self) -> &'static str {
        if self.sprint.is_none() {
            return TaskStatus::Unassigned.as_str();
        }
        match self.status() {
            Some(TaskStatus::Unassigned) | None => "",
            Some(status) => status.as_str(),
        }
    }

    /// Compute the fields a move to `status`/`sprint`/`order` changes.
    ///
    /// `started` is stamped when the task becomes active, or jumps past
    /// active without ever having started; it is cleared when the task drops
    /// back below active. `completed` is stamped on done and cleared when the
    /// task leaves done.
    pub fn plan_move(
        &self,
        status: u8,
        sprint: Option<u64>,
        order: i64,
        today: NaiveDate,
    ) -> TaskUpdate {
        let active = TaskStatus::Active.code();
        let done = TaskStatus::Done.code();

        let stats = sprint.is_none().then_some(1);

        let started = if status == active || (status > active && self.started.is_none()) {
            Some(Some(today))
        } else if status < active && self.started.is_some() {
            Some(None)
        } else {
            None
        };

        let completed = if status == done {
            Some(Some(today))
        } else if status < done && self.completed.is_some() {
            Some(None)
        } else {
            None
        };

        TaskUpdate {
            status,
            sprint,
            order,
            stats,
            started,
            completed,
        }
    }

    /// Write a planned move into the record
    pub fn apply(&mut self, update: &TaskUpdate) {
        self.status = update.status;
        self.sprint = update.sprint;
        self.order = update.order;
        self.stats = update.stats;
        if let Some(started) = update.started {
            self.started = started;
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
    }

    /// Plan and apply a move in one step, returning what changed
    pub fn move_to(
        &mut self,
        status: u8,
        sprint: Option<u64>,
        order: i64,
        today: NaiveDate,
    ) -> TaskUpdate {
        let update = self.plan_move(status, sprint, order, today);
        self.apply(&update);
        update
    }
}

impl Record for Task {
    type Key = u64;
    const RESOURCE: &'static str = "task";

    fn key(&self) -> Option<u64> {
        self.id
    }

    fn links(&self) -> &Links {
        &self.links
    }
}
