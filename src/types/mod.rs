//! Data types for the task board
//!
//! Records mirror the REST resources (tasks, sprints, users) and carry the
//! hyperlinks the API hands out, so URLs are taken from the server rather
//! than rebuilt on the client whenever possible.

mod links;
mod page;
mod record;
mod root;
mod sprint;
mod task;
mod user;

pub use links::Links;
pub use page::{ListResponse, Page};
pub use record::{member_url, Record};
pub use root::ApiRoot;
pub use sprint::Sprint;
pub use task::{Task, TaskStatus, TaskUpdate};
pub use user::User;

/// Result type for top-level board operations
pub type BoardResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
