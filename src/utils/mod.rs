//! Utility functions and helpers
//!
//! Date helpers for task transitions and atomic file writes for persisted storage.

pub mod atomic;
pub mod time;

pub use atomic::atomic_write;
pub use time::{iso_date, today};
