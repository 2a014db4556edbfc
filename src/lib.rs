//! Scrum Board client
//!
//! The client-side data layer of a kanban task board: typed records synced
//! from a REST API, a persisted session token, and a realtime channel that
//! turns WebSocket frames into named change events.
//!
//! # Features
//!
//! - **Request hooks**: `X-CSRFToken` on unsafe same-origin requests,
//!   `Authorization: Token` on every request once logged in
//! - **Collections**: ordered, key-indexed record sets with pagination links
//! - **Task moves**: status/sprint/order changes with start and completion
//!   dates kept consistent
//! - **Realtime**: one logical socket per channel, sends queued until open,
//!   `<model>:<action>` events
//!
//! # Modules
//!
//! - `types`: Task, Sprint, User records and pagination types
//! - `api`: REST client, request hooks and collections
//! - `session`: token lifecycle and its storage
//! - `realtime`: WebSocket channel and event emitter
//! - `board`: context object tying the above together
//! - `config`: `BOARD_*` environment configuration
//! - `utils`: atomic file writes, dates
//!
//! # Example
//!
//! ```no_run
//! use scrum_board::{Board, BoardConfig, BoardResult, ChannelEvent};
//!
//! #[tokio::main]
//! async fn main() -> BoardResult<()> {
//!     let mut board = Board::bootstrap(BoardConfig::from_env()?).await?;
//!     board.refresh().await?;
//!
//!     if let Some(channel) = board.channel() {
//!         channel.on("task:update", |event| {
//!             if let ChannelEvent::Change(change) = event {
//!                 println!("task {} changed", change.id);
//!             }
//!         });
//!         channel.open().wait().await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod board;
pub mod config;
pub mod realtime;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::{ApiClient, ApiError, Collection, FetchOptions};
pub use board::{Board, BoardError, RefreshSummary};
pub use config::{BoardConfig, ConfigError};
pub use realtime::{ChangeEvent, ChannelEvent, ChannelState, RealtimeChannel};
pub use session::Session;
pub use types::{BoardResult, Record, Sprint, Task, TaskStatus, TaskUpdate, User};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
