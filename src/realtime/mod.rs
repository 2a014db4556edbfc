//! Realtime change notifications
//!
//! A [`RealtimeChannel`] owns one WebSocket connection to the board's
//! broadcaster. Inbound frames are decoded and re-emitted through an
//! [`EventEmitter`]: `"message"` for every frame, and `"<model>:<action>"`
//! (e.g. `task:update`) when the frame names both.

pub mod channel;
pub mod emitter;
pub mod events;
pub mod fake;
pub mod transport;

pub use channel::{ChannelError, ChannelState, ConnectionSignal, RealtimeChannel};
pub use emitter::{EventEmitter, Listener, ListenerId, NamedEvent};
pub use events::{
    event_name, ChangeEvent, ChannelEvent, EVENT_CLOSED, EVENT_ERROR, EVENT_MESSAGE, EVENT_OPEN,
};
pub use fake::FakeConnector;
pub use transport::{Connector, Outbound, SocketEvent, SocketHandle, TungsteniteConnector};
