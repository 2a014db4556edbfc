//! The realtime channel: one logical WebSocket connection
//!
//! ```text
//!  Closed --open()--> Connecting --handshake--> Open
//!    ^                    |                       |
//!    +---- close() / remote close / error --------+
//! ```
//!
//! Each socket instance gets a generation number. Events from a socket that
//! was already torn down are ignored, so one teardown emits one `"closed"`.
//!
//! Sends issued while the channel is not open wait in a queue that is
//! flushed, in issue order, when the next socket opens. A teardown discards
//! the queue together with the connection signal it was waiting on.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

use super::emitter::{EventEmitter, ListenerId, NamedEvent};
use super::events::{
    event_name, ChangeEvent, ChannelEvent, EVENT_CLOSED, EVENT_ERROR, EVENT_MESSAGE, EVENT_OPEN,
};
use super::transport::{Connector, Outbound, SocketEvent, TungsteniteConnector};

/// Realtime channel errors
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("malformed JSON frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("connection closed before it opened")]
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

/// Resolves once the connection it was handed out for completes its
/// handshake. A teardown before that abandons it.
#[derive(Debug, Clone)]
pub struct ConnectionSignal {
    rx: watch::Receiver<bool>,
}

impl ConnectionSignal {
    pub fn is_resolved(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the handshake
    pub async fn wait(&self) -> Result<(), ChannelError> {
        let mut rx = self.rx.clone();
        rx.wait_for(|opened| *opened)
            .await
            .map(|_| ())
            .map_err(|_| ChannelError::Abandoned)
    }

    /// Whether both signals belong to the same connection
    pub fn same_connection(&self, other: &ConnectionSignal) -> bool {
        self.rx.same_channel(&other.rx)
    }
}

struct ActiveSocket {
    generation: u64,
    outbound: mpsc::UnboundedSender<Outbound>,
}

struct ChannelInner {
    state: ChannelState,
    socket: Option<ActiveSocket>,
    signal: watch::Sender<bool>,
    pending: VecDeque<String>,
    generation: u64,
}

impl ChannelInner {
    fn is_current(&self, generation: u64) -> bool {
        self.socket
            .as_ref()
            .map(|s| s.generation == generation)
            .unwrap_or(false)
    }

    fn teardown(&mut self) {
        self.socket = None;
        self.state = ChannelState::Closed;
        self.pending.clear();
        // Dropping the old sender abandons everyone waiting on it
        let (signal, _) = watch::channel(false);
        self.signal = signal;
    }
}

struct Shared {
    url: String,
    connector: Arc<dyn Connector>,
    inner: Mutex<ChannelInner>,
    emitter: EventEmitter,
}

/// Realtime change channel. Clones share the same connection.
#[derive(Clone)]
pub struct RealtimeChannel {
    shared: Arc<Shared>,
}

impl RealtimeChannel {
    /// Create a closed channel for `url`; call [`open`](Self::open) to connect
    pub fn new(url: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                connector,
                inner: Mutex::new(ChannelInner {
                    state: ChannelState::Closed,
                    socket: None,
                    signal,
                    pending: VecDeque::new(),
                    generation: 0,
                }),
                emitter: EventEmitter::default(),
            }),
        }
    }

    /// Channel over a real WebSocket
    pub fn websocket(url: impl Into<String>) -> Self {
        Self::new(url, Arc::new(TungsteniteConnector))
    }

    pub fn url(&self) -> &str {
        &self.shared.url
    }

    pub fn state(&self) -> ChannelState {
        self.shared.inner.lock().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Signal for the current (or next) connection
    pub fn connected(&self) -> ConnectionSignal {
        ConnectionSignal {
            rx: self.shared.inner.lock().signal.subscribe(),
        }
    }

    /// Connect unless a socket already exists. Must be called within a tokio
    /// runtime.
    pub fn open(&self) -> ConnectionSignal {
        let mut inner = self.shared.inner.lock();
        if inner.socket.is_some() {
            return ConnectionSignal {
                rx: inner.signal.subscribe(),
            };
        }

        inner.generation += 1;
        let generation = inner.generation;
        let handle = self.shared.connector.connect(&self.shared.url);
        inner.socket = Some(ActiveSocket {
            generation,
            outbound: handle.outbound,
        });
        inner.state = ChannelState::Connecting;
        let signal = ConnectionSignal {
            rx: inner.signal.subscribe(),
        };
        drop(inner);

        tracing::debug!(url = %self.shared.url, generation, "opening realtime channel");
        tokio::spawn(pump(Arc::downgrade(&self.shared), generation, handle.events));
        signal
    }

    /// Close the socket (gracefully, if one exists) and reset the channel.
    /// Always emits `"closed"`.
    pub fn close(&self) {
        {
            let mut inner = self.shared.inner.lock();
            if let Some(socket) = &inner.socket {
                let _ = socket.outbound.send(Outbound::Close);
            }
            inner.teardown();
        }
        tracing::info!(url = %self.shared.url, "realtime channel closed");
        self.emit(EVENT_CLOSED, &ChannelEvent::Closed);
    }

    /// Serialize `message` and write it once the channel is open.
    ///
    /// Until then frames are queued without limit. The queue only empties
    /// when a socket opens or the channel is closed, so callers that send
    /// while closed must eventually call [`open`](Self::open) or
    /// [`close`](Self::close).
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<(), ChannelError> {
        let payload = serde_json::to_string(message)?;
        tracing::debug!(%payload, "outbound payload");

        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        match (&inner.state, &inner.socket) {
            (ChannelState::Open, Some(socket)) => {
                if socket.outbound.send(Outbound::Text(payload)).is_err() {
                    tracing::debug!("socket already gone, frame not sent");
                }
            }
            _ => inner.pending.push_back(payload),
        }
        Ok(())
    }

    /// Frames waiting for the socket to open
    pub fn pending_len(&self) -> usize {
        self.shared.inner.lock().pending.len()
    }

    /// Decode an inbound frame and dispatch it: `"message"` for every frame,
    /// then `"<model>:<action>"` when the frame names both.
    pub fn on_message(&self, frame: &str) -> Result<(), ChannelError> {
        let payload: Value = serde_json::from_str(frame)?;
        tracing::debug!(%frame, "inbound frame");

        self.emit(
            EVENT_MESSAGE,
            &ChannelEvent::Message {
                payload: payload.clone(),
                raw: frame.to_string(),
            },
        );

        if let Some(change) = ChangeEvent::from_payload(payload, frame) {
            let name = change.name();
            self.emit(&name, &ChannelEvent::Change(change));
        }
        Ok(())
    }

    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        self.shared.emitter.on(name, listener)
    }

    /// Listen for `<model>:<action>` change events
    pub fn on_change<F>(&self, model: &str, action: &str, listener: F) -> ListenerId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.on(event_name(model, action), move |event| {
            if let ChannelEvent::Change(change) = event {
                listener(change);
            }
        })
    }

    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        self.shared.emitter.off(name, id)
    }

    pub fn clear_listeners(&self, name: &str) {
        self.shared.emitter.clear(name);
    }

    /// Stream of every event the channel emits from now on
    pub fn subscribe(&self) -> broadcast::Receiver<NamedEvent> {
        self.shared.emitter.subscribe()
    }

    fn emit(&self, name: &str, event: &ChannelEvent) {
        self.shared.emitter.emit(name, event);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.shared.inner.lock().is_current(generation)
    }

    fn handle_open(&self, generation: u64) {
        {
            let mut guard = self.shared.inner.lock();
            let inner = &mut *guard;
            if !inner.is_current(generation) {
                return;
            }
            inner.state = ChannelState::Open;
            if let Some(socket) = &inner.socket {
                for payload in inner.pending.drain(..) {
                    let _ = socket.outbound.send(Outbound::Text(payload));
                }
            }
            inner.signal.send_replace(true);
        }
        tracing::info!(url = %self.shared.url, generation, "realtime channel open");
        self.emit(EVENT_OPEN, &ChannelEvent::Open);
    }

    fn handle_frame(&self, generation: u64, frame: &str) -> Result<(), ChannelError> {
        if !self.is_current(generation) {
            return Ok(());
        }
        self.on_message(frame)
    }

    fn handle_close(&self, generation: u64) {
        {
            let mut inner = self.shared.inner.lock();
            if !inner.is_current(generation) {
                return;
            }
            inner.teardown();
        }
        tracing::info!(url = %self.shared.url, generation, "realtime channel closed by remote");
        self.emit(EVENT_CLOSED, &ChannelEvent::Closed);
    }

    fn handle_error(&self, generation: u64, message: String) {
        if !self.is_current(generation) {
            return;
        }
        tracing::warn!(url = %self.shared.url, error = %message, "realtime channel error");
        self.emit(EVENT_ERROR, &ChannelEvent::Error { message });
        self.handle_close(generation);
    }
}

impl std::fmt::Debug for RealtimeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeChannel")
            .field("url", &self.shared.url)
            .field("state", &self.state())
            .finish()
    }
}

/// Feed one socket's events into the channel, in arrival order
async fn pump(
    shared: Weak<Shared>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<SocketEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let channel = RealtimeChannel { shared };
        if !channel.is_current(generation) {
            return;
        }

        match event {
            SocketEvent::Opened => channel.handle_open(generation),
            SocketEvent::Frame(text) => {
                if let Err(e) = channel.handle_frame(generation, &text) {
                    tracing::error!(error = %e, frame = %text, "failed to handle realtime frame");
                }
            }
            SocketEvent::Closed => {
                channel.handle_close(generation);
                return;
            }
            SocketEvent::Failed(message) => {
                channel.handle_error(generation, message);
                return;
            }
        }
    }

    // The transport vanished without reporting a close
    if let Some(shared) = shared.upgrade() {
        RealtimeChannel { shared }.handle_close(generation);
    }
}
