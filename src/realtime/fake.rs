//! In-memory connector for testing code built on the realtime channel.
//!
//! Every `connect` call creates a numbered fake socket. The connector doubles
//! as the controller: tests inject lifecycle events into a socket and
//! inspect what the channel wrote to it.
//!
//! # Example
//!
//! ```ignore
//! let fake = FakeConnector::new();
//! let channel = RealtimeChannel::new("ws://board/socket", Arc::new(fake.clone()));
//!
//! let connected = channel.open();
//! fake.open(0);
//! connected.wait().await?;
//!
//! channel.send(&json!({"ping": true}))?;
//! assert_eq!(fake.sent_text(0), vec![r#"{"ping":true}"#]);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::transport::{Connector, Outbound, SocketEvent, SocketHandle};

struct FakeSocket {
    url: String,
    events: mpsc::UnboundedSender<SocketEvent>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    written: Vec<Outbound>,
}

/// Connector whose sockets are driven by the test
#[derive(Clone, Default)]
pub struct FakeConnector {
    sockets: Arc<Mutex<Vec<FakeSocket>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sockets created so far
    pub fn connection_count(&self) -> usize {
        self.sockets.lock().len()
    }

    pub fn url(&self, socket: usize) -> Option<String> {
        self.sockets.lock().get(socket).map(|s| s.url.clone())
    }

    /// Deliver a socket event. Returns false when the socket does not exist
    /// or nobody listens to it anymore.
    pub fn inject(&self, socket: usize, event: SocketEvent) -> bool {
        self.sockets
            .lock()
            .get(socket)
            .map(|s| s.events.send(event).is_ok())
            .unwrap_or(false)
    }

    /// Complete the handshake
    pub fn open(&self, socket: usize) -> bool {
        self.inject(socket, SocketEvent::Opened)
    }

    pub fn frame(&self, socket: usize, text: impl Into<String>) -> bool {
        self.inject(socket, SocketEvent::Frame(text.into()))
    }

    /// Simulate the remote end closing
    pub fn close(&self, socket: usize) -> bool {
        self.inject(socket, SocketEvent::Closed)
    }

    pub fn fail(&self, socket: usize, message: impl Into<String>) -> bool {
        self.inject(socket, SocketEvent::Failed(message.into()))
    }

    /// Everything written to the socket so far
    pub fn sent(&self, socket: usize) -> Vec<Outbound> {
        let mut sockets = self.sockets.lock();
        let Some(s) = sockets.get_mut(socket) else {
            return Vec::new();
        };
        while let Ok(item) = s.outbound.try_recv() {
            s.written.push(item);
        }
        s.written.clone()
    }

    /// Text frames written to the socket so far
    pub fn sent_text(&self, socket: usize) -> Vec<String> {
        self.sent(socket)
            .into_iter()
            .filter_map(|item| match item {
                Outbound::Text(text) => Some(text),
                Outbound::Close => None,
            })
            .collect()
    }
}

impl Connector for FakeConnector {
    fn connect(&self, url: &str) -> SocketHandle {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        self.sockets.lock().push(FakeSocket {
            url: url.to_string(),
            events: events_tx,
            outbound: outbound_rx,
            written: Vec::new(),
        });

        SocketHandle {
            outbound: outbound_tx,
            events: events_rx,
        }
    }
}
