//! Socket transport seam
//!
//! A [`Connector`] turns a URL into a [`SocketHandle`]: a sender for
//! outbound frames and a receiver of socket lifecycle events. Connecting
//! returns immediately; the handshake outcome arrives later as
//! [`SocketEvent::Opened`] or [`SocketEvent::Failed`].

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Frames and commands sent to the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// Request a graceful close
    Close,
}

/// Lifecycle events reported by the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Opened,
    Frame(String),
    Closed,
    Failed(String),
}

/// One socket instance
pub struct SocketHandle {
    pub outbound: mpsc::UnboundedSender<Outbound>,
    pub events: mpsc::UnboundedReceiver<SocketEvent>,
}

/// Opens sockets
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str) -> SocketHandle;
}

/// WebSocket connector over tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    fn connect(&self, url: &str) -> SocketHandle {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        tokio::spawn(run_socket(url.to_string(), outbound_rx, events_tx));

        SocketHandle {
            outbound: outbound_tx,
            events: events_rx,
        }
    }
}

async fn run_socket(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<SocketEvent>,
) {
    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            tracing::debug!(%url, error = %e, "websocket handshake failed");
            let _ = events.send(SocketEvent::Failed(e.to_string()));
            return;
        }
    };
    let _ = events.send(SocketEvent::Opened);

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            command = outbound.recv() => {
                match command {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            let _ = events.send(SocketEvent::Failed(e.to_string()));
                            break;
                        }
                    }
                    // Close requested, or the channel dropped its handle
                    Some(Outbound::Close) | None => {
                        let _ = sink.close().await;
                        let _ = events.send(SocketEvent::Closed);
                        break;
                    }
                }
            }

            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(SocketEvent::Frame(text));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!(bytes = data.len(), "ignoring binary frame");
                    }
                    // tungstenite answers pings itself
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = events.send(SocketEvent::Closed);
                        break;
                    }
                    Some(Err(e)) => {
                        let _ = events.send(SocketEvent::Failed(e.to_string()));
                        break;
                    }
                }
            }
        }
    }
}
