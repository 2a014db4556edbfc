//! Realtime channel tests against an in-process WebSocket server

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};

use scrum_board::realtime::{NamedEvent, EVENT_CLOSED, EVENT_OPEN};
use scrum_board::{ChannelEvent, ChannelState, RealtimeChannel};

const CHANGE_FRAME: &str = r#"{"model":"task","action":"updated","id":7,"status":3}"#;

#[derive(Clone)]
struct Socket {
    /// Frames pushed to every client right after the upgrade
    greeting: Vec<String>,
    /// Close the connection after the greeting
    hang_up: bool,
    received: mpsc::UnboundedSender<String>,
}

async fn upgrade(State(socket): State<Socket>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |conn| serve_socket(conn, socket))
}

async fn serve_socket(mut conn: WebSocket, socket: Socket) {
    for frame in &socket.greeting {
        if conn.send(Message::Text(frame.clone())).await.is_err() {
            return;
        }
    }
    if socket.hang_up {
        let _ = conn.send(Message::Close(None)).await;
        return;
    }
    while let Some(Ok(message)) = conn.recv().await {
        match message {
            Message::Text(text) => {
                let _ = socket.received.send(text);
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}

async fn start_socket(
    greeting: Vec<String>,
    hang_up: bool,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let (received, rx) = mpsc::unbounded_channel();
    let state = Socket {
        greeting,
        hang_up,
        received,
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/socket", listener.local_addr().unwrap());
    let app = Router::new().route("/socket", get(upgrade)).with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (url, rx)
}

async fn next_named(rx: &mut broadcast::Receiver<NamedEvent>, name: &str) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let next = rx.recv().await.unwrap();
            if next.name == name {
                return next.event;
            }
        }
    })
    .await
    .expect("event not emitted in time")
}

async fn next_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("frame not received in time")
        .unwrap()
}

#[tokio::test]
async fn test_change_frame_reaches_listener() {
    let (url, _rx) = start_socket(vec![CHANGE_FRAME.to_string()], false).await;
    let channel = RealtimeChannel::websocket(url);
    let mut events = channel.subscribe();

    channel.open().wait().await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);

    match next_named(&mut events, "task:updated").await {
        ChannelEvent::Change(change) => {
            assert_eq!(change.id, json!(7));
            assert_eq!(change.payload["status"], json!(3));
            assert_eq!(change.raw, CHANGE_FRAME);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    channel.close();
}

#[tokio::test]
async fn test_sends_are_delivered_in_issue_order() {
    let (url, mut rx) = start_socket(Vec::new(), false).await;
    let channel = RealtimeChannel::websocket(url);

    channel.send(&json!({"n": 1})).unwrap();
    let connected = channel.open();
    channel.send(&json!({"n": 2})).unwrap();
    connected.wait().await.unwrap();
    channel.send(&json!({"n": 3})).unwrap();

    assert_eq!(next_frame(&mut rx).await, r#"{"n":1}"#);
    assert_eq!(next_frame(&mut rx).await, r#"{"n":2}"#);
    assert_eq!(next_frame(&mut rx).await, r#"{"n":3}"#);
    channel.close();
}

#[tokio::test]
async fn test_server_close_tears_channel_down() {
    let (url, _rx) = start_socket(Vec::new(), true).await;
    let channel = RealtimeChannel::websocket(url);
    let mut events = channel.subscribe();

    channel.open();
    next_named(&mut events, EVENT_OPEN).await;
    assert_eq!(next_named(&mut events, EVENT_CLOSED).await, ChannelEvent::Closed);
    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn test_unreachable_server_reports_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/socket", listener.local_addr().unwrap());
    drop(listener);

    let channel = RealtimeChannel::websocket(url);
    let mut events = channel.subscribe();
    let connected = channel.open();

    assert!(matches!(
        next_named(&mut events, "error").await,
        ChannelEvent::Error { .. }
    ));
    next_named(&mut events, EVENT_CLOSED).await;
    assert!(connected.wait().await.is_err());
}
