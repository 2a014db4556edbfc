//! Realtime event types

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Emitted once the socket handshake completes
pub const EVENT_OPEN: &str = "open";
/// Emitted on every teardown: explicit close, remote close, or error
pub const EVENT_CLOSED: &str = "closed";
/// Emitted on socket errors, before the teardown
pub const EVENT_ERROR: &str = "error";
/// Emitted for every well-formed inbound frame
pub const EVENT_MESSAGE: &str = "message";

/// Payload handed to channel listeners
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Open,
    Closed,
    Error { message: String },
    /// Any decoded inbound frame
    Message { payload: Value, raw: String },
    /// A frame naming a model and an action, e.g. `task:update`
    Change(ChangeEvent),
}

/// Change notification for one record
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub model: String,
    pub action: String,
    /// Record id as sent by the server, `null` when absent
    pub id: Value,
    /// The full decoded frame
    pub payload: Value,
    /// The frame text as received
    pub raw: String,
}

impl ChangeEvent {
    /// Build from a decoded frame carrying a truthy `model` and `action`.
    ///
    /// Non-empty strings are taken as is; non-zero numbers and `true` are
    /// used in their JSON text form. Anything else is not a change.
    pub fn from_payload(payload: Value, raw: &str) -> Option<Self> {
        let model = payload.get("model").and_then(name_part)?;
        let action = payload.get("action").and_then(name_part)?;
        let id = payload.get("id").cloned().unwrap_or(Value::Null);

        Some(Self {
            model,
            action,
            id,
            payload,
            raw: raw.to_string(),
        })
    }

    /// Composed event name, `<model>:<action>`
    pub fn name(&self) -> String {
        event_name(&self.model, &self.action)
    }

    /// Serialized record the broadcaster attaches under `body`
    pub fn body(&self) -> Option<&Value> {
        self.payload.get("body").filter(|b| !b.is_null())
    }

    /// Decode `body` as a typed record
    pub fn record<R: DeserializeOwned>(&self) -> Option<R> {
        self.body()
            .and_then(|body| serde_json::from_value(body.clone()).ok())
    }
}

fn name_part(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// `<model>:<action>`
pub fn event_name(model: &str, action: &str) -> String {
    format!("{}:{}", model, action)
}
