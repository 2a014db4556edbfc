//! Named-event listener registry
//!
//! Listeners are plain closures registered under an event name. Every emit
//! is also published on a broadcast channel so async consumers can follow
//! all events as a stream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::events::ChannelEvent;

/// Callback invoked with each emitted event
pub type Listener = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;

/// Handle returned by [`EventEmitter::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An emitted event together with the name it was emitted under
#[derive(Debug, Clone)]
pub struct NamedEvent {
    pub name: String,
    pub event: ChannelEvent,
}

pub struct EventEmitter {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Listener)>>>,
    tx: broadcast::Sender<NamedEvent>,
}

impl EventEmitter {
    /// Create an emitter whose broadcast stream buffers `capacity` events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            next_id: AtomicU64::new(0),
            listeners: RwLock::new(HashMap::new()),
            tx,
        }
    }

    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .write()
            .entry(name.into())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(name);
        }
        removed
    }

    /// Remove every listener for `name`
    pub fn clear(&self, name: &str) {
        self.listeners.write().remove(name);
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.read().get(name).map_or(0, Vec::len)
    }

    /// Call the listeners registered under `name`, in registration order.
    ///
    /// The registry lock is released before any listener runs, so listeners
    /// may register, unregister or emit themselves.
    pub fn emit(&self, name: &str, event: &ChannelEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .get(name)
            .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in listeners {
            listener(event);
        }

        // No receivers is fine
        let _ = self.tx.send(NamedEvent {
            name: name.to_string(),
            event: event.clone(),
        });
    }

    /// Stream of every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<NamedEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_emit_reaches_named_listeners_in_order() {
        let emitter = EventEmitter::default();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let calls = calls.clone();
            emitter.on("open", move |_| calls.lock().push(tag));
        }
        let other = calls.clone();
        emitter.on("closed", move |_| other.lock().push("closed"));

        emitter.emit("open", &ChannelEvent::Open);

        assert_eq!(*calls.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_off_removes_listener() {
        let emitter = EventEmitter::default();
        let id = emitter.on("open", |_| {});
        assert_eq!(emitter.listener_count("open"), 1);

        assert!(emitter.off("open", id));
        assert!(!emitter.off("open", id));
        assert_eq!(emitter.listener_count("open"), 0);
    }

    #[test]
    fn test_listener_may_reenter_emitter() {
        let emitter = Arc::new(EventEmitter::default());
        let inner = emitter.clone();
        emitter.on("open", move |_| {
            inner.on("late", |_| {});
        });

        emitter.emit("open", &ChannelEvent::Open);
        assert_eq!(emitter.listener_count("late"), 1);
    }

    #[tokio::test]
    async fn test_subscribe_receives_all_events() {
        let emitter = EventEmitter::default();
        let mut rx = emitter.subscribe();

        emitter.emit("open", &ChannelEvent::Open);
        emitter.emit("closed", &ChannelEvent::Closed);

        assert_eq!(rx.recv().await.unwrap().name, "open");
        let next = rx.recv().await.unwrap();
        assert_eq!(next.name, "closed");
        assert_eq!(next.event, ChannelEvent::Closed);
    }
}
