// In-process broadcast of pipeline events to any number of listeners.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::events::{EventKind, PipelineEvent};
use super::traits::{EventHandler, EventSource, ListenerHandle};

/// Listeners per kind, in registration order.
type ListenerMap = HashMap<EventKind, Vec<(u64, EventHandler)>>;

/// Process-wide event channel. Cloning is cheap and shares the listener set.
///
/// `emit` snapshots the listeners of the event's kind before invoking them,
/// so handlers may add or remove listeners while being called. A listener
/// removed mid-dispatch may still see the event that was being dispatched.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<ListenerMap>>,
    next_id: Arc<AtomicU64>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one event to every listener of its kind, in registration order.
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &PipelineEvent) -> usize {
        let snapshot: Vec<EventHandler> = {
            let listeners = self.listeners.read();
            match listeners.get(&event.kind()) {
                Some(list) => list.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => Vec::new(),
            }
        };
        trace!(
            "emit {:?} session={} listeners={}",
            event.kind(),
            event.session_id(),
            snapshot.len()
        );
        for handler in &snapshot {
            handler(event);
        }
        snapshot.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }
}

impl EventSource for EventEmitter {
    fn add_listener(&self, kind: EventKind, handler: EventHandler) -> ListenerHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push((id, handler));
        ListenerHandle { kind, id }
    }

    fn remove_listener(&self, handle: ListenerHandle) {
        let mut listeners = self.listeners.write();
        if let Some(list) = listeners.get_mut(&handle.kind) {
            list.retain(|(id, _)| *id != handle.id);
            if list.is_empty() {
                listeners.remove(&handle.kind);
            }
        }
    }
}
