// Owns at most one listener per event kind on the shared event source.

use std::sync::Arc;

use tracing::debug;

use super::registry::SessionRegistry;
use crate::pipeline::events::EventKind;
use crate::pipeline::traits::{EventHandler, EventSource, ListenerHandle};

/// Handlers installed on attach. Built once per manager and cloned per attach.
#[derive(Clone)]
pub struct RouteHandlers {
    pub progress: EventHandler,
    pub complete: EventHandler,
}

#[derive(Debug, Default)]
pub struct SubscriptionController {
    progress: Option<ListenerHandle>,
    complete: Option<ListenerHandle>,
}

impl SubscriptionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe each kind that has no listener yet. Returns true if any
    /// listener was added; calling it while attached does nothing.
    pub fn ensure_attached(&mut self, events: &dyn EventSource, handlers: &RouteHandlers) -> bool {
        let mut attached = false;
        if self.progress.is_none() {
            self.progress =
                Some(events.add_listener(EventKind::Progress, Arc::clone(&handlers.progress)));
            attached = true;
        }
        if self.complete.is_none() {
            self.complete =
                Some(events.add_listener(EventKind::Complete, Arc::clone(&handlers.complete)));
            attached = true;
        }
        if attached {
            debug!("preload listeners attached");
        }
        attached
    }

    /// Remove both listeners if no session is registered. Returns true if
    /// anything was removed.
    pub fn detach_if_idle(&mut self, events: &dyn EventSource, registry: &SessionRegistry) -> bool {
        if !registry.is_empty() {
            return false;
        }
        self.detach_all(events)
    }

    /// Remove both listeners regardless of registered sessions. Used when the
    /// owning manager goes away with batches still in flight.
    pub fn detach_all(&mut self, events: &dyn EventSource) -> bool {
        let mut detached = false;
        for handle in [self.progress.take(), self.complete.take()].into_iter().flatten() {
            events.remove_listener(handle);
            detached = true;
        }
        if detached {
            debug!("preload listeners detached");
        }
        detached
    }

    pub fn is_attached(&self) -> bool {
        self.progress.is_some() && self.complete.is_some()
    }

    /// Number of listeners currently held (0 or 2 when consistent).
    pub fn listener_count(&self) -> usize {
        usize::from(self.progress.is_some()) + usize::from(self.complete.is_some())
    }
}
