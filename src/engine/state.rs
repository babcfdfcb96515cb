// Registry and listener handles, mutated together so that listeners are
// attached exactly while at least one session is registered.

use super::registry::{Session, SessionRegistry};
use super::subscription::{RouteHandlers, SubscriptionController};
use crate::pipeline::traits::{EventSource, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registered {
    /// Listeners were attached by this registration.
    pub attached: bool,
    /// The id was already registered and its previous session was replaced.
    pub replaced: bool,
}

#[derive(Debug)]
pub struct Finished {
    pub session: Session,
    /// Listeners were detached because no session remains.
    pub detached: bool,
}

#[derive(Debug, Default)]
pub struct PreloadState {
    registry: SessionRegistry,
    subscriptions: SubscriptionController,
}

impl PreloadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        session: Session,
        events: &dyn EventSource,
        handlers: &RouteHandlers,
    ) -> Registered {
        let attached = if self.registry.is_empty() {
            self.subscriptions.ensure_attached(events, handlers)
        } else {
            false
        };
        let replaced = self.registry.insert(session).is_some();
        Registered { attached, replaced }
    }

    /// Remove a session and detach if it was the last one. `None` if the id
    /// is not registered.
    pub fn finish(&mut self, id: SessionId, events: &dyn EventSource) -> Option<Finished> {
        let session = self.registry.remove(id)?;
        let detached = self.subscriptions.detach_if_idle(events, &self.registry);
        Some(Finished { session, detached })
    }

    /// Drop every listener, leaving registered sessions untouched. Returns
    /// the number of sessions that will never see their completion routed.
    pub fn detach_all(&mut self, events: &dyn EventSource) -> usize {
        self.subscriptions.detach_all(events);
        self.registry.len()
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn subscriptions(&self) -> &SubscriptionController {
        &self.subscriptions
    }

    /// Listeners are held iff sessions are registered.
    pub fn is_consistent(&self) -> bool {
        match self.subscriptions.listener_count() {
            0 => self.registry.is_empty(),
            2 => !self.registry.is_empty(),
            _ => false,
        }
    }
}
