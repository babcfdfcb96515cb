// Registry of in-flight preload sessions keyed by pipeline session id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::pipeline::traits::SessionId;

/// A batch callback taking two counters.
pub type BatchCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Invoked with `(completed, total)` as a batch makes progress.
pub type ProgressCallback = BatchCallback;

/// Invoked once with `(completed, skipped)` when a batch finishes.
pub type CompleteCallback = BatchCallback;

#[derive(Clone)]
pub struct Session {
    pub id: SessionId,
    pub on_progress: Option<ProgressCallback>,
    pub on_complete: Option<CompleteCallback>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Optional callbacks supplied with one `preload` call.
#[derive(Clone, Default)]
pub struct PreloadCallbacks {
    on_progress: Option<ProgressCallback>,
    on_complete: Option<CompleteCallback>,
}

impl PreloadCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        let callback: ProgressCallback = Arc::new(callback);
        self.on_progress = Some(callback);
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(u32, u32) + Send + Sync + 'static,
    {
        let callback: CompleteCallback = Arc::new(callback);
        self.on_complete = Some(callback);
        self
    }

    pub fn into_session(self, id: SessionId) -> Session {
        Session {
            id,
            on_progress: self.on_progress,
            on_complete: self.on_complete,
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session. Returns the previous entry if the id was already
    /// registered, which a well-behaved pipeline never does.
    pub fn insert(&mut self, session: Session) -> Option<Session> {
        self.sessions.insert(session.id, session)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.keys().copied().collect();
        ids.sort();
        ids
    }
}
