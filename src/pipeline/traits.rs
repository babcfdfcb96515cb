use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::descriptor::ResourceDescriptor;
use super::events::{EventKind, PipelineEvent};

/// Identifier the native pipeline assigns to one preload batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Command side of the native pipeline.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    async fn create_session(&self) -> Result<SessionId>;
    async fn submit_batch(&self, id: SessionId, descriptors: Vec<ResourceDescriptor>) -> Result<()>;
    async fn clear_memory_cache(&self) -> Result<()>;
    async fn clear_disk_cache(&self) -> Result<()>;
}

pub type EventHandler = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Token identifying one registered listener on an [`EventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    pub kind: EventKind,
    pub id: u64,
}

/// Process-wide broadcast of pipeline events, shared with unrelated consumers.
pub trait EventSource: Send + Sync {
    fn add_listener(&self, kind: EventKind, handler: EventHandler) -> ListenerHandle;
    /// Removing an unknown or already removed handle is a no-op.
    fn remove_listener(&self, handle: ListenerHandle);
}
