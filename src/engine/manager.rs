// Preload facade: creates sessions through the gateway, registers them, and
// dispatches the shared event stream back to per-batch callbacks.

use std::sync::{Arc, Weak};

use anyhow::Result;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::registry::PreloadCallbacks;
use super::router::{self, Routed};
use super::state::PreloadState;
use super::stats::{PreloadStats, PreloadStatsSnapshot};
use super::subscription::RouteHandlers;
use crate::pipeline::descriptor::ResourceDescriptor;
use crate::pipeline::events::PipelineEvent;
use crate::pipeline::traits::{CommandGateway, EventHandler, EventSource, SessionId};

struct Inner {
    runtime: Handle,
    gateway: Arc<dyn CommandGateway>,
    events: Arc<dyn EventSource>,
    state: Mutex<PreloadState>,
    handlers: RouteHandlers,
    stats: PreloadStats,
}

/// Handle to one preloader. Clones share the same sessions and listeners.
///
/// Listeners on the event source hold only a weak reference back to the
/// manager, and dropping the last handle removes them. There is no way to
/// cancel a batch once requested: a session is released only by its own
/// completion event, and a batch the pipeline never completes keeps its
/// session and the listeners alive for as long as the manager lives.
#[derive(Clone)]
pub struct PreloaderManager {
    inner: Arc<Inner>,
}

impl PreloaderManager {
    /// Build a manager bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use [`Self::with_runtime`]
    /// to bind an explicit handle instead.
    pub fn new(gateway: Arc<dyn CommandGateway>, events: Arc<dyn EventSource>) -> Self {
        Self::with_runtime(gateway, events, Handle::current())
    }

    /// Build a manager whose session work runs on `runtime`.
    pub fn with_runtime(
        gateway: Arc<dyn CommandGateway>,
        events: Arc<dyn EventSource>,
        runtime: Handle,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let handler = dispatch_handler(weak.clone());
            Inner {
                runtime,
                gateway,
                events,
                state: Mutex::new(PreloadState::new()),
                handlers: RouteHandlers {
                    progress: Arc::clone(&handler),
                    complete: handler,
                },
                stats: PreloadStats::new(),
            }
        });
        Self { inner }
    }

    /// Warm the pipeline cache for `descriptors`. Returns immediately; the
    /// session is created on a task of the manager's runtime, so any thread
    /// may call this. If the pipeline fails to create a session the
    /// callbacks never fire.
    pub fn preload(&self, descriptors: Vec<ResourceDescriptor>, callbacks: PreloadCallbacks) {
        let inner = Arc::clone(&self.inner);
        self.inner.runtime.spawn(async move {
            inner.run_preload(descriptors, callbacks).await;
        });
    }

    pub async fn clear_memory_cache(&self) -> Result<()> {
        let result = self.inner.gateway.clear_memory_cache().await;
        if let Err(e) = &result {
            warn!("clear_memory_cache failed: {}", e);
        }
        result
    }

    pub async fn clear_disk_cache(&self) -> Result<()> {
        let result = self.inner.gateway.clear_disk_cache().await;
        if let Err(e) = &result {
            warn!("clear_disk_cache failed: {}", e);
        }
        result
    }

    /// Number of sessions awaiting their completion event.
    pub fn active_sessions(&self) -> usize {
        self.inner.state.lock().registry().len()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.inner.state.lock().registry().ids()
    }

    pub fn is_registered(&self, id: SessionId) -> bool {
        self.inner.state.lock().registry().contains(id)
    }

    /// Whether the progress and complete listeners are installed.
    pub fn is_attached(&self) -> bool {
        self.inner.state.lock().subscriptions().is_attached()
    }

    /// Listeners held on the event source; 0 when idle, 2 otherwise.
    pub fn listener_count(&self) -> usize {
        self.inner.state.lock().subscriptions().listener_count()
    }

    /// Registry and listener handles agree, read under one lock.
    pub fn is_consistent(&self) -> bool {
        self.inner.state.lock().is_consistent()
    }

    pub fn stats(&self) -> PreloadStatsSnapshot {
        self.inner.stats.snapshot()
    }
}

fn dispatch_handler(weak: Weak<Inner>) -> EventHandler {
    Arc::new(move |event: &PipelineEvent| {
        if let Some(inner) = weak.upgrade() {
            inner.dispatch(event);
        }
    })
}

impl Drop for Inner {
    fn drop(&mut self) {
        let abandoned = self.state.get_mut().detach_all(self.events.as_ref());
        if abandoned > 0 {
            debug!("preloader dropped with {} sessions in flight", abandoned);
        }
    }
}

impl Inner {
    async fn run_preload(&self, descriptors: Vec<ResourceDescriptor>, callbacks: PreloadCallbacks) {
        let id = match self.gateway.create_session().await {
            Ok(id) => id,
            Err(e) => {
                self.stats.record_request_failed();
                warn!("preload session request failed: {}", e);
                return;
            }
        };

        let registered = {
            let mut state = self.state.lock();
            state.register(callbacks.into_session(id), self.events.as_ref(), &self.handlers)
        };
        self.stats.record_registered();
        if registered.attached {
            self.stats.record_attach();
        }
        if registered.replaced {
            warn!("pipeline returned id {} of a session still in flight", id);
        }
        info!(
            "preload session {} registered, {} resources",
            id,
            descriptors.len()
        );

        if let Err(e) = self.gateway.submit_batch(id, descriptors).await {
            warn!("submit_batch for session {} failed: {}", id, e);
        }
    }

    fn dispatch(&self, event: &PipelineEvent) {
        let routed = {
            let mut state = self.state.lock();
            router::route(&mut state, self.events.as_ref(), event)
        };

        match routed {
            Routed::Ignored => self.stats.record_ignored(),
            Routed::Progress(delivery) => {
                self.stats.record_progress();
                if let Some(delivery) = delivery {
                    delivery.run();
                }
            }
            Routed::Complete { delivery, detached } => {
                self.stats.record_completed();
                if detached {
                    self.stats.record_detach();
                }
                debug!("preload session {} complete", event.session_id());
                if let Some(delivery) = delivery {
                    delivery.run();
                }
            }
        }
    }
}
