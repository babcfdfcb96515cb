// Drains native events into the emitter, one at a time, in arrival order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::emitter::EventEmitter;
use super::events::PipelineEvent;

pub struct EventPump {
    shutdown_token: CancellationToken,
    dispatched: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl EventPump {
    /// Start pumping `events` into `emitter`. Must be called inside a tokio runtime.
    pub fn spawn(emitter: EventEmitter, mut events: mpsc::Receiver<PipelineEvent>) -> Self {
        let shutdown_token = CancellationToken::new();
        let dispatched = Arc::new(AtomicU64::new(0));

        let token = shutdown_token.clone();
        let counter = Arc::clone(&dispatched);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("event pump cancelled");
                        break;
                    }
                    next = events.recv() => match next {
                        Some(event) => {
                            emitter.emit(&event);
                            counter.fetch_add(1, Ordering::Relaxed);
                        }
                        None => {
                            info!("native event channel closed, event pump exiting");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_token,
            dispatched,
            task: Some(task),
        }
    }

    /// Number of events handed to the emitter so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop dispatching. Events still queued are dropped.
    pub fn shutdown(&self) {
        self.shutdown_token.cancel();
    }

    /// Wait for the pump task to exit (after `shutdown` or channel close).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
