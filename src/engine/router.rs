// Routes shared progress/complete events to the session that owns them.
//
// Routing only performs the state transition and returns the callback to
// run; the caller invokes it after releasing the state lock.

use tracing::trace;

use super::registry::BatchCallback;
use super::state::PreloadState;
use crate::pipeline::events::{CompleteEvent, PipelineEvent, ProgressEvent};
use crate::pipeline::traits::EventSource;

/// A callback invocation deferred until the state lock is released.
pub struct Delivery {
    callback: BatchCallback,
    first: u32,
    second: u32,
}

impl Delivery {
    pub fn run(self) {
        (self.callback)(self.first, self.second);
    }
}

pub enum Routed {
    /// No registered session carries the event's id.
    Ignored,
    Progress(Option<Delivery>),
    Complete {
        delivery: Option<Delivery>,
        detached: bool,
    },
}

pub fn route(state: &mut PreloadState, events: &dyn EventSource, event: &PipelineEvent) -> Routed {
    match event {
        PipelineEvent::Progress(progress) => route_progress(state, progress),
        PipelineEvent::Complete(complete) => route_complete(state, events, complete),
    }
}

fn route_progress(state: &PreloadState, event: &ProgressEvent) -> Routed {
    let Some(session) = state.session(event.session_id) else {
        trace!("progress for unregistered session {}", event.session_id);
        return Routed::Ignored;
    };
    let delivery = session.on_progress.clone().map(|callback| Delivery {
        callback,
        first: event.completed,
        second: event.total,
    });
    Routed::Progress(delivery)
}

fn route_complete(
    state: &mut PreloadState,
    events: &dyn EventSource,
    event: &CompleteEvent,
) -> Routed {
    let Some(finished) = state.finish(event.session_id, events) else {
        trace!("complete for unregistered session {}", event.session_id);
        return Routed::Ignored;
    };
    let delivery = finished.session.on_complete.map(|callback| Delivery {
        callback,
        first: event.completed,
        second: event.skipped,
    });
    Routed::Complete {
        delivery,
        detached: finished.detached,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::engine::registry::PreloadCallbacks;
    use crate::engine::subscription::RouteHandlers;
    use crate::pipeline::emitter::EventEmitter;
    use crate::pipeline::traits::{EventHandler, SessionId};

    fn attached_state(emitter: &EventEmitter, sessions: Vec<(u64, PreloadCallbacks)>) -> PreloadState {
        let h: EventHandler = Arc::new(|_: &PipelineEvent| {});
        let handlers = RouteHandlers {
            progress: h.clone(),
            complete: h,
        };
        let mut state = PreloadState::new();
        for (id, callbacks) in sessions {
            state.register(callbacks.into_session(SessionId(id)), emitter, &handlers);
        }
        state
    }

    #[test]
    fn test_progress_for_known_session_delivers() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let mut state = attached_state(
            &emitter,
            vec![(1, PreloadCallbacks::new().on_progress(move |c, t| sink.lock().push((c, t))))],
        );

        match route(&mut state, &emitter, &PipelineEvent::progress(SessionId(1), 1, 2)) {
            Routed::Progress(Some(delivery)) => delivery.run(),
            _ => panic!("expected a progress delivery"),
        }
        assert_eq!(*calls.lock(), vec![(1, 2)]);
        assert!(state.registry().contains(SessionId(1)));
    }

    #[test]
    fn test_unknown_session_is_ignored() {
        let emitter = EventEmitter::new();
        let mut state = attached_state(&emitter, vec![(1, PreloadCallbacks::new())]);

        let progress = route(&mut state, &emitter, &PipelineEvent::progress(SessionId(9), 1, 1));
        assert!(matches!(progress, Routed::Ignored));
        let complete = route(&mut state, &emitter, &PipelineEvent::complete(SessionId(9), 1, 0));
        assert!(matches!(complete, Routed::Ignored));
        assert_eq!(state.registry().len(), 1);
        assert!(state.is_consistent());
    }

    #[test]
    fn test_complete_without_callback_still_removes() {
        let emitter = EventEmitter::new();
        let mut state = attached_state(&emitter, vec![(4, PreloadCallbacks::new())]);

        match route(&mut state, &emitter, &PipelineEvent::complete(SessionId(4), 3, 1)) {
            Routed::Complete { delivery, detached } => {
                assert!(delivery.is_none());
                assert!(detached);
            }
            _ => panic!("expected completion"),
        }
        assert!(state.registry().is_empty());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_complete_delivers_completed_and_skipped() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let progress_sink = calls.clone();
        let complete_sink = calls.clone();
        let mut state = attached_state(
            &emitter,
            vec![(
                3,
                PreloadCallbacks::new()
                    .on_progress(move |c, t| progress_sink.lock().push(("progress", c, t)))
                    .on_complete(move |c, s| complete_sink.lock().push(("complete", c, s))),
            )],
        );

        match route(&mut state, &emitter, &PipelineEvent::complete(SessionId(3), 5, 2)) {
            Routed::Complete {
                delivery: Some(delivery),
                detached,
            } => {
                assert!(detached);
                delivery.run();
            }
            _ => panic!("expected a complete delivery"),
        }
        assert_eq!(*calls.lock(), vec![("complete", 5, 2)]);
    }

    #[test]
    fn test_progress_after_complete_is_ignored() {
        let emitter = EventEmitter::new();
        let calls = Arc::new(Mutex::new(0u32));
        let sink = calls.clone();
        let mut state = attached_state(
            &emitter,
            vec![(2, PreloadCallbacks::new().on_progress(move |_, _| *sink.lock() += 1))],
        );

        route(&mut state, &emitter, &PipelineEvent::complete(SessionId(2), 1, 0));
        let late = route(&mut state, &emitter, &PipelineEvent::progress(SessionId(2), 1, 1));
        assert!(matches!(late, Routed::Ignored));
        assert_eq!(*calls.lock(), 0);
    }
}
