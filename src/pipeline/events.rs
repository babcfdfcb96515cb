// Event model of the shared progress/complete broadcast.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use super::traits::SessionId;
use crate::config::{COMPLETE_EVENT_NAME, PROGRESS_EVENT_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Progress,
    Complete,
}

impl EventKind {
    /// Name the native side publishes this kind under.
    pub fn wire_name(self) -> &'static str {
        match self {
            EventKind::Progress => PROGRESS_EVENT_NAME,
            EventKind::Complete => COMPLETE_EVENT_NAME,
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        match name {
            PROGRESS_EVENT_NAME => Some(EventKind::Progress),
            COMPLETE_EVENT_NAME => Some(EventKind::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "id")]
    pub session_id: SessionId,
    #[serde(rename = "finished")]
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteEvent {
    #[serde(rename = "id")]
    pub session_id: SessionId,
    #[serde(rename = "finished")]
    pub completed: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    Progress(ProgressEvent),
    Complete(CompleteEvent),
}

impl PipelineEvent {
    pub fn progress(session_id: SessionId, completed: u32, total: u32) -> Self {
        PipelineEvent::Progress(ProgressEvent {
            session_id,
            completed,
            total,
        })
    }

    pub fn complete(session_id: SessionId, completed: u32, skipped: u32) -> Self {
        PipelineEvent::Complete(CompleteEvent {
            session_id,
            completed,
            skipped,
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            PipelineEvent::Progress(_) => EventKind::Progress,
            PipelineEvent::Complete(_) => EventKind::Complete,
        }
    }

    pub fn session_id(&self) -> SessionId {
        match self {
            PipelineEvent::Progress(e) => e.session_id,
            PipelineEvent::Complete(e) => e.session_id,
        }
    }

    /// Decode a native `(event name, JSON body)` pair.
    pub fn decode(name: &str, payload: &str) -> Result<Self> {
        let kind = EventKind::from_wire_name(name)
            .ok_or_else(|| anyhow!("unknown pipeline event name: {}", name))?;
        let event = match kind {
            EventKind::Progress => PipelineEvent::Progress(serde_json::from_str(payload)?),
            EventKind::Complete => PipelineEvent::Complete(serde_json::from_str(payload)?),
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_progress_payload() {
        let event =
            PipelineEvent::decode("fffastimage-progress", r#"{"id":7,"finished":1,"total":3}"#)
                .unwrap();
        assert_eq!(event, PipelineEvent::progress(SessionId(7), 1, 3));
        assert_eq!(event.kind(), EventKind::Progress);
    }

    #[test]
    fn test_decode_complete_payload() {
        let event =
            PipelineEvent::decode("fffastimage-complete", r#"{"id":7,"finished":2,"skipped":1}"#)
                .unwrap();
        assert_eq!(event, PipelineEvent::complete(SessionId(7), 2, 1));
        assert_eq!(event.session_id(), SessionId(7));
    }

    #[test]
    fn test_decode_rejects_unknown_name() {
        assert!(PipelineEvent::decode("fffastimage-load", r#"{"id":1}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        assert!(PipelineEvent::decode("fffastimage-complete", r#"{"id":1,"finished":2}"#).is_err());
    }

    #[test]
    fn test_wire_name_lookup() {
        for kind in [EventKind::Progress, EventKind::Complete] {
            assert_eq!(EventKind::from_wire_name(kind.wire_name()), Some(kind));
        }
    }
}
