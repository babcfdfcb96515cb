use anyhow::Result;
use serde::Deserialize;

/// Wire name of the progress event published by the native pipeline.
pub const PROGRESS_EVENT_NAME: &str = "fffastimage-progress";

/// Wire name of the completion event published by the native pipeline.
pub const COMPLETE_EVENT_NAME: &str = "fffastimage-complete";

/// Default capacity of the command channel towards the native pipeline.
pub const DEFAULT_COMMAND_CAPACITY: usize = 64;

/// Default capacity of the event channel coming back from the native pipeline.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Top-level configuration for the preloader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreloaderConfig {
    /// Bound on queued commands (create session, submit batch, cache clears).
    /// Zero is treated as one.
    pub command_capacity: usize,
    /// Bound on queued native events awaiting dispatch.
    pub event_capacity: usize,
    /// Default `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Per-target directives layered over `log_filter`, e.g.
    /// `"fast_image_preload::engine=debug"`.
    pub log_directives: Vec<String>,
}

impl PreloaderConfig {
    /// Parse a configuration document; missing fields fall back to defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl Default for PreloaderConfig {
    fn default() -> Self {
        Self {
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_filter: "info".to_string(),
            log_directives: Vec::new(),
        }
    }
}
