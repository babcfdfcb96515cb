// Resource descriptors handed to the native pipeline as-is.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CacheControl {
    /// Ignore headers, use the uri as cache key, fetch only if not cached.
    #[default]
    Immutable,
    /// Respect http cache headers.
    Web,
    /// Only load from cache.
    CacheOnly,
}

/// One image to warm. Opaque to the preloader; the pipeline interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub cache: CacheControl,
}

impl ResourceDescriptor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: HashMap::new(),
            priority: Priority::default(),
            cache: CacheControl::default(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_cache(mut self, cache: CacheControl) -> Self {
        self.cache = cache;
        self
    }
}
