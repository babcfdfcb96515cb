pub mod api;
pub mod config;
pub mod engine;
pub mod pipeline;

pub use config::PreloaderConfig;
pub use engine::manager::PreloaderManager;
pub use engine::registry::PreloadCallbacks;
pub use pipeline::descriptor::{CacheControl, Priority, ResourceDescriptor};
pub use pipeline::events::{EventKind, PipelineEvent};
pub use pipeline::traits::{CommandGateway, EventSource, SessionId};
