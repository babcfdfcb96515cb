// Process-wide preloader: one manager per process, reachable through free
// functions the way the image component exposes its static preload entry.

use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, Result};
use tracing::info;

use super::logging::init_tracing;
use crate::config::PreloaderConfig;
use crate::engine::manager::PreloaderManager;
use crate::engine::registry::PreloadCallbacks;
use crate::pipeline::bridge::{self, NativeEndpoint};
use crate::pipeline::descriptor::ResourceDescriptor;
use crate::pipeline::emitter::EventEmitter;
use crate::pipeline::pump::EventPump;

struct Installed {
    manager: PreloaderManager,
    emitter: Option<EventEmitter>,
    _pump: Option<EventPump>,
}

static PRELOADER: OnceLock<Installed> = OnceLock::new();

/// Start the process-wide preloader on a channel bridge and return the
/// endpoint the native pipeline serves. Must run inside a tokio runtime.
pub fn launch(config: &PreloaderConfig) -> Result<NativeEndpoint> {
    init_tracing(config);

    let (gateway, endpoint, native_events) = bridge::connect(config);
    let emitter = EventEmitter::new();
    let pump = EventPump::spawn(emitter.clone(), native_events);
    let manager = PreloaderManager::new(Arc::new(gateway), Arc::new(emitter.clone()));

    PRELOADER
        .set(Installed {
            manager,
            emitter: Some(emitter),
            _pump: Some(pump),
        })
        .map_err(|_| anyhow!("preloader already installed"))?;
    info!(
        "preloader launched (commands={}, events={})",
        config.command_capacity, config.event_capacity
    );
    Ok(endpoint)
}

/// Install a manager built on a caller-supplied gateway and event source.
pub fn install(manager: PreloaderManager) -> Result<()> {
    PRELOADER
        .set(Installed {
            manager,
            emitter: None,
            _pump: None,
        })
        .map_err(|_| anyhow!("preloader already installed"))
}

pub fn manager() -> Option<PreloaderManager> {
    PRELOADER.get().map(|installed| installed.manager.clone())
}

/// The shared event channel when launched on the bridge, so other consumers
/// can listen to the same pipeline events.
pub fn event_emitter() -> Option<EventEmitter> {
    PRELOADER.get().and_then(|installed| installed.emitter.clone())
}

fn installed_manager() -> Result<&'static PreloaderManager> {
    PRELOADER
        .get()
        .map(|installed| &installed.manager)
        .ok_or_else(|| anyhow!("preloader not installed"))
}

pub fn preload(descriptors: Vec<ResourceDescriptor>, callbacks: PreloadCallbacks) -> Result<()> {
    installed_manager()?.preload(descriptors, callbacks);
    Ok(())
}

pub async fn clear_memory_cache() -> Result<()> {
    installed_manager()?.clear_memory_cache().await
}

pub async fn clear_disk_cache() -> Result<()> {
    installed_manager()?.clear_disk_cache().await
}
