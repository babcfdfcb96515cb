// Preload session manager: registry, listener lifecycle, event routing.

pub mod manager;
pub mod registry;
pub mod router;
pub mod state;
pub mod stats;
pub mod subscription;
