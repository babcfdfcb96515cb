use std::sync::Once;

use tracing::{info, warn};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::config::PreloaderConfig;

static INIT_TRACING: Once = Once::new();

/// Install the global `tracing` subscriber once. `RUST_LOG`, when set,
/// replaces the configured filter and its per-target directives.
pub fn init_tracing(config: &PreloaderConfig) {
    INIT_TRACING.call_once(|| {
        let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        let (filter, rejected) = build_filter(env.as_deref(), config);

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        for directive in rejected {
            warn!("ignoring malformed log directive {:?}", directive);
        }
        info!("preloader tracing initialized");
    });
}

/// Returns the filter together with the configured directives that failed
/// to parse.
fn build_filter(env: Option<&str>, config: &PreloaderConfig) -> (EnvFilter, Vec<String>) {
    if let Some(filter) = env.and_then(|raw| EnvFilter::try_new(raw).ok()) {
        return (filter, Vec::new());
    }

    let base = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let mut rejected = Vec::new();
    let filter = config
        .log_directives
        .iter()
        .fold(base, |filter, raw| match raw.parse::<Directive>() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => {
                rejected.push(raw.clone());
                filter
            }
        });
    (filter, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_directives_extend_base_filter() {
        let config = PreloaderConfig {
            log_filter: "warn".to_string(),
            log_directives: vec![
                "fast_image_preload::engine=debug".to_string(),
                "fast_image_preload=loudest".to_string(),
            ],
            ..PreloaderConfig::default()
        };
        let (filter, rejected) = build_filter(None, &config);

        let rendered = filter.to_string();
        assert!(rendered.contains("warn"));
        assert!(rendered.contains("fast_image_preload::engine=debug"));
        assert_eq!(rejected, vec!["fast_image_preload=loudest".to_string()]);
    }

    #[test]
    fn test_env_filter_replaces_config() {
        let config = PreloaderConfig {
            log_directives: vec!["fast_image_preload=loudest".to_string()],
            ..PreloaderConfig::default()
        };
        let (filter, rejected) = build_filter(Some("fast_image_preload=trace"), &config);

        assert!(filter.to_string().contains("fast_image_preload=trace"));
        assert!(rejected.is_empty());
    }
}
