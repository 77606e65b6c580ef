use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber. `filter` uses `EnvFilter` directive syntax
/// and falls back to the crate default when it doesn't parse.
pub fn setup_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::constants::DEFAULT_LOG_FILTER));

    let stdout_layer = fmt::layer()
        .with_level(true)
        .with_target(true)
        .with_thread_names(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .init();
}
