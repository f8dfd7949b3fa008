//! Logging setup.
//!
//! Decorators emit `tracing` events: cache hits at `trace`, misses,
//! evictions, retry attempts and background task lifecycles at `debug`,
//! deadline overruns, interrupted retries and worker panics at `warn`.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber filtered by `RUST_LOG`, falling back
/// to `default_filter`.
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .is_ok()
}
