use tracing_subscriber::{EnvFilter, fmt};

/// Installs a `tracing` fmt subscriber filtered by `filter`.
///
/// `RUST_LOG`, when set, takes precedence. Calling this again after a subscriber is installed is
/// a no-op, so tests and demos can call it freely.
pub fn init_logging(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
