//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default filter that `RUST_LOG` may still override.
///
/// Safe to call more than once; later calls are ignored, which keeps test
/// binaries that initialise logging per test from panicking.
pub fn init_with_level(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .try_init();
}
