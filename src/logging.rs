use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the filter directive, e.g. `metro_progress=debug`.
pub const LOG_ENV: &str = "METRO_PROGRESS_LOG";

/// Logs go to stderr; stdout carries only the final JSON result.
///
/// `default_level` applies when [`LOG_ENV`] is unset.
pub fn init_logger(default_level: &str) {
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_string());

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(EnvFilter::new(filter))
        .try_init();
}
