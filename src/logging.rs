// Diagnostic logging. Operator output goes to stdout and the report files;
// tracing events go to stderr and are quiet unless RUST_LOG asks for more.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)))
        .try_init();
}
