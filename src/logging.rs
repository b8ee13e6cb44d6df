/// Tracing setup
///
/// `RUST_LOG` wins when set. Otherwise the bot's own `LOG_LEVEL` (Python
/// level names) picks the filter, so one .env drives both processes.

use tracing_subscriber::EnvFilter;

/// Map a Python-style level name onto a tracing filter directive
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_uppercase().as_str() {
        "TRACE" => "trace",
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" | "FATAL" => "error",
        _ => "info",
    }
}

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_default();
        EnvFilter::new(level_directive(&level))
    });

    // try_init: tests and embedding callers may already have a subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
