//! # Telemetry
//!
//! Tracing subscriber initialization for embedding applications.

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=emporia=trace` - Show trace for emporia crates only
/// - Default: INFO level, engine crates at DEBUG, sqlx at WARN
///
/// Call once at process startup; subsequent calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emporia=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
