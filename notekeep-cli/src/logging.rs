//! Logging setup for the CLI.
//!
//! Logging is off unless asked for:
//!
//! - `NOTEKEEP_DEBUG=true|1|yes` - Enable debug logging
//! - `NOTEKEEP_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `NOTEKEEP_LOG_FORMAT=json|pretty|compact` - Output format (default: compact)
//!
//! Log lines go to stderr so they never mix with command output.

use std::env;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `NOTEKEEP_DEBUG`.
pub fn is_debug_enabled() -> bool {
    debug_flag(env::var("NOTEKEEP_DEBUG").ok().as_deref())
}

fn debug_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Get the configured log level.
///
/// Defaults to "debug" when `NOTEKEEP_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    log_level(env::var("NOTEKEEP_LOG_LEVEL").ok().as_deref(), is_debug_enabled())
}

fn log_level(level: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    match level.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

/// Get the configured log format.
pub fn get_log_format() -> &'static str {
    log_format(env::var("NOTEKEEP_LOG_FORMAT").ok().as_deref())
}

fn log_format(format: Option<&str>) -> &'static str {
    match format.map(str::to_lowercase).as_deref() {
        Some("json") => "json",
        Some("pretty") => "pretty",
        _ => "compact",
    }
}

/// Initialize logging. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("NOTEKEEP_LOG_LEVEL").is_err() {
            return;
        }

        let level = get_log_level();
        let filter = EnvFilter::try_new(format!(
            "notekeep={},notekeep_cli={},notekeep_mongodb={}",
            level, level, level
        ))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

        let registry = tracing_subscriber::registry().with(filter);
        match get_log_format() {
            "json" => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init(),
            "pretty" => registry
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init(),
            _ => registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init(),
        }

        tracing::info!(level, format = get_log_format(), "Notekeep logging initialized");
    });
}
