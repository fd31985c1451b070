//! Tracing subscriber setup. Logs always go to stderr.

use tracing_subscriber::EnvFilter;

use crate::domain::config::LoggingConfig;

/// Forces `debug` for every target when set to `1` or `true`.
pub const DEBUG_STDERR_VARIABLE: &str = "NEST_DEBUG_STDERR";
/// Echoes every HTTP response to stderr when set to any value.
pub const DEBUG_HTTP_VARIABLE: &str = "NEST_DEBUG_HTTP";

/// Pick the filter directives: `RUST_LOG` wins, then the debug switch, then
/// the configured per-target levels.
#[must_use]
pub fn directives(rust_log: Option<&str>, debug_stderr: Option<&str>, config: &LoggingConfig) -> String {
    if let Some(value) = rust_log.filter(|v| !v.trim().is_empty()) {
        return value.to_string();
    }
    if debug_stderr.is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")) {
        return "debug".to_string();
    }
    config.directives()
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let debug_stderr = std::env::var(DEBUG_STDERR_VARIABLE).ok();
    let directives = directives(rust_log.as_deref(), debug_stderr.as_deref(), config);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

/// Whether HTTP responses should be echoed to stderr.
#[must_use]
pub fn http_echo_enabled() -> bool {
    std::env::var_os(DEBUG_HTTP_VARIABLE).is_some()
}
