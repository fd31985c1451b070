//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one object on stdout.

use anyhow::{Context, Result};
use serde::Serialize;

/// Format the outcome of a command.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "message": "...",
///   "ok": true
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_message(message: &str, ok: bool) -> Result<String> {
    let obj = serde_json::json!({
        "message": message,
        "ok": ok,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Format any serializable document, e.g. the host identity.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_value(value: &impl Serialize) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}
