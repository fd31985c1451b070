//! Update command: run one artifact update cycle.

use anyhow::{Result, bail};
use tracing::warn;

use crate::app::AppContext;
use crate::commands::UpdateArgs;
use crate::domain::artifact::{UpdateOptions, Verification};

/// Run the update command.
///
/// # Errors
///
/// Returns an error carrying the cycle's message when it ends in
/// `FetchFailed` or `VerificationFailed`.
pub fn run(app: &AppContext, args: &UpdateArgs) -> Result<()> {
    let verification = if args.insecure {
        warn!("signature verification disabled by --insecure");
        app.output.warn(
            "WARNING: --insecure promotes the artifact without checking its signature. \
             Anyone able to tamper with the download controls this host.",
        );
        Verification::Skip
    } else {
        Verification::Required
    };

    let result = app.run_update(UpdateOptions {
        force: args.force || app.force_update,
        verification,
    });
    if !result.is_ok() {
        bail!(result.message());
    }
    app.emit_success(result.message())
}
