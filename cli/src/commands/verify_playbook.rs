//! Verify-playbook command

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::LocalFs;
use crate::commands::VerifyPlaybookArgs;

/// Run the verify-playbook command.
///
/// Prints the verified playbook on stdout so it can be piped onward.
///
/// # Errors
///
/// Returns an error if the playbook cannot be read, no artifact can be
/// located, or the signature check fails.
pub fn run(app: &AppContext, args: &VerifyPlaybookArgs) -> Result<()> {
    let playbook = app.fs.read_to_string(&args.playbook)?;
    let artifact = app.locate()?;
    let verified = app.runtime(&artifact).verify_playbook(playbook.as_bytes())?;
    print!("{verified}");
    Ok(())
}
