//! Check-in command: send fresh canonical facts to Inventory.

use anyhow::Result;
use nest_common::HostPatch;

use crate::app::AppContext;
use crate::application::services::registration;
use crate::commands::CheckinArgs;

/// Run the checkin command.
///
/// # Errors
///
/// Returns an error if the host is not registered, no artifact can be
/// located, fact collection fails, or Inventory rejects the facts.
pub fn run(app: &AppContext, args: CheckinArgs) -> Result<()> {
    app.refresh_artifact();
    let artifact = app.locate()?;
    let runtime = app.runtime(&artifact);
    let inventory = app.inventory();
    let patch = HostPatch {
        display_name: args.display_name,
        ansible_host: args.ansible_host,
    };

    let host = registration::checkin(
        &inventory,
        &runtime,
        &app.fs,
        &app.registration_paths(),
        &patch,
    )?;
    app.emit_success(&format!("Successfully checked in host {}.", host.id))
}
