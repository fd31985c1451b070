//! Status command: is this host registered?

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::registration::registered_host;
use crate::domain::error::RegistrationError;

/// Run the status command.
///
/// # Errors
///
/// Returns `RegistrationError::NotRegistered` when there is no machine id or
/// Inventory has no host for it, or any Inventory failure.
pub fn run(app: &AppContext) -> Result<()> {
    let inventory = app.inventory();
    match registered_host(&inventory, &app.fs, &app.registration_paths())? {
        Some(_) => app.emit_success("This host is registered."),
        None => Err(RegistrationError::NotRegistered.into()),
    }
}
