//! Unregister command

use anyhow::Result;
use chrono::Utc;

use crate::app::AppContext;
use crate::application::services::registration::unregister;

/// Run the unregister command.
///
/// # Errors
///
/// Returns `RegistrationError::AlreadyUnregistered` when nothing indicates a
/// registration, or any Inventory/filesystem failure.
pub fn run(app: &AppContext) -> Result<()> {
    let inventory = app.inventory();
    unregister(
        &inventory,
        &app.fs,
        &app.registration_paths(),
        &app.config.artifact.artifact_directory,
        Utc::now(),
    )?;
    app.emit_success("This host has been unregistered.")
}
