//! Register command

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::app::AppContext;
use crate::application::services::registration::{RegistrationPorts, register};
use crate::output::TerminalReporter;

/// Run the register command.
///
/// # Errors
///
/// Returns an error if the host is already registered, no artifact can be
/// located, collection fails, or the upload is rejected.
pub fn run(app: &AppContext) -> Result<()> {
    app.refresh_artifact();
    let artifact = app.locate()?;
    let runtime = app.runtime(&artifact);
    let inventory = app.inventory();
    let ingress = app.ingress();
    let ports = RegistrationPorts {
        inventory: &inventory,
        ingress: &ingress,
        collector: &runtime,
        fs: &app.fs,
    };

    let machine_id = Uuid::new_v4().to_string();
    let reporter = TerminalReporter::new(&app.output);
    let response = register(
        &ports,
        &reporter,
        &app.registration_paths(),
        &machine_id,
        Utc::now(),
    )?;
    info!(org_id = ?response.upload.org_id, "upload accepted");
    app.emit_success("This host has been registered.")
}
