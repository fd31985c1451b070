//! Scan commands: collect an advisor or compliance archive and upload it.

use anyhow::Result;
use tracing::info;

use crate::app::AppContext;
use crate::application::services::registration::{RegistrationPorts, scan};
use crate::domain::registration::ScanKind;
use crate::output::TerminalReporter;

/// Run one scan.
///
/// # Errors
///
/// Returns an error if the host is not registered, no artifact can be
/// located, collection fails, or the upload is rejected.
pub fn run(app: &AppContext, kind: ScanKind) -> Result<()> {
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

    let reporter = TerminalReporter::new(&app.output);
    let response = scan(&ports, &reporter, &app.registration_paths(), kind)?;
    info!(request_id = %response.request_id, "scan accepted");
    app.emit_success(match kind {
        ScanKind::Advisor => "Advisor results uploaded.",
        ScanKind::Compliance => "Compliance results uploaded.",
    })
}
