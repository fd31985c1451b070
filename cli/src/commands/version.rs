//! Version command

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use crate::app::AppContext;
use crate::domain::artifact::ArtifactOrigin;
use crate::output::json;

/// Shown when the artifact version cannot be determined.
const UNKNOWN: &str = "unknown";

#[derive(Serialize)]
struct VersionReport<'a> {
    client: &'a str,
    core: &'a str,
    origin: Option<&'a str>,
}

/// Run the version command.
///
/// Prints the agent's own version and the version embedded in whichever
/// artifact the locator resolves. A missing or broken artifact is reported
/// as `unknown` rather than failing the command.
///
/// # Errors
///
/// Returns an error only if JSON serialization fails.
pub fn run(app: &AppContext) -> Result<()> {
    let client = env!("CARGO_PKG_VERSION");
    let (core, origin) = match query_core(app) {
        Ok((core, origin)) => (core, Some(origin)),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "artifact version unavailable");
            (UNKNOWN.to_string(), None)
        }
    };

    if app.is_json() {
        let report = VersionReport {
            client,
            core: &core,
            origin: origin.map(ArtifactOrigin::label),
        };
        println!("{}", json::format_value(&report)?);
    } else {
        println!("Client: {client}");
        println!("Core: {core}");
    }
    Ok(())
}

fn query_core(app: &AppContext) -> Result<(String, ArtifactOrigin)> {
    let artifact = app.locate()?;
    let core = app.runtime(&artifact).version(true, true)?;
    Ok((core, artifact.origin))
}
