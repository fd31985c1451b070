//! Identity command

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::registration::host_identity;
use crate::output::json;

const UNSET: &str = "-";

/// Run the identity command.
///
/// An unregistered host is not an error: JSON mode prints every field as
/// `null`, human mode says so.
///
/// # Errors
///
/// Returns an error if Inventory is unreachable.
pub fn run(app: &AppContext) -> Result<()> {
    let inventory = app.inventory();
    let identity = host_identity(&inventory, &app.fs, &app.registration_paths())?;

    if app.is_json() {
        println!("{}", json::format_value(&identity.unwrap_or_default())?);
        return Ok(());
    }
    let Some(identity) = identity else {
        println!("This host is not registered.");
        return Ok(());
    };

    let rows = [
        ("Insights UUID", &identity.insights_id),
        ("Client UUID", &identity.insights_client_id),
        ("Subscription UUID", &identity.subscription_manager_id),
        ("FQDN", &identity.fqdn),
        ("Display name", &identity.display_name),
        ("Ansible host", &identity.ansible_host),
    ];
    for (key, value) in rows {
        println!("{key}: {}", value.as_deref().unwrap_or(UNSET));
    }
    Ok(())
}
