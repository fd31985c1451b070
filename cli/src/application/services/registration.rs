//! Application service: host registration bookkeeping.
//!
//! Thin glue over the Inventory and Ingress clients plus the marker files in
//! the metadata directory.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use nest_common::{Host, HostPatch, UploadResponse};
use tracing::{info, warn};

use crate::application::ports::{
    ArtifactCollector, HostInventory, LocalFs, ProgressReporter, UploadIngress,
};
use crate::domain::error::RegistrationError;
use crate::domain::registration::{ArchiveDescriptor, HostIdentity, RegistrationPaths, ScanKind};

/// Collector producing the host's canonical facts.
pub const FACTS_COLLECTOR: &str = "canonical-facts";
/// Archive uploaded at registration.
pub const REGISTRATION_SCAN: ScanKind = ScanKind::Advisor;

/// Read the stored machine id, if any.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn machine_id(fs: &impl LocalFs, paths: &RegistrationPaths) -> Result<Option<String>> {
    if !fs.exists(&paths.machine_id) {
        return Ok(None);
    }
    let raw = fs
        .read_to_string(&paths.machine_id)
        .context("reading machine id")?;
    let id = raw.trim();
    Ok((!id.is_empty()).then(|| id.to_string()))
}

/// The Inventory record for this host, or `None` when unregistered.
///
/// # Errors
///
/// Returns an error if the Inventory lookup fails.
pub fn registered_host(
    inventory: &impl HostInventory,
    fs: &impl LocalFs,
    paths: &RegistrationPaths,
) -> Result<Option<Host>> {
    let Some(id) = machine_id(fs, paths)? else {
        return Ok(None);
    };
    inventory
        .get_host(&id)
        .context("looking up host in inventory")
}

/// Identifiers of this host as known to Inventory, `None` when unregistered.
///
/// # Errors
///
/// Returns an error if the Inventory lookup fails.
pub fn host_identity(
    inventory: &impl HostInventory,
    fs: &impl LocalFs,
    paths: &RegistrationPaths,
) -> Result<Option<HostIdentity>> {
    Ok(registered_host(inventory, fs, paths)?.map(|host| HostIdentity::from(&host)))
}

/// Upload fresh canonical facts for a registered host, then apply `patch`
/// to the returned record when it sets anything.
///
/// # Errors
///
/// Returns `RegistrationError::NotRegistered` without a machine id, or the
/// collector/Inventory failure.
pub fn checkin(
    inventory: &impl HostInventory,
    collector: &impl ArtifactCollector,
    fs: &impl LocalFs,
    paths: &RegistrationPaths,
    patch: &HostPatch,
) -> Result<Host> {
    let id = machine_id(fs, paths)?.ok_or(RegistrationError::NotRegistered)?;
    let facts = collect_facts(collector, &id)?;
    let mut host = inventory.checkin(&facts).context("checking in")?;
    info!(host = %host.id, "check-in accepted");
    if !patch.is_empty() {
        inventory
            .update_host(&host.id, patch)
            .context("updating host names")?;
        if let Some(name) = &patch.display_name {
            host.display_name = Some(name.clone());
        }
        if let Some(name) = &patch.ansible_host {
            host.ansible_host = Some(name.clone());
        }
    }
    Ok(host)
}

/// Everything `register` and `scan` touch.
pub struct RegistrationPorts<'a, I, U, C, F> {
    pub inventory: &'a I,
    pub ingress: &'a U,
    pub collector: &'a C,
    pub fs: &'a F,
}

/// Register the host: new machine id, facts, archive upload, markers.
///
/// # Errors
///
/// Returns `RegistrationError::AlreadyRegistered` if Inventory already knows
/// this host, or the first collector/upload/filesystem failure.
pub fn register<I, U, C, F>(
    ports: &RegistrationPorts<'_, I, U, C, F>,
    reporter: &impl ProgressReporter,
    paths: &RegistrationPaths,
    new_machine_id: &str,
    now: DateTime<Utc>,
) -> Result<UploadResponse>
where
    I: HostInventory,
    U: UploadIngress,
    C: ArtifactCollector,
    F: LocalFs,
{
    let fs = ports.fs;
    if registered_host(ports.inventory, fs, paths)?.is_some() {
        return Err(RegistrationError::AlreadyRegistered.into());
    }

    ensure_parent(fs, &paths.machine_id)?;
    fs.write(&paths.machine_id, new_machine_id.as_bytes())
        .context("writing machine id")?;

    reporter.step("collecting facts...");
    let facts = collect_facts(ports.collector, new_machine_id)?;

    let response = upload_archive(ports, reporter, REGISTRATION_SCAN, &facts)?;

    fs.remove_file(&paths.unregistered)
        .context("removing unregistered marker")?;
    fs.write(&paths.registered, now.to_rfc3339().as_bytes())
        .context("writing registered marker")?;

    info!(request_id = %response.request_id, "host registered");
    Ok(response)
}

/// Collect one archive for a registered host and upload it with fresh facts.
///
/// # Errors
///
/// Returns `RegistrationError::NotRegistered` unless Inventory knows this
/// host, or the first collector/upload failure.
pub fn scan<I, U, C, F>(
    ports: &RegistrationPorts<'_, I, U, C, F>,
    reporter: &impl ProgressReporter,
    paths: &RegistrationPaths,
    kind: ScanKind,
) -> Result<UploadResponse>
where
    I: HostInventory,
    U: UploadIngress,
    C: ArtifactCollector,
    F: LocalFs,
{
    let id = machine_id(ports.fs, paths)?.ok_or(RegistrationError::NotRegistered)?;
    if ports
        .inventory
        .get_host(&id)
        .context("looking up host in inventory")?
        .is_none()
    {
        return Err(RegistrationError::NotRegistered.into());
    }

    reporter.step("collecting facts...");
    let facts = collect_facts(ports.collector, &id)?;
    let response = upload_archive(ports, reporter, kind, &facts)?;
    info!(
        collector = kind.collector(),
        request_id = %response.request_id,
        "scan uploaded"
    );
    Ok(response)
}

/// Run the archive collector for `kind`, upload its payload, then delete
/// the payload whether or not the upload was accepted.
fn upload_archive<I, U, C, F>(
    ports: &RegistrationPorts<'_, I, U, C, F>,
    reporter: &impl ProgressReporter,
    kind: ScanKind,
    facts: &serde_json::Value,
) -> Result<UploadResponse>
where
    U: UploadIngress,
    C: ArtifactCollector,
    F: LocalFs,
{
    reporter.step("collecting archive...");
    let archive: ArchiveDescriptor = serde_json::from_value(
        ports
            .collector
            .collect(kind.collector())
            .context("collecting archive")?,
    )
    .context("decoding archive descriptor")?;

    reporter.step("uploading archive...");
    let response = ports
        .ingress
        .upload(&archive.payload, &archive.content_type, facts)
        .context("uploading archive");

    if let Err(err) = ports.fs.remove_file(&archive.payload) {
        warn!(path = %archive.payload.display(), error = %format!("{err:#}"), "cannot remove archive");
    }
    response
}

/// Unregister the host and drop every downloaded artifact.
///
/// # Errors
///
/// Returns `RegistrationError::AlreadyUnregistered` when nothing indicates a
/// registration, or the first Inventory/filesystem failure.
pub fn unregister(
    inventory: &impl HostInventory,
    fs: &impl LocalFs,
    paths: &RegistrationPaths,
    artifact_dir: &Path,
    now: DateTime<Utc>,
) -> Result<()> {
    let id = machine_id(fs, paths)?;
    if id.is_none() && !fs.exists(&paths.registered) {
        return Err(RegistrationError::AlreadyUnregistered.into());
    }

    if let Some(id) = id {
        match inventory.get_host(&id).context("looking up host in inventory")? {
            Some(host) => {
                inventory
                    .delete_host(&host.id)
                    .context("deleting host from inventory")?;
                info!(host = %host.id, "host deleted from inventory");
            }
            None => warn!(machine_id = %id, "host not found in inventory"),
        }
    }

    fs.remove_file(&paths.machine_id).context("removing machine id")?;
    fs.remove_file(&paths.registered)
        .context("removing registered marker")?;
    if fs.exists(artifact_dir) {
        fs.clear_dir(artifact_dir)
            .context("removing downloaded artifacts")?;
    }
    if !fs.exists(&paths.unregistered) {
        ensure_parent(fs, &paths.unregistered)?;
        fs.write(&paths.unregistered, now.to_rfc3339().as_bytes())
            .context("writing unregistered marker")?;
    }
    Ok(())
}

/// Collect canonical facts and stamp them with the machine id.
fn collect_facts(collector: &impl ArtifactCollector, machine_id: &str) -> Result<serde_json::Value> {
    let mut facts = collector
        .collect(FACTS_COLLECTOR)
        .context("collecting canonical facts")?;
    if let Some(map) = facts.as_object_mut() {
        map.insert(
            "insights_id".to_string(),
            serde_json::Value::String(machine_id.to_string()),
        );
    }
    Ok(facts)
}

fn ensure_parent(fs: &impl LocalFs, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}
