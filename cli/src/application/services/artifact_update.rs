//! Application service: the fetch, verify and promote cycle for the artifact.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::application::ports::{
    ArtifactDownloader, ChannelRouter, LocalFs, ProgressReporter, SignatureVerifier,
};
use crate::domain::artifact::{
    ArtifactFetch, ArtifactPaths, Download, UpdateOptions, UpdateResult, Verification,
    token_unchanged,
};
use crate::domain::digest::sha256_hex;

/// Collaborators of one update cycle.
pub struct UpdatePorts<'a, R, D, V, F> {
    pub router: &'a R,
    pub downloader: &'a D,
    pub verifier: &'a V,
    pub fs: &'a F,
}

/// Run one update cycle to completion.
///
/// Never fails: every internal error becomes one of the four terminal
/// results and is logged with its full chain.
pub fn update_artifact<R, D, V, F>(
    ports: &UpdatePorts<'_, R, D, V, F>,
    reporter: &impl ProgressReporter,
    module: &str,
    paths: &ArtifactPaths,
    options: UpdateOptions,
) -> UpdateResult
where
    R: ChannelRouter,
    D: ArtifactDownloader,
    V: SignatureVerifier,
    F: LocalFs,
{
    let result = match run_cycle(ports, reporter, module, paths, options) {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "artifact update failed");
            UpdateResult::FetchFailed
        }
    };
    info!(result = ?result, force = options.force, "artifact update finished");
    result
}

fn run_cycle<R, D, V, F>(
    ports: &UpdatePorts<'_, R, D, V, F>,
    reporter: &impl ProgressReporter,
    module: &str,
    paths: &ArtifactPaths,
    options: UpdateOptions,
) -> Result<UpdateResult>
where
    R: ChannelRouter,
    D: ArtifactDownloader,
    V: SignatureVerifier,
    F: LocalFs,
{
    let fs = ports.fs;

    reporter.step("resolving distribution channel...");
    let route = ports
        .router
        .resolve_route(module)
        .with_context(|| format!("resolving route for module {module}"))?;
    debug!(route = %route.url, "route resolved");

    let stored = read_token(fs, &paths.artifact_token);
    let conditional = if options.force { None } else { stored.as_deref() };

    reporter.step("downloading artifact...");
    let artifact = match ports
        .downloader
        .fetch_artifact(&route, conditional)
        .context("downloading artifact")?
    {
        ArtifactFetch::NotModified => {
            debug!("server reported the artifact as not modified");
            return Ok(UpdateResult::NoUpdateNeeded);
        }
        ArtifactFetch::Fetched(download) => download,
    };

    if !options.force && token_unchanged(stored.as_deref(), artifact.token.as_deref()) {
        debug!("artifact token unchanged");
        return Ok(UpdateResult::NoUpdateNeeded);
    }

    persist_token(fs, &paths.artifact_token, artifact.token.as_deref())?;
    write_file(fs, &paths.untrusted_artifact, &artifact.body)?;

    reporter.step("downloading signature...");
    let signature = ports
        .downloader
        .fetch_signature(&route)
        .context("downloading signature")?;
    write_file(fs, &paths.untrusted_signature, &signature.body)?;
    persist_token(fs, &paths.signature_token, signature.token.as_deref())?;

    match options.verification {
        Verification::Required => {
            reporter.step("verifying signature...");
            if !ports
                .verifier
                .verify(&paths.untrusted_artifact, &paths.untrusted_signature)
            {
                discard_untrusted(fs, paths);
                return Ok(UpdateResult::VerificationFailed);
            }
        }
        Verification::Skip => {
            warn!("signature verification skipped; promoting an unverified artifact");
        }
    }

    promote(fs, paths, &artifact)?;
    Ok(UpdateResult::UpdateSucceeded)
}

/// Read the stored token. Unreadable or blank files count as absent.
fn read_token(fs: &impl LocalFs, path: &Path) -> Option<String> {
    if !fs.exists(path) {
        return None;
    }
    match fs.read_to_string(path) {
        Ok(raw) => {
            let token = raw.trim();
            (!token.is_empty()).then(|| token.to_string())
        }
        Err(err) => {
            warn!(path = %path.display(), error = %format!("{err:#}"), "cannot read cache token");
            None
        }
    }
}

fn persist_token(fs: &impl LocalFs, path: &Path, token: Option<&str>) -> Result<()> {
    match token {
        Some(token) => write_file(fs, path, token.as_bytes()),
        None => {
            fs.remove_file(path)
                .with_context(|| format!("removing stale token {}", path.display()))?;
            Ok(())
        }
    }
}

fn write_file(fs: &impl LocalFs, path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs.write(path, content)
        .with_context(|| format!("writing {}", path.display()))
}

fn discard_untrusted(fs: &impl LocalFs, paths: &ArtifactPaths) {
    for path in [&paths.untrusted_artifact, &paths.untrusted_signature] {
        if let Err(err) = fs.remove_file(path) {
            warn!(path = %path.display(), error = %format!("{err:#}"), "cannot remove untrusted file");
        }
    }
}

/// Move the verified pair into the trusted names, both or neither.
///
/// The previous trusted signature is parked first. The artifact rename
/// replaces the old artifact atomically, so only the signature needs
/// restoring when a later step fails.
fn promote(fs: &impl LocalFs, paths: &ArtifactPaths, artifact: &Download) -> Result<()> {
    let parked = fs.exists(&paths.trusted_signature);
    if parked {
        fs.rename(&paths.trusted_signature, &paths.previous_signature)
            .context("parking trusted signature")?;
    }

    let moved = fs
        .rename(&paths.untrusted_signature, &paths.trusted_signature)
        .context("promoting signature")
        .and_then(|()| {
            fs.rename(&paths.untrusted_artifact, &paths.trusted_artifact)
                .context("promoting artifact")
        });
    if let Err(err) = moved {
        restore_signature(fs, paths, parked);
        return Err(err);
    }

    if parked {
        if let Err(err) = fs.remove_file(&paths.previous_signature) {
            warn!(error = %format!("{err:#}"), "cannot remove parked signature");
        }
    }
    info!(
        path = %paths.trusted_artifact.display(),
        sha256 = %sha256_hex(&artifact.body),
        "artifact promoted"
    );
    Ok(())
}

/// Put the trusted signature back the way it was before `promote`.
fn restore_signature(fs: &impl LocalFs, paths: &ArtifactPaths, parked: bool) {
    let restored = if parked {
        fs.rename(&paths.previous_signature, &paths.trusted_signature)
    } else {
        fs.remove_file(&paths.trusted_signature).map(|_| ())
    };
    if let Err(err) = restored {
        warn!(error = %format!("{err:#}"), "cannot restore trusted signature");
    }
}
