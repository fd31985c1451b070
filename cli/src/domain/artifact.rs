//! Artifact lifecycle types: on-disk layout, fetch outcomes, update results,
//! and the runtime expressions used to query an artifact.
//!
//! Pure data and functions only.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::config::ArtifactConfig;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Control variable holding an explicit artifact path.
pub const OVERRIDE_VARIABLE: &str = "NEST_ARTIFACT";

pub const UNTRUSTED_ARTIFACT: &str = "untrusted.bin";
pub const UNTRUSTED_SIGNATURE: &str = "untrusted.bin.sig";
pub const TRUSTED_ARTIFACT: &str = "current.bin";
pub const TRUSTED_SIGNATURE: &str = "current.bin.sig";
/// Trusted signature parked while a promotion is in flight.
pub const PREVIOUS_SIGNATURE: &str = "current.bin.sig.previous";
pub const ARTIFACT_TOKEN: &str = ".artifact.etag";
pub const SIGNATURE_TOKEN: &str = ".artifact-sig.etag";
pub const PACKAGED_ARTIFACT: &str = "rpm-packaged.bin";

/// Suffix of the detached signature, both remotely and locally.
pub const SIGNATURE_SUFFIX: &str = ".sig";

// ── Layout ────────────────────────────────────────────────────────────────────

/// Every persisted path the update pipeline touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub untrusted_artifact: PathBuf,
    pub untrusted_signature: PathBuf,
    pub trusted_artifact: PathBuf,
    pub trusted_signature: PathBuf,
    pub previous_signature: PathBuf,
    pub artifact_token: PathBuf,
    pub signature_token: PathBuf,
    pub packaged_artifact: PathBuf,
}

impl ArtifactPaths {
    #[must_use]
    pub fn new(artifact_dir: &Path, meta_dir: &Path) -> Self {
        Self {
            untrusted_artifact: artifact_dir.join(UNTRUSTED_ARTIFACT),
            untrusted_signature: artifact_dir.join(UNTRUSTED_SIGNATURE),
            trusted_artifact: artifact_dir.join(TRUSTED_ARTIFACT),
            trusted_signature: artifact_dir.join(TRUSTED_SIGNATURE),
            previous_signature: artifact_dir.join(PREVIOUS_SIGNATURE),
            artifact_token: meta_dir.join(ARTIFACT_TOKEN),
            signature_token: meta_dir.join(SIGNATURE_TOKEN),
            packaged_artifact: meta_dir.join(PACKAGED_ARTIFACT),
        }
    }

    #[must_use]
    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self::new(&config.artifact_directory, &config.metadata_directory)
    }
}

/// Which candidate the locator settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactOrigin {
    /// Operator-specified path; bypasses all trust logic.
    Overridden,
    /// Verified and promoted by a previous update cycle.
    Trusted,
    /// Shipped with the agent install.
    Packaged,
}

impl ArtifactOrigin {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Overridden => "override",
            Self::Trusted => "current",
            Self::Packaged => "packaged",
        }
    }
}

/// A resolved artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedArtifact {
    pub path: PathBuf,
    pub origin: ArtifactOrigin,
}

// ── Fetching ──────────────────────────────────────────────────────────────────

/// Body and cache token of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub body: Vec<u8>,
    /// Value of the `Etag` header, if the server sent one.
    pub token: Option<String>,
}

/// Outcome of a conditional artifact download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactFetch {
    /// The server confirmed our cached copy (HTTP 304); no body transferred.
    NotModified,
    Fetched(Download),
}

// ── Update result ─────────────────────────────────────────────────────────────

/// Terminal outcome of one update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateResult {
    NoUpdateNeeded,
    UpdateSucceeded,
    FetchFailed,
    VerificationFailed,
}

impl UpdateResult {
    /// `true` when the agent ends the cycle on an artifact it may trust.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::NoUpdateNeeded | Self::UpdateSucceeded)
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoUpdateNeeded => "The artifact is already up to date.",
            Self::UpdateSucceeded => "The artifact has been updated to a newer version.",
            Self::FetchFailed => "The artifact or its signature could not be downloaded.",
            Self::VerificationFailed => "The artifact signature could not be verified.",
        }
    }
}

/// Whether the signature check runs before promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verification {
    #[default]
    Required,
    /// Promote without checking the signature. Removes the only integrity
    /// guarantee of the pipeline; never a default.
    Skip,
}

/// Caller-selected behaviour for one update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    /// Download even when the cache token says nothing changed.
    pub force: bool,
    pub verification: Verification,
}

/// Decide whether a freshly observed token means the remote copy is unchanged.
///
/// A missing token on either side never matches, so servers that do not
/// emit `Etag` are always re-downloaded.
#[must_use]
pub fn token_unchanged(stored: Option<&str>, observed: Option<&str>) -> bool {
    matches!((stored, observed), (Some(a), Some(b)) if a == b)
}

// ── Runtime expressions ───────────────────────────────────────────────────────

/// Expression printing the artifact's embedded version metadata.
///
/// `VERSION`, then `-RELEASE`, then `+COMMIT`, depending on the flags.
#[must_use]
pub fn version_expression(package: &str, include_release: bool, include_commit: bool) -> String {
    let mut expr = format!("{package}.package_info['VERSION']");
    if include_release {
        expr.push_str(&format!(" + '-' + {package}.package_info['RELEASE']"));
    }
    if include_commit {
        expr.push_str(&format!(" + '+' + {package}.package_info['COMMIT']"));
    }
    format!("import {package}; print({expr})")
}

/// Module that exposes the artifact's collectors.
#[must_use]
pub fn collector_module(package: &str) -> String {
    format!("{package}.anchor.v1")
}

/// App shipped with the artifact that checks a playbook's signature.
pub const PLAYBOOK_VERIFIER_APP: &str = "ansible.playbook_verifier";

/// Module that runs one of the artifact's client apps.
#[must_use]
pub fn app_module(package: &str, app: &str) -> String {
    format!("{package}.client.apps.{app}")
}

/// Compose the search-path value with the artifact first.
#[must_use]
pub fn search_path(artifact: &Path, existing: Option<&str>) -> String {
    match existing {
        Some(rest) if !rest.is_empty() => format!("{}:{rest}", artifact.display()),
        _ => artifact.display().to_string(),
    }
}
