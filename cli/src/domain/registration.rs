//! Host registration markers and the identity view shown to users.

use std::path::{Path, PathBuf};

use nest_common::Host;
use serde::Serialize;

pub const MACHINE_ID: &str = "machine-id";
pub const REGISTERED_MARKER: &str = ".registered";
pub const UNREGISTERED_MARKER: &str = ".unregistered";

/// Registration state files, all kept in the metadata directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPaths {
    pub machine_id: PathBuf,
    pub registered: PathBuf,
    pub unregistered: PathBuf,
}

impl RegistrationPaths {
    #[must_use]
    pub fn new(meta_dir: &Path) -> Self {
        Self {
            machine_id: meta_dir.join(MACHINE_ID),
            registered: meta_dir.join(REGISTERED_MARKER),
            unregistered: meta_dir.join(UNREGISTERED_MARKER),
        }
    }
}

/// Identity fields reported by `nest identity`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostIdentity {
    pub insights_id: Option<String>,
    pub insights_client_id: Option<String>,
    pub subscription_manager_id: Option<String>,
    pub fqdn: Option<String>,
    pub display_name: Option<String>,
    pub ansible_host: Option<String>,
}

impl From<&Host> for HostIdentity {
    fn from(host: &Host) -> Self {
        Self {
            insights_id: Some(host.id.clone()),
            insights_client_id: Some(host.insights_id.clone()),
            subscription_manager_id: host.subscription_manager_id.clone(),
            fqdn: host.fqdn.clone(),
            display_name: host.display_name.clone(),
            ansible_host: host.ansible_host.clone(),
        }
    }
}

/// Archive-producing collectors a registered host can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Advisor,
    Compliance,
}

impl ScanKind {
    /// Name of the artifact collector producing this archive.
    #[must_use]
    pub const fn collector(self) -> &'static str {
        match self {
            Self::Advisor => "advisor",
            Self::Compliance => "compliance",
        }
    }
}

/// Archive descriptor printed by the artifact's archive collectors.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ArchiveDescriptor {
    pub payload: PathBuf,
    pub content_type: String,
}
