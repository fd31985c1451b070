use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distribution channel returned by the module update router.
///
/// `url` is a path prefix such as `/release` or `/testing`, appended to
/// `/static` when downloading the artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    pub url: String,
}

impl Route {
    /// Route used when the configuration requests canary builds.
    #[must_use]
    pub fn canary() -> Self {
        Self {
            url: "/testing".to_string(),
        }
    }
}

/// A host record as returned by the Inventory service.
///
/// Only `id` and `insights_id` are guaranteed; every other field may be
/// absent or `null` depending on the reporter that created the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Host {
    /// Inventory UUID.
    pub id: String,
    /// Client UUID (the local `machine-id`).
    pub insights_id: String,
    #[serde(default)]
    pub subscription_manager_id: Option<String>,
    #[serde(default)]
    pub satellite_id: Option<String>,
    #[serde(default)]
    pub bios_uuid: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<String>,
    #[serde(default)]
    pub mac_addresses: Vec<String>,
    #[serde(default)]
    pub fqdn: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub ansible_host: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    #[serde(default)]
    pub stale_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stale_warning_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub culled_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub groups: Vec<serde_json::Value>,
    #[serde(default)]
    pub tags: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub system_profile: Option<serde_json::Value>,
}

/// One page of `GET /hosts` results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hosts {
    pub total: u64,
    pub count: u64,
    pub page: u64,
    pub per_page: u64,
    #[serde(default)]
    pub results: Vec<Host>,
}

/// Partial update body for `PATCH /hosts/{id}`.
///
/// `None` fields are omitted from the request. An empty `ansible_host`
/// resets the secondary name on the server side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ansible_host: Option<String>,
}

impl HostPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.ansible_host.is_none()
    }
}

/// Tenant information echoed by Ingress after an upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Upload {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
}

/// Response of `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    pub request_id: String,
    pub upload: Upload,
}
