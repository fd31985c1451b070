//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and `nest_common`, never from
//! `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use nest_common::{Host, HostPatch, Route, UploadResponse};
use serde::de::DeserializeOwned;

use crate::domain::{ApiError, ArtifactFetch, Download, ProtocolError, TransportError};

// ── Value Types ───────────────────────────────────────────────────────────────

/// HTTP verbs used by the service clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// One request relative to a transport's path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path below the transport prefix, e.g. `/hosts/checkin`.
    pub endpoint: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    #[must_use]
    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a request header, ignoring case.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status, headers and raw body of any response, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Look up a response header, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.header("content-type").is_some_and(|v| {
            v.split(';')
                .next()
                .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        })
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Decode` if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ProtocolError> {
        serde_json::from_slice(&self.body).map_err(|e| ProtocolError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fail with `ProtocolError::UnexpectedStatus` unless the status is 2xx.
    ///
    /// # Errors
    ///
    /// Returns an error for any non-2xx status.
    pub fn require_success(&self, endpoint: &str) -> Result<&Self, ProtocolError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProtocolError::UnexpectedStatus {
                status: self.status,
                endpoint: endpoint.to_string(),
            })
        }
    }
}

// ── Transport Port ────────────────────────────────────────────────────────────

/// Mutual-TLS HTTP transport bound to one (host, port, path-prefix).
///
/// Every response is returned regardless of status; only failures below
/// HTTP are errors. No retries.
pub trait HttpTransport {
    /// Send one request and read the whole response.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` on TLS, DNS, connect or read failure.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

// ── Artifact Pipeline Ports ───────────────────────────────────────────────────

/// Resolves which distribution channel a module is served from.
pub trait ChannelRouter {
    /// # Errors
    ///
    /// Returns an `ApiError` if the router is unreachable or answers badly.
    fn resolve_route(&self, module: &str) -> Result<Route, ApiError>;
}

/// Downloads the artifact and its detached signature from a route.
pub trait ArtifactDownloader {
    /// Fetch the artifact, sending `token` as `If-None-Match` when given.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` on transport failure or any status other than
    /// 2xx and 304.
    fn fetch_artifact(&self, route: &Route, token: Option<&str>) -> Result<ArtifactFetch, ApiError>;

    /// Fetch the detached signature, always unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` on transport failure or a non-2xx status.
    fn fetch_signature(&self, route: &Route) -> Result<Download, ApiError>;
}

/// Checks a detached signature against the pinned key.
///
/// Any failure, including infrastructure failure, is a `false` verdict.
pub trait SignatureVerifier {
    fn verify(&self, artifact: &Path, signature: &Path) -> bool;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
pub trait CommandRunner {
    /// Run a program with extra environment variables and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    fn run(&self, program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Output>;

    /// Like `run_with_timeout`, with `input` written to the child's stdin.
    ///
    /// # Errors
    ///
    /// Same as `run_with_timeout`.
    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
        input: &[u8],
    ) -> Result<Output>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Local filesystem operations used by the update pipeline and registration.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, content: &[u8]) -> Result<()>;
    /// Atomically replace `to` with `from`. Both must be on one filesystem.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    /// Remove a file; returns `false` if it did not exist.
    fn remove_file(&self, path: &Path) -> Result<bool>;
    /// Remove everything inside `path`, keeping the directory itself.
    fn clear_dir(&self, path: &Path) -> Result<()>;
}

// ── Artifact Runtime Port ─────────────────────────────────────────────────────

/// Runs one of the artifact's collectors and returns its JSON document.
pub trait ArtifactCollector {
    /// # Errors
    ///
    /// Returns an error if the collector fails or prints invalid JSON.
    fn collect(&self, collector: &str) -> Result<serde_json::Value>;
}

// ── Remote Service Ports ──────────────────────────────────────────────────────

/// Host records in the Inventory service.
pub trait HostInventory {
    /// First host whose client UUID is `machine_id`, if any.
    fn get_host(&self, machine_id: &str) -> Result<Option<Host>>;
    fn update_host(&self, id: &str, patch: &HostPatch) -> Result<()>;
    fn delete_host(&self, id: &str) -> Result<()>;
    /// Upload canonical facts; anything but `201 Created` is a rejection.
    fn checkin(&self, facts: &serde_json::Value) -> Result<Host>;
}

/// Archive upload endpoint.
pub trait UploadIngress {
    fn upload(
        &self,
        archive: &Path,
        content_type: &str,
        facts: &serde_json::Value,
    ) -> Result<UploadResponse>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
