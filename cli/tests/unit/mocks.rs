//! Shared fakes for the service tests.
//!
//! Remote ports are scripted in memory; the filesystem is the real `StdFs`
//! over a temp dir so assertions can look at actual bytes on disk.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::{Cell, RefCell};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;
use nest_cli::application::ports::{
    ArtifactCollector, ArtifactDownloader, ChannelRouter, CommandRunner, HostInventory, LocalFs,
    ProgressReporter, SignatureVerifier, UploadIngress,
};
use nest_cli::domain::artifact::{ArtifactFetch, ArtifactPaths, Download};
use nest_cli::domain::error::{ApiError, ProtocolError, TransportError};
use nest_cli::infra::fs::StdFs;
use nest_common::{Host, HostPatch, Route, Upload, UploadResponse};
use tempfile::TempDir;

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(code << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

fn unexpected<T>() -> Result<T> {
    anyhow::bail!("not expected in this test")
}

fn connection_refused() -> ApiError {
    ApiError::Transport(TransportError::Request {
        url: "https://cert.api.test/api/v1/static/release/nest-core.bin".to_string(),
        kind: "Connection Failed".to_string(),
        reason: "connection refused".to_string(),
    })
}

// ── Workspace ─────────────────────────────────────────────────────────────────

/// Artifact and metadata directories under one temp dir.
pub struct Workspace {
    pub dir: TempDir,
    pub paths: ArtifactPaths,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let paths = ArtifactPaths::new(&dir.path().join("lib"), &dir.path().join("etc"));
        Self { dir, paths }
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.dir.path().join("lib")
    }

    pub fn meta_dir(&self) -> PathBuf {
        self.dir.path().join("etc")
    }

    pub fn put(&self, path: &Path, content: &[u8]) {
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, content).expect("write");
    }

    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        std::fs::read(path).ok()
    }

    pub fn token(&self) -> Option<String> {
        std::fs::read_to_string(&self.paths.artifact_token).ok()
    }

    /// Every file under the workspace with its modification time.
    pub fn snapshot(&self) -> Vec<(PathBuf, Vec<u8>, std::time::SystemTime)> {
        let mut out = Vec::new();
        for dir in [self.artifact_dir(), self.meta_dir()] {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let meta = entry.metadata().expect("metadata");
                let bytes = std::fs::read(&path).expect("read");
                out.push((path, bytes, meta.modified().expect("mtime")));
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub struct FakeRouter {
    pub reachable: bool,
    pub calls: Cell<u32>,
}

impl FakeRouter {
    pub fn release() -> Self {
        Self {
            reachable: true,
            calls: Cell::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            calls: Cell::new(0),
        }
    }
}

impl ChannelRouter for FakeRouter {
    fn resolve_route(&self, _module: &str) -> Result<Route, ApiError> {
        self.calls.set(self.calls.get() + 1);
        if self.reachable {
            Ok(Route {
                url: "/release".to_string(),
            })
        } else {
            Err(connection_refused())
        }
    }
}

// ── Distribution ──────────────────────────────────────────────────────────────

/// How the fake distribution service answers one request.
#[derive(Clone)]
pub enum Reply {
    Body(Vec<u8>, Option<String>),
    NotModified,
    Status(u16),
    Unreachable,
}

impl Reply {
    pub fn body(bytes: &[u8], etag: Option<&str>) -> Self {
        Self::Body(bytes.to_vec(), etag.map(str::to_string))
    }
}

/// Serves the same artifact until told otherwise. Honours `If-None-Match`.
pub struct FakeDistribution {
    pub artifact: RefCell<Reply>,
    pub signature: RefCell<Reply>,
    pub artifact_tokens_seen: RefCell<Vec<Option<String>>>,
    pub signature_requests: Cell<u32>,
    pub artifact_bytes_sent: Cell<usize>,
}

impl FakeDistribution {
    pub fn new(artifact: Reply, signature: Reply) -> Self {
        Self {
            artifact: RefCell::new(artifact),
            signature: RefCell::new(signature),
            artifact_tokens_seen: RefCell::new(Vec::new()),
            signature_requests: Cell::new(0),
            artifact_bytes_sent: Cell::new(0),
        }
    }

    pub fn serving(artifact: &[u8], etag: &str, signature: &[u8]) -> Self {
        Self::new(Reply::body(artifact, Some(etag)), Reply::body(signature, None))
    }

    pub fn artifact_requests(&self) -> usize {
        self.artifact_tokens_seen.borrow().len()
    }
}

fn answer(reply: &Reply, endpoint: &str) -> Result<Download, ApiError> {
    match reply {
        Reply::Body(body, token) => Ok(Download {
            body: body.clone(),
            token: token.clone(),
        }),
        Reply::Status(status) => Err(ApiError::Protocol(ProtocolError::UnexpectedStatus {
            status: *status,
            endpoint: endpoint.to_string(),
        })),
        Reply::NotModified | Reply::Unreachable => Err(connection_refused()),
    }
}

impl ArtifactDownloader for FakeDistribution {
    fn fetch_artifact(&self, route: &Route, token: Option<&str>) -> Result<ArtifactFetch, ApiError> {
        self.artifact_tokens_seen
            .borrow_mut()
            .push(token.map(str::to_string));
        let reply = self.artifact.borrow().clone();
        let endpoint = format!("/static{}/nest-core.bin", route.url);
        match reply {
            Reply::NotModified => Ok(ArtifactFetch::NotModified),
            Reply::Body(_, Some(ref etag)) if token == Some(etag.as_str()) => {
                Ok(ArtifactFetch::NotModified)
            }
            other => {
                let download = answer(&other, &endpoint)?;
                self.artifact_bytes_sent
                    .set(self.artifact_bytes_sent.get() + download.body.len());
                Ok(ArtifactFetch::Fetched(download))
            }
        }
    }

    fn fetch_signature(&self, route: &Route) -> Result<Download, ApiError> {
        self.signature_requests.set(self.signature_requests.get() + 1);
        answer(
            &self.signature.borrow(),
            &format!("/static{}/nest-core.bin.sig", route.url),
        )
    }
}

/// Ignores `If-None-Match` and always sends the body with its etag.
pub struct IgnoresConditional(pub FakeDistribution);

impl ArtifactDownloader for IgnoresConditional {
    fn fetch_artifact(&self, route: &Route, token: Option<&str>) -> Result<ArtifactFetch, ApiError> {
        self.0.fetch_artifact(route, None).map(|fetch| {
            self.0.artifact_tokens_seen.borrow_mut().pop();
            self.0
                .artifact_tokens_seen
                .borrow_mut()
                .push(token.map(str::to_string));
            fetch
        })
    }

    fn fetch_signature(&self, route: &Route) -> Result<Download, ApiError> {
        self.0.fetch_signature(route)
    }
}

// ── Verifier ──────────────────────────────────────────────────────────────────

/// Accepts a signature iff it equals `valid_signature`; records what it saw.
pub struct FakeVerifier {
    pub valid_signature: Vec<u8>,
    pub seen: RefCell<Vec<(PathBuf, PathBuf)>>,
    pub artifact_at_verify: RefCell<Option<Vec<u8>>>,
}

impl FakeVerifier {
    pub fn accepting(signature: &[u8]) -> Self {
        Self {
            valid_signature: signature.to_vec(),
            seen: RefCell::new(Vec::new()),
            artifact_at_verify: RefCell::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl SignatureVerifier for FakeVerifier {
    fn verify(&self, artifact: &Path, signature: &Path) -> bool {
        self.seen
            .borrow_mut()
            .push((artifact.to_path_buf(), signature.to_path_buf()));
        *self.artifact_at_verify.borrow_mut() = std::fs::read(artifact).ok();
        std::fs::read(signature).is_ok_and(|sig| sig == self.valid_signature)
    }
}

// ── Filesystem ────────────────────────────────────────────────────────────────

/// `StdFs` whose renames fail, either always or on one numbered call.
pub struct RenameFails {
    failing_call: Option<usize>,
    calls: Cell<usize>,
}

impl RenameFails {
    pub fn always() -> Self {
        Self {
            failing_call: None,
            calls: Cell::new(0),
        }
    }

    /// Only rename number `n` (1-based) fails.
    pub fn on_call(n: usize) -> Self {
        Self {
            failing_call: Some(n),
            calls: Cell::new(0),
        }
    }
}

impl LocalFs for RenameFails {
    fn exists(&self, path: &Path) -> bool {
        StdFs.exists(path)
    }
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        StdFs.create_dir_all(path)
    }
    fn read_to_string(&self, path: &Path) -> Result<String> {
        StdFs.read_to_string(path)
    }
    fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        StdFs.write(path, content)
    }
    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if self.failing_call.is_none_or(|n| n == call) {
            anyhow::bail!("read-only file system");
        }
        StdFs.rename(from, to)
    }
    fn remove_file(&self, path: &Path) -> Result<bool> {
        StdFs.remove_file(path)
    }
    fn clear_dir(&self, path: &Path) -> Result<()> {
        StdFs.clear_dir(path)
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.events.borrow_mut().push(format!("success: {message}"));
    }
    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(format!("warn: {message}"));
    }
}

// ── Command runner ────────────────────────────────────────────────────────────

pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub input: Option<Vec<u8>>,
}

/// Returns canned outputs in order and records every invocation.
pub struct ScriptedRunner {
    pub outputs: RefCell<Vec<Output>>,
    pub invocations: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new(outputs: Vec<Output>) -> Self {
        Self {
            outputs: RefCell::new(outputs),
            invocations: RefCell::new(Vec::new()),
        }
    }

    fn record(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Option<Duration>,
        input: Option<&[u8]>,
    ) -> Result<Output> {
        self.invocations.borrow_mut().push(Invocation {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            env: env
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            timeout,
            input: input.map(<[u8]>::to_vec),
        });
        let mut outputs = self.outputs.borrow_mut();
        if outputs.is_empty() {
            return unexpected();
        }
        Ok(outputs.remove(0))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
        self.record(program, args, env, None, None)
    }

    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Output> {
        self.record(program, args, env, Some(timeout), None)
    }

    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        timeout: Duration,
        input: &[u8],
    ) -> Result<Output> {
        self.record(program, args, env, Some(timeout), Some(input))
    }
}

// ── Registration collaborators ────────────────────────────────────────────────

pub fn host(id: &str, insights_id: &str) -> Host {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "insights_id": insights_id,
        "fqdn": "web01.example.test",
        "subscription_manager_id": "5c3d8a2e-0000-4000-8000-000000000001",
    }))
    .expect("host fixture")
}

#[derive(Default)]
pub struct FakeInventory {
    pub host: RefCell<Option<Host>>,
    pub reachable: bool,
    pub lookups: RefCell<Vec<String>>,
    pub deleted: RefCell<Vec<String>>,
    pub patched: RefCell<Vec<(String, HostPatch)>>,
    pub checked_in: RefCell<Vec<serde_json::Value>>,
}

impl FakeInventory {
    pub fn empty() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    pub fn knowing(host: Host) -> Self {
        Self {
            host: RefCell::new(Some(host)),
            reachable: true,
            ..Self::default()
        }
    }
}

impl HostInventory for FakeInventory {
    fn get_host(&self, machine_id: &str) -> Result<Option<Host>> {
        if !self.reachable {
            anyhow::bail!("connection refused");
        }
        self.lookups.borrow_mut().push(machine_id.to_string());
        Ok(self
            .host
            .borrow()
            .clone()
            .filter(|h| h.insights_id == machine_id))
    }

    fn update_host(&self, id: &str, patch: &HostPatch) -> Result<()> {
        self.patched
            .borrow_mut()
            .push((id.to_string(), patch.clone()));
        Ok(())
    }

    fn delete_host(&self, id: &str) -> Result<()> {
        self.deleted.borrow_mut().push(id.to_string());
        *self.host.borrow_mut() = None;
        Ok(())
    }

    fn checkin(&self, facts: &serde_json::Value) -> Result<Host> {
        self.checked_in.borrow_mut().push(facts.clone());
        let id = facts["insights_id"].as_str().unwrap_or_default();
        Ok(host("0f9a2d54-1111-4111-8111-000000000002", id))
    }
}

#[derive(Default)]
pub struct FakeIngress {
    pub uploads: RefCell<Vec<(PathBuf, String, serde_json::Value)>>,
    pub reject: bool,
}

impl UploadIngress for FakeIngress {
    fn upload(
        &self,
        archive: &Path,
        content_type: &str,
        facts: &serde_json::Value,
    ) -> Result<UploadResponse> {
        if self.reject {
            anyhow::bail!("unexpected status 413 from /upload");
        }
        self.uploads.borrow_mut().push((
            archive.to_path_buf(),
            content_type.to_string(),
            facts.clone(),
        ));
        Ok(UploadResponse {
            request_id: "req-1".to_string(),
            upload: Upload {
                account: Some("0000001".to_string()),
                org_id: Some("1234567".to_string()),
            },
        })
    }
}

/// Facts plus an advisor or compliance archive written to `archive` on demand.
pub struct FakeCollector {
    pub archive: PathBuf,
    pub collected: RefCell<Vec<String>>,
}

impl FakeCollector {
    pub fn new(archive: PathBuf) -> Self {
        Self {
            archive,
            collected: RefCell::new(Vec::new()),
        }
    }
}

impl ArtifactCollector for FakeCollector {
    fn collect(&self, collector: &str) -> Result<serde_json::Value> {
        self.collected.borrow_mut().push(collector.to_string());
        match collector {
            "canonical-facts" => Ok(serde_json::json!({
                "fqdn": "web01.example.test",
                "mac_addresses": ["52:54:00:12:34:56"],
            })),
            "advisor" | "compliance" => {
                std::fs::write(&self.archive, b"archive").expect("archive");
                Ok(serde_json::json!({
                    "payload": self.archive,
                    "content_type": format!("application/vnd.redhat.{collector}.collection+tgz"),
                }))
            }
            _ => unexpected(),
        }
    }
}
