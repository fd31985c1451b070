//! Integration tests for the nest CLI
//!
//! These tests spawn the actual binary against a throwaway configuration
//! and test end-to-end behavior.

#![allow(clippy::expect_used)]

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;


/// A host layout under one temp dir: `lib/` for artifacts, `etc/` for
/// metadata, `pki/` for the (absent) identity, and `nest.yaml` pointing at
/// all of them.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let sandbox = Self {
            dir: TempDir::new().expect("tempdir"),
        };
        sandbox.write_config("");
        sandbox
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn put(&self, rel: &str, content: &[u8]) {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, content).expect("write");
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        std::fs::read(self.path(rel)).expect("read")
    }

    /// Base config plus `extra` YAML appended at top level.
    pub fn write_config(&self, extra: &str) {
        let root = self.dir.path().display();
        let base = format!(
            "api:\n  host: 127.0.0.1\n  port: 9\n\
             network:\n  identity_directory: {root}/pki\n  ca_certificates: {root}/pki/ca.pem\n  timeout_secs: 2\n\
             artifact:\n  artifact_directory: {root}/lib\n  metadata_directory: {root}/etc\n  public_key: {root}/etc/nest.pub.gpg\n\
             runtime:\n  interpreter: {root}/bin/interpreter\n"
        );
        let mut doc: serde_yaml::Value = serde_yaml::from_str(&base).expect("base config");
        if !extra.is_empty() {
            let overlay: serde_yaml::Value = serde_yaml::from_str(extra).expect("extra config");
            merge(&mut doc, overlay);
        }
        self.put(
            "nest.yaml",
            serde_yaml::to_string(&doc).expect("yaml").as_bytes(),
        );
    }

    pub fn write_drop_in(&self, name: &str, content: &str) {
        self.put(&format!("nest.yaml.d/{name}"), content.as_bytes());
    }

    /// Install a shell script as the artifact runtime interpreter.
    pub fn fake_interpreter(&self, body: &str) {
        let path = self.path("bin/interpreter");
        self.put("bin/interpreter", format!("#!/bin/sh\n{body}\n").as_bytes());
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    pub fn nest(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("nest"));
        cmd.env("NO_COLOR", "1")
            .env("NEST_CONFIG", self.path("nest.yaml"))
            .env_remove("NEST_ARTIFACT")
            .env_remove("RUST_LOG")
            .env_remove("NEST_DEBUG_STDERR")
            .env_remove("NEST_DEBUG_HTTP")
            .env_remove("PYTHONPATH");
        cmd
    }
}

fn merge(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
