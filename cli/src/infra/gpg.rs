//! Detached-signature verification with GnuPG in a single-use keyring.
//!
//! Every call gets its own private home directory holding only the pinned
//! key. The directory and any agent bound to it are gone before `verify`
//! returns.

use std::path::{Path, PathBuf};
use std::process::Output;

use tracing::{debug, info, warn};

use crate::application::ports::{CommandRunner, SignatureVerifier};
use crate::domain::error::TrustError;

pub const GPG: &str = "/usr/bin/gpg";
pub const GPGCONF: &str = "/usr/bin/gpgconf";

const STORE_PREFIX: &str = ".gnupg-";

/// `SignatureVerifier` backed by the `gpg` binary.
pub struct GpgVerifier<R> {
    runner: R,
    public_key: PathBuf,
    store_parent: PathBuf,
}

impl<R: CommandRunner> GpgVerifier<R> {
    pub fn new(runner: R, public_key: PathBuf, store_parent: PathBuf) -> Self {
        Self {
            runner,
            public_key,
            store_parent,
        }
    }

    fn check(&self, artifact: &Path, signature: &Path) -> Result<(), TrustError> {
        let store = TrustStore::create(&self.store_parent)?;
        let result = self
            .import_key(store.path())
            .and_then(|()| self.verify_detached(store.path(), artifact, signature));
        store.teardown(&self.runner);
        result
    }

    fn import_key(&self, home: &Path) -> Result<(), TrustError> {
        let key = self.public_key.to_string_lossy();
        let output = self.gpg(home, &["--import", &key])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(TrustError::KeyImport {
                key: key.into_owned(),
                code: output.status.code().unwrap_or(-1),
            })
        }
    }

    fn verify_detached(&self, home: &Path, artifact: &Path, signature: &Path) -> Result<(), TrustError> {
        let sig = signature.to_string_lossy();
        let file = artifact.to_string_lossy();
        let output = self.gpg(home, &["--verify", &sig, &file])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(TrustError::SignatureRejected {
                signature: sig.into_owned(),
                code: output.status.code().unwrap_or(-1),
            })
        }
    }

    fn gpg(&self, home: &Path, args: &[&str]) -> Result<Output, TrustError> {
        let home = home.to_string_lossy();
        let mut full = vec!["--homedir", &*home, "--batch", "--no-tty"];
        full.extend_from_slice(args);
        let output = self
            .runner
            .run(GPG, &full, &[])
            .map_err(|e| TrustError::Spawn {
                program: GPG.to_string(),
                reason: format!("{e:#}"),
            })?;
        log_streams(&output);
        Ok(output)
    }
}

impl<R: CommandRunner> SignatureVerifier for GpgVerifier<R> {
    fn verify(&self, artifact: &Path, signature: &Path) -> bool {
        match self.check(artifact, signature) {
            Ok(()) => {
                info!(artifact = %artifact.display(), "signature verified");
                true
            }
            Err(err) => {
                warn!(artifact = %artifact.display(), error = %err, "signature verification failed");
                false
            }
        }
    }
}

fn log_streams(output: &Output) {
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!("stdout> {line}");
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        debug!("stderr> {line}");
    }
}

// ── Trust store ───────────────────────────────────────────────────────────────

/// Private keyring directory. Dropping it removes the directory.
struct TrustStore {
    dir: tempfile::TempDir,
}

impl TrustStore {
    fn create(parent: &Path) -> Result<Self, TrustError> {
        let failed = |e: std::io::Error| TrustError::TrustStore {
            parent: parent.display().to_string(),
            reason: e.to_string(),
        };
        let dir = tempfile::Builder::new()
            .prefix(STORE_PREFIX)
            .tempdir_in(parent)
            .map_err(failed)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o700))
                .map_err(failed)?;
        }
        debug!(home = %dir.path().display(), "trust store created");
        Ok(Self { dir })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Stop any agent bound to the store, then delete it. Failures are logged.
    fn teardown(self, runner: &impl CommandRunner) {
        let home = self.path().to_string_lossy().into_owned();
        match runner.run(GPGCONF, &["--homedir", &home, "--kill", "all"], &[]) {
            Ok(output) if output.status.success() => {}
            Ok(output) => warn!(
                home = %home,
                code = output.status.code().unwrap_or(-1),
                "gpgconf could not stop the agent"
            ),
            Err(err) => warn!(home = %home, error = %format!("{err:#}"), "cannot run gpgconf"),
        }
        if let Err(err) = self.dir.close() {
            warn!(home = %home, error = %err, "cannot remove trust store");
        }
    }
}
