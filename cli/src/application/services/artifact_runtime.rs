//! Application service: run the artifact's embedded runtime out of process.
//!
//! Three entry points: the version query, the collectors that back
//! registration and check-in, and the client apps fed on stdin.

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::{ArtifactCollector, CommandRunner};
use crate::domain::artifact::{
    PLAYBOOK_VERIFIER_APP, app_module, collector_module, search_path, version_expression,
};
use crate::domain::config::RuntimeConfig;
use crate::domain::error::ArtifactError;

/// The interpreter bound to one located artifact.
pub struct ArtifactRuntime<'a, C> {
    runner: &'a C,
    config: &'a RuntimeConfig,
    search_path: String,
}

impl<'a, C: CommandRunner> ArtifactRuntime<'a, C> {
    /// `existing_search_path` is the caller's current value of the
    /// configured search-path variable, if any.
    pub fn new(
        runner: &'a C,
        config: &'a RuntimeConfig,
        artifact: &Path,
        existing_search_path: Option<&str>,
    ) -> Self {
        Self {
            runner,
            config,
            search_path: search_path(artifact, existing_search_path),
        }
    }

    /// Ask the artifact for its version, optionally with release and commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot run, times out, or exits
    /// non-zero.
    pub fn version(&self, include_release: bool, include_commit: bool) -> Result<String> {
        let expr = version_expression(&self.config.package, include_release, include_commit);
        let stdout = self.invoke(&["-c", &expr]).context("querying artifact version")?;
        Ok(stdout.trim().to_string())
    }

    /// Check a playbook's signature; returns the verified playbook.
    ///
    /// # Errors
    ///
    /// Returns `ArtifactError::PlaybookRejected` when the verifier exits
    /// non-zero, or an error if it cannot run at all.
    pub fn verify_playbook(&self, playbook: &[u8]) -> Result<String> {
        self.run_app(PLAYBOOK_VERIFIER_APP, playbook).map_err(|err| {
            match err.downcast_ref::<ArtifactError>() {
                Some(ArtifactError::RuntimeFailed { code }) => {
                    ArtifactError::PlaybookRejected { code: *code }.into()
                }
                _ => err,
            }
        })
    }

    /// Run a client app with `input` on stdin and return what it printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot run, times out, or exits
    /// non-zero.
    pub fn run_app(&self, app: &str, input: &[u8]) -> Result<String> {
        let module = app_module(&self.config.package, app);
        let args = [
            "-m",
            module.as_str(),
            "--quiet",
            "--payload",
            "noop",
            "--content-type",
            "noop",
        ];
        let env = [(self.config.path_variable.as_str(), self.search_path.as_str())];
        let output = self.runner.run_with_input(
            &self.config.interpreter,
            &args,
            &env,
            self.config.timeout(),
            input,
        )?;
        checked_stdout(&output).with_context(|| format!("running {app}"))
    }

    fn invoke(&self, args: &[&str]) -> Result<String> {
        let env = [(self.config.path_variable.as_str(), self.search_path.as_str())];
        let output = self.runner.run_with_timeout(
            &self.config.interpreter,
            args,
            &env,
            self.config.timeout(),
        )?;
        checked_stdout(&output)
    }
}

fn checked_stdout(output: &Output) -> Result<String> {
    if !output.status.success() {
        debug!(
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "artifact runtime failed"
        );
        return Err(ArtifactError::RuntimeFailed {
            code: output.status.code().unwrap_or(-1),
        }
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl<C: CommandRunner> ArtifactCollector for ArtifactRuntime<'_, C> {
    fn collect(&self, collector: &str) -> Result<serde_json::Value> {
        let module = collector_module(&self.config.package);
        let stdout = self
            .invoke(&["-m", &module, collector])
            .with_context(|| format!("running collector {collector}"))?;
        serde_json::from_str(stdout.trim()).map_err(|e| {
            ArtifactError::CollectorOutput {
                collector: collector.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}
