//! Application context: unified state passed to every command handler.
//!
//! `AppContext` owns the loaded configuration and the production adapters,
//! and builds the remote clients on demand. Command handlers never construct
//! infrastructure themselves.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::services::artifact_locator::locate_artifact;
use crate::application::services::artifact_runtime::ArtifactRuntime;
use crate::application::services::artifact_update::{UpdatePorts, update_artifact};
use crate::domain::artifact::{
    ArtifactPaths, LocatedArtifact, OVERRIDE_VARIABLE, UpdateOptions, UpdateResult,
};
use crate::domain::config::NestConfig;
use crate::domain::registration::RegistrationPaths;
use crate::infra::command_runner::StdCommandRunner;
use crate::infra::distribution::DistributionClient;
use crate::infra::fs::StdFs;
use crate::infra::gpg::GpgVerifier;
use crate::infra::ingress::IngressClient;
use crate::infra::inventory::InventoryClient;
use crate::infra::logging;
use crate::infra::router::RouterClient;
use crate::infra::transport::{
    DISTRIBUTION_PREFIX, INGRESS_PREFIX, INVENTORY_PREFIX, LazyTransport, ROUTER_PREFIX,
};
use crate::output::{OutputContext, TerminalReporter, json};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip the update cycle that precedes artifact-backed commands.
    pub no_update: bool,
    /// Make that cycle ignore the cache token.
    pub force_update: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context. Quiet in JSON mode so stdout stays parseable.
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Configuration loaded once at start-up.
    pub config: NestConfig,
    /// Process runner for gpg and the artifact runtime.
    pub runner: StdCommandRunner,
    /// Local filesystem.
    pub fs: StdFs,
    pub no_update: bool,
    pub force_update: bool,
}

impl AppContext {
    #[must_use]
    pub fn new(flags: &AppFlags, config: NestConfig) -> Self {
        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        Self {
            output: OutputContext::new(
                flags.output.no_color,
                flags.output.quiet || flags.output.json,
            ),
            mode,
            config,
            runner: StdCommandRunner::default(),
            fs: StdFs,
            no_update: flags.behaviour.no_update,
            force_update: flags.behaviour.force_update,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Print the successful outcome of a command.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn emit_success(&self, message: &str) -> Result<()> {
        if self.is_json() {
            println!("{}", json::format_message(message, true)?);
        } else {
            self.output.success(message);
        }
        Ok(())
    }

    #[must_use]
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::from_config(&self.config.artifact)
    }

    #[must_use]
    pub fn registration_paths(&self) -> RegistrationPaths {
        RegistrationPaths::new(&self.config.artifact.metadata_directory)
    }

    // ── Remote clients ────────────────────────────────────────────────────────
    //
    // Transports load TLS material on their first request.

    fn transport(&self, prefix: &'static str) -> LazyTransport<'_> {
        LazyTransport::new(&self.config, prefix).with_response_echo(logging::http_echo_enabled())
    }

    #[must_use]
    pub fn inventory(&self) -> InventoryClient<LazyTransport<'_>> {
        InventoryClient::new(self.transport(INVENTORY_PREFIX))
    }

    #[must_use]
    pub fn ingress(&self) -> IngressClient<LazyTransport<'_>> {
        IngressClient::new(self.transport(INGRESS_PREFIX))
    }

    // ── Artifact ──────────────────────────────────────────────────────────────

    /// Run one update cycle with a spinner. Never fails.
    pub fn run_update(&self, options: UpdateOptions) -> UpdateResult {
        let router = RouterClient::new(self.transport(ROUTER_PREFIX), self.config.artifact.canary);
        let downloader = DistributionClient::new(
            self.transport(DISTRIBUTION_PREFIX),
            self.config.artifact.remote_name.clone(),
        );
        let verifier = GpgVerifier::new(
            self.runner,
            self.config.artifact.public_key.clone(),
            self.config.artifact.trust_store_parent(),
        );
        let ports = UpdatePorts {
            router: &router,
            downloader: &downloader,
            verifier: &verifier,
            fs: &self.fs,
        };
        let reporter = TerminalReporter::with_spinner(&self.output, "updating artifact...");
        let result = update_artifact(
            &ports,
            &reporter,
            &self.config.artifact.module,
            &self.artifact_paths(),
            options,
        );
        reporter.clear();
        result
    }

    /// Refresh the artifact before a command that runs it.
    ///
    /// Skipped with `--no-update`. A failed cycle is only reported: the
    /// locator falls back to the previous trusted or packaged copy.
    pub fn refresh_artifact(&self) {
        if self.no_update {
            return;
        }
        let result = self.run_update(UpdateOptions {
            force: self.force_update,
            ..UpdateOptions::default()
        });
        if !result.is_ok() {
            self.output.warn(result.message());
        }
    }

    /// Resolve the artifact to run, honouring the override variable.
    ///
    /// # Errors
    ///
    /// Returns an `ArtifactError` if the override is missing or nothing exists.
    pub fn locate(&self) -> Result<LocatedArtifact> {
        let override_path = std::env::var_os(OVERRIDE_VARIABLE)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Ok(locate_artifact(&self.fs, override_path, &self.artifact_paths())?)
    }

    /// Interpreter bound to `artifact`, extending the caller's search path.
    #[must_use]
    pub fn runtime(&self, artifact: &LocatedArtifact) -> ArtifactRuntime<'_, StdCommandRunner> {
        let existing = std::env::var(&self.config.runtime.path_variable).ok();
        ArtifactRuntime::new(
            &self.runner,
            &self.config.runtime,
            &artifact.path,
            existing.as_deref(),
        )
    }
}
