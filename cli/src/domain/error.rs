//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Transport errors ──────────────────────────────────────────────────────────

/// Failures below HTTP: TLS material, DNS, connect, handshake, body read.
///
/// Never retried. The update orchestrator maps every variant to `FetchFailed`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot load TLS material from {path}: {reason}")]
    TlsMaterial { path: String, reason: String },

    #[error("cannot build TLS client configuration: {0}")]
    TlsConfig(String),

    #[error("invalid proxy '{proxy}': {reason}")]
    Proxy { proxy: String, reason: String },

    #[error("request to {url} failed ({kind}): {reason}")]
    Request {
        url: String,
        kind: String,
        reason: String,
    },

    #[error("cannot read response body from {url}: {reason}")]
    Body { url: String, reason: String },
}

// ── Protocol errors ───────────────────────────────────────────────────────────

/// The server answered, but not with something we can use.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error("cannot decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

/// Error returned by every remote API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

// ── Trust errors ──────────────────────────────────────────────────────────────

/// Reasons a signature was not accepted.
///
/// Callers only ever see a boolean verdict; the variant is logged.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("cannot create ephemeral trust store under {parent}: {reason}")]
    TrustStore { parent: String, reason: String },

    #[error("cannot run {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("public key {key} could not be imported (exit {code})")]
    KeyImport { key: String, code: i32 },

    #[error("signature {signature} was rejected (exit {code})")]
    SignatureRejected { signature: String, code: i32 },
}

// ── Artifact errors ───────────────────────────────────────────────────────────

/// Errors related to locating and invoking the artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{variable}={path} was specified, but the file does not exist.")]
    OverrideMissing { variable: String, path: String },

    #[error("No artifact found.")]
    NotFound,

    #[error("The artifact runtime exited with code {code}.")]
    RuntimeFailed { code: i32 },

    #[error("The artifact collector '{collector}' produced invalid output: {reason}")]
    CollectorOutput { collector: String, reason: String },

    #[error("Playbook verification failed.")]
    PlaybookRejected { code: i32 },
}

// ── Registration errors ───────────────────────────────────────────────────────

/// Errors related to host registration state.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("This host is already registered.")]
    AlreadyRegistered,

    #[error("This host is not registered.")]
    NotRegistered,

    #[error("This host is already unregistered.")]
    AlreadyUnregistered,

    #[error("Facts were rejected by the server with status code {status}.")]
    CheckinRejected { status: u16 },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
