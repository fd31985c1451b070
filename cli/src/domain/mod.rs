//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod artifact;
pub mod config;
pub mod digest;
pub mod error;
pub mod registration;

pub use artifact::{
    ArtifactFetch, ArtifactOrigin, ArtifactPaths, Download, LocatedArtifact, UpdateOptions,
    UpdateResult, Verification,
};
pub use config::{NestConfig, validate_config};
pub use error::{
    ApiError, ArtifactError, ConfigError, ProtocolError, RegistrationError, TransportError,
    TrustError,
};
pub use registration::{HostIdentity, RegistrationPaths};
