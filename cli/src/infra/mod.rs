//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: HTTPS transport and the
//! service clients built on it, GnuPG verification, process execution,
//! filesystem access, configuration loading, and logging setup.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod distribution;
pub mod fs;
pub mod gpg;
pub mod ingress;
pub mod inventory;
pub mod logging;
pub mod router;
pub mod transport;
