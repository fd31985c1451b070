//! Command implementations

pub mod checkin;
pub mod identity;
pub mod register;
pub mod scan;
pub mod status;
pub mod unregister;
pub mod update;
pub mod verify_playbook;
pub mod version;

use std::path::PathBuf;

use clap::Args;

/// Arguments for the update command.
#[derive(Args)]
pub struct UpdateArgs {
    /// Download even if the cache token says nothing changed
    #[arg(long)]
    pub force: bool,

    /// Promote the artifact WITHOUT verifying its signature
    #[arg(long)]
    pub insecure: bool,
}

/// Arguments for the checkin command.
#[derive(Args)]
pub struct CheckinArgs {
    /// Set the host's display name in Inventory
    #[arg(long)]
    pub display_name: Option<String>,

    /// Set the host's Ansible hostname in Inventory
    #[arg(long)]
    pub ansible_host: Option<String>,
}

/// Arguments for the verify-playbook command.
#[derive(Args)]
pub struct VerifyPlaybookArgs {
    /// Signed playbook to check
    pub playbook: PathBuf,
}
