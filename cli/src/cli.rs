//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, BehaviourFlags, OutputFlags};
use crate::commands;
use crate::domain::registration::ScanKind;
use crate::infra::{config::YamlConfigLoader, logging};

/// Host agent that keeps a signed collection artifact up to date
#[derive(Parser)]
#[command(
    name = "nest",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Skip the artifact update that precedes checkin, register and scans
    #[arg(long, global = true, hide = true)]
    pub no_update: bool,

    /// Ignore the cache token in every update cycle
    #[arg(long, global = true, hide = true)]
    pub force_update: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch, verify and promote the latest artifact
    Update(commands::UpdateArgs),

    /// Show client and artifact versions
    Version,

    /// Show whether this host is registered
    Status,

    /// Show the identifiers Inventory holds for this host
    Identity,

    /// Send fresh facts to Inventory
    Checkin(commands::CheckinArgs),

    /// Register this host
    Register,

    /// Unregister this host and drop downloaded artifacts
    Unregister,

    /// Collect and upload an advisor archive
    ScanAdvisor,

    /// Collect and upload a compliance archive
    ScanCompliance,

    /// Check a playbook's signature and print it
    VerifyPlaybook(commands::VerifyPlaybookArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the command fails.
    pub fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            no_update,
            force_update,
            command,
        } = self;

        let config = YamlConfigLoader::from_env().load()?;
        logging::init(&config.logging);

        let flags = AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            behaviour: BehaviourFlags {
                no_update,
                force_update,
            },
        };
        let app = AppContext::new(&flags, config);

        match command {
            Command::Update(args) => commands::update::run(&app, &args),
            Command::Version => commands::version::run(&app),
            Command::Status => commands::status::run(&app),
            Command::Identity => commands::identity::run(&app),
            Command::Checkin(args) => commands::checkin::run(&app, args),
            Command::Register => commands::register::run(&app),
            Command::Unregister => commands::unregister::run(&app),
            Command::ScanAdvisor => commands::scan::run(&app, ScanKind::Advisor),
            Command::ScanCompliance => commands::scan::run(&app, ScanKind::Compliance),
            Command::VerifyPlaybook(args) => commands::verify_playbook::run(&app, &args),
        }
    }
}
