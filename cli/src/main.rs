//! Nest - host agent that keeps a signed collection artifact up to date

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;

use nest_cli::cli::Cli;
use nest_cli::output::{json, user_message};

fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = cli.run() {
        tracing::error!("{e:#}");
        let message = user_message(&e);
        match json::format_message(&message, false) {
            Ok(doc) if json_mode => println!("{doc}"),
            _ => eprintln!("Error: {message}"),
        }
        std::process::exit(1);
    }
}
