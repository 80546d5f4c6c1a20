// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! resmon: control client for the resmond daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use resmon_cli::Client;
use resmon_daemon::dispatch::{
    VERB_SHOW_PROFILE, VERB_SHOW_RESOURCE, VERB_START_RESOURCE, VERB_STOP_RESOURCE,
};

#[derive(Parser)]
#[command(name = "resmon", version, about = "Inspect and control a resmond daemon")]
struct Cli {
    /// Profile whose daemon to talk to
    #[arg(short, long)]
    profile: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the profile, or one resource with its recent events
    Show {
        /// Resource name; omit for the whole profile
        resource: Option<String>,
    },
    /// Start a resource
    Start { resource: String },
    /// Stop a resource
    Stop { resource: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let socket = resmon_core::socket_path(&resmon_core::admin_dir(), &cli.profile);

    let mut client = match Client::connect(&socket).await {
        Ok(client) => client,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        Commands::Show { resource: None } => client.request(VERB_SHOW_PROFILE, "").await,
        Commands::Show {
            resource: Some(name),
        } => client.request(VERB_SHOW_RESOURCE, name).await,
        Commands::Start { resource } => client.request(VERB_START_RESOURCE, resource).await,
        Commands::Stop { resource } => client.request(VERB_STOP_RESOURCE, resource).await,
    };

    match result {
        Ok(reply) => {
            print!("{reply}");
            if !reply.ends_with('\n') {
                println!();
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
