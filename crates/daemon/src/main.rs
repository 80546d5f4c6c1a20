// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! resmond: resource supervision daemon.
//!
//! Loads a profile, supervises its resources, and serves the control
//! socket until an interrupt or terminate signal arrives.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::process::ExitCode;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use resmon_core::Profile;
use resmon_daemon::lifecycle;
use resmon_engine::LogAlertSink;

fn print_usage() {
    println!("Usage: resmond [OPTION] CONFIG_FILE");
    println!();
    println!("Options:");
    println!("  -h, --help       Print help information");
    println!("  -v, --version    Print version information");
}

/// Parsed command line: the config file path, or an immediate exit.
fn parse_args() -> Result<String, ExitCode> {
    let mut args = std::env::args().skip(1);
    let Some(first) = args.next() else {
        print_usage();
        return Err(ExitCode::FAILURE);
    };
    match first.as_str() {
        "--help" | "-h" => {
            print_usage();
            Err(ExitCode::SUCCESS)
        }
        "--version" | "-V" | "-v" => {
            println!("resmond {}", env!("CARGO_PKG_VERSION"));
            Err(ExitCode::SUCCESS)
        }
        flag if flag.starts_with('-') => {
            eprintln!("error: unknown option '{flag}'");
            print_usage();
            Err(ExitCode::FAILURE)
        }
        path => {
            if args.next().is_some() {
                eprintln!("error: too many filenames");
                print_usage();
                return Err(ExitCode::FAILURE);
            }
            Ok(path.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = match parse_args() {
        Ok(path) => path,
        Err(code) => return code,
    };

    let profile = match resmon_profile::load(&config_path) {
        Ok(profile) => profile,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if profile.resources.is_empty() {
        eprintln!(
            "No resource specified in profile '{}', process is stopped",
            profile.name
        );
        return ExitCode::SUCCESS;
    }

    // Marker first, so the control plane can find where this run's log
    // lines begin even though the appender below is non-blocking.
    if let Err(err) = lifecycle::write_startup_marker(&profile.log_file) {
        eprintln!(
            "Error: cannot write to log file '{}': {}",
            profile.log_file.display(),
            err
        );
        return ExitCode::FAILURE;
    }
    let log_guard = match setup_logging(&profile) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "[{}] process {} spawned for profile",
        profile.name,
        std::process::id()
    );

    let admin_dir = resmon_core::admin_dir();
    let daemon = match lifecycle::bootstrap(&profile, &admin_dir, Arc::new(LogAlertSink)).await {
        Ok(daemon) => daemon,
        Err(err) => {
            error!("[{}] failed to start daemon: {}", profile.name, err);
            eprintln!("Error: {err}");
            drop(log_guard);
            return ExitCode::FAILURE;
        }
    };

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("Error: cannot install signal handlers: {err}");
            daemon.shutdown().await;
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("[{}:*] signal is caught, terminating process", profile.name);
        }
        _ = sigint.recv() => {
            info!("[{}:*] signal is caught, terminating process", profile.name);
        }
    }

    daemon.shutdown().await;
    drop(log_guard);
    ExitCode::SUCCESS
}

fn setup_logging(
    profile: &Profile,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let directory = profile
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = profile
        .log_file
        .file_name()
        .ok_or_else(|| std::io::Error::other("log file has no file name"))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(profile.log_level.as_filter()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(guard)
}
