// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printfinder: printer discovery and driver lookup
//
// Entry point. Initialises logging, loads settings from the data directory,
// and dispatches the subcommand.

mod commands;
mod data_dir;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::{Cli, Command, Context};
use printfinder_core::error::Result;
use printfinder_core::status;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter.unwrap_or_else(|| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Printfinder v{} starting", env!("CARGO_PKG_VERSION"));

    let outcome = run(cli).await;

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("{}", status::humanize_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Building a lookup URL needs no data directory.
    if let Command::Open(args) = &cli.command {
        return commands::open(args);
    }
    let ctx = Context::load(cli.data_dir.as_deref())?;
    match cli.command {
        Command::Scan(args) => commands::scan(ctx, args).await,
        Command::History => commands::history(&ctx),
        Command::ClearHistory => commands::clear_history(&ctx),
        Command::Open(args) => commands::open(&args),
    }
}
