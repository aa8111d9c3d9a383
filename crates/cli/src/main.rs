// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! forge - declarative TTP runner CLI

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{list, run, show};

#[derive(Parser)]
#[command(
    name = "forge",
    version,
    about = "Run declarative TTP documents with guaranteed reverse-order cleanup"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a TTP
    Run(run::RunArgs),
    /// Show a TTP's preamble, arguments, and steps
    Show(show::ShowArgs),
    /// List TTP documents under the search paths
    List(list::ListArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Show(args) => show::execute(args),
        Commands::List(args) => list::execute(args),
    }
}

/// Diagnostics go to stderr; captured step output owns stdout.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "forge=debug,forge_engine=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
