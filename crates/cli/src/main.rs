// Path: crates/cli/src/main.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # TELA CLI
//!
//! Serves, clones and inspects TELA content published on the ledger.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod util;

use commands::*;
use util::HostArgs;

#[derive(Parser, Debug)]
#[clap(
    name = "tela",
    version,
    about = "Host TELA content from the ledger.",
    long_about = "Resolves TELA indexes and documents into local file trees and serves them over HTTP."
)]
struct Cli {
    #[clap(flatten)]
    host: HostArgs,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve an index until interrupted.
    Serve(serve::ServeArgs),

    /// Clone a document or index into the clone directory.
    Clone(clone::CloneArgs),

    /// Open an `open://<scid>/...` link and serve until interrupted.
    Open(open::OpenArgs),

    /// Print the stored details of a document or index.
    Info(info::InfoArgs),

    /// Print the ratings of a document or index.
    Rating(rating::RatingArgs),

    /// Generate configuration files.
    Config(config::ConfigCmdArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.host.load_config()?;

    tela_telemetry::init::init_tracing(config.json_logs)?;
    let _metrics = util::start_metrics(&config)?;
    tracing::debug!(target: "tela::cli", endpoint = %config.endpoint, data_dir = %config.data_dir.display(), "Loaded configuration");

    match cli.command {
        Commands::Serve(args) => serve::run(args, &config).await,
        Commands::Clone(args) => clone::run(args, &config).await,
        Commands::Open(args) => open::run(args, &config).await,
        Commands::Info(args) => info::run(args, &config).await,
        Commands::Rating(args) => rating::run(args, &config).await,
        Commands::Config(args) => config::run(args, &config),
    }
}
