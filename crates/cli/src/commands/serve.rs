// Path: crates/cli/src/commands/serve.rs

use crate::util::{build_registry, serve_until_interrupted};
use anyhow::{Context, Result};
use clap::Parser;
use tela_types::config::HostConfig;

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// The SCID of the index to serve.
    pub scid: String,

    /// Serve the index as of this commit TXID. Requires `--allow-updates`.
    #[clap(long)]
    pub commit: Option<String>,
}

pub async fn run(args: ServeArgs, config: &HostConfig) -> Result<()> {
    let registry = build_registry(config)?;
    let served = match &args.commit {
        Some(txid) => registry.serve_at_commit(&args.scid, txid).await,
        None => registry.serve(&args.scid).await,
    };
    let link = match served.with_context(|| format!("Failed to serve {}", args.scid)) {
        Ok(link) => link,
        Err(e) => {
            registry.shutdown_all().await;
            return Err(e);
        }
    };

    println!("Serving {} at {}", args.scid, link);
    serve_until_interrupted(&registry).await
}
