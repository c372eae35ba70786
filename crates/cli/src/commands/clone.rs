// Path: crates/cli/src/commands/clone.rs

use crate::util::build_registry;
use anyhow::{Context, Result};
use clap::Parser;
use tela_types::config::HostConfig;

#[derive(Parser, Debug)]
pub struct CloneArgs {
    /// The SCID of the document or index to clone.
    pub scid: String,

    /// Clone the index as of this commit TXID.
    #[clap(long)]
    pub commit: Option<String>,
}

pub async fn run(args: CloneArgs, config: &HostConfig) -> Result<()> {
    let registry = build_registry(config)?;
    let clone = match &args.commit {
        Some(txid) => registry.clone_at_commit(&args.scid, txid).await,
        None => registry.clone(&args.scid).await,
    }
    .with_context(|| format!("Failed to clone {}", args.scid))?;

    println!("Cloned {} to {}", clone.durl, clone.base_path.display());
    if !clone.entrypoint.is_empty() {
        println!(
            "Entrypoint: {}{}/{}",
            clone.base_path.display(),
            clone.serve_path,
            clone.entrypoint
        );
    }
    Ok(())
}
