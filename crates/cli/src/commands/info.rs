// Path: crates/cli/src/commands/info.rs

use crate::util::build_locator;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tela_core::Probe;
use tela_types::config::HostConfig;

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// The SCID of the document or index.
    pub scid: String,
}

pub async fn run(args: InfoArgs, config: &HostConfig) -> Result<()> {
    let locator = build_locator(config);
    let json = match locator.probe(&args.scid).await? {
        Probe::Document => serde_json::to_string_pretty(
            &locator
                .fetch_document_vars(&args.scid)
                .await
                .context("Failed to read document")?,
        )?,
        Probe::Index => serde_json::to_string_pretty(
            &locator
                .fetch_index_vars(&args.scid)
                .await
                .context("Failed to read index")?,
        )?,
        Probe::Invalid => return Err(anyhow!("{} is not a TELA document or index", args.scid)),
    };
    println!("{}", json);
    Ok(())
}
