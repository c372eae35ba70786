// Path: crates/cli/src/commands/open.rs

use crate::util::{build_registry, serve_until_interrupted};
use anyhow::{Context, Result};
use clap::Parser;
use tela_types::config::HostConfig;

#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// A link of the form `open://<scid>/<path>...` or `tela://open/<scid>/<path>...`.
    pub link: String,
}

pub async fn run(args: OpenArgs, config: &HostConfig) -> Result<()> {
    let registry = build_registry(config)?;
    let url = match tela_core::resolve_link(&registry, &args.link)
        .await
        .with_context(|| format!("Failed to open {}", args.link))
    {
        Ok(url) => url,
        Err(e) => {
            registry.shutdown_all().await;
            return Err(e);
        }
    };

    println!("{}", url);
    serve_until_interrupted(&registry).await
}
