// Path: crates/cli/src/commands/rating.rs

use crate::util::build_locator;
use anyhow::{Context, Result};
use clap::Parser;
use tela_types::config::HostConfig;

#[derive(Parser, Debug)]
pub struct RatingArgs {
    /// The SCID of the document or index.
    pub scid: String,

    /// Ignore ratings made below this block height.
    #[clap(long, default_value = "0")]
    pub min_height: u64,
}

pub async fn run(args: RatingArgs, config: &HostConfig) -> Result<()> {
    let summary = build_locator(config)
        .fetch_rating(&args.scid, args.min_height)
        .await
        .with_context(|| format!("Failed to read ratings of {}", args.scid))?;

    println!(
        "Likes: {}  Dislikes: {}  Average: {:.1}",
        summary.likes, summary.dislikes, summary.average
    );
    for r in &summary.ratings {
        println!("  {} rated {} at height {}", r.address, r.rating, r.height);
    }
    Ok(())
}
