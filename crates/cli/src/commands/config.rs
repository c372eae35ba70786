// Path: crates/cli/src/commands/config.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tela_types::config::HostConfig;

#[derive(Parser, Debug)]
pub struct ConfigCmdArgs {
    #[clap(subcommand)]
    pub command: ConfigSubCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubCommands {
    /// Write the effective configuration to a TOML file.
    New {
        #[clap(long, default_value = "tela.toml")]
        out: PathBuf,
        /// Replace an existing file.
        #[clap(long)]
        force: bool,
    },
}

pub fn run(args: ConfigCmdArgs, config: &HostConfig) -> Result<()> {
    match args.command {
        ConfigSubCommands::New { out, force } => {
            if out.exists() && !force {
                bail!("{} already exists, use --force to replace it", out.display());
            }
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out, config.to_toml()?)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {}", out.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_round_trips_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("conf/tela.toml");
        let config = HostConfig {
            max_servers: 7,
            ..Default::default()
        };
        let cmd = |force| ConfigCmdArgs {
            command: ConfigSubCommands::New {
                out: out.clone(),
                force,
            },
        };

        run(cmd(false), &config).unwrap();
        assert_eq!(HostConfig::load(&out).unwrap(), config);
        assert!(run(cmd(false), &config).is_err());
        run(cmd(true), &HostConfig::default()).unwrap();
        assert_eq!(HostConfig::load(&out).unwrap(), HostConfig::default());
    }
}
