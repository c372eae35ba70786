// Path: crates/cli/src/util.rs

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tela_client::RpcClient;
use tela_core::{BasicParser, Locator, Registry};
use tela_types::config::HostConfig;
use tokio::sync::watch;

/// Options shared by every command that talks to the ledger.
#[derive(Args, Debug, Clone, Default)]
pub struct HostArgs {
    /// Path to a TOML configuration file.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Root data directory.
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Ledger daemon RPC endpoint, `host:port`.
    #[clap(long, global = true)]
    pub endpoint: Option<String>,

    /// First port probed for new servers.
    #[clap(long, global = true)]
    pub port_start: Option<u16>,

    /// Maximum number of concurrent servers.
    #[clap(long, global = true)]
    pub max_servers: Option<u16>,

    /// Allow content updated after installation.
    #[clap(long, global = true)]
    pub allow_updates: bool,

    /// Emit logs as JSON lines.
    #[clap(long, global = true)]
    pub json_logs: bool,

    /// Listen address for `/metrics` and `/healthz`.
    #[clap(long, global = true)]
    pub metrics_addr: Option<String>,
}

impl HostArgs {
    /// Loads the configuration file, if any, and applies the command line overrides.
    pub fn load_config(&self) -> Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => HostConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(port) = self.port_start {
            config.port_start = port;
        }
        if let Some(max) = self.max_servers {
            config.max_servers = max;
        }
        if let Some(addr) = &self.metrics_addr {
            config.metrics_listen_addr = Some(addr.clone());
        }
        config.allow_updates |= self.allow_updates;
        config.json_logs |= self.json_logs;
        Ok(config)
    }
}

/// Builds a locator over the configured daemon endpoint.
pub fn build_locator(config: &HostConfig) -> Locator {
    Locator::new(
        Arc::new(RpcClient::new(&config.endpoint)),
        Arc::new(BasicParser),
    )
}

/// Builds the server registry for `config`.
pub fn build_registry(config: &HostConfig) -> Result<Registry> {
    let registry = Registry::new(build_locator(config), config);
    registry
        .set_port_start(config.port_start)
        .context("Invalid port_start")?;
    Ok(registry)
}

/// Starts the metrics endpoint if one is configured. Dropping the sender stops it.
pub fn start_metrics(config: &HostConfig) -> Result<Option<watch::Sender<bool>>> {
    let Some(addr) = &config.metrics_listen_addr else {
        return Ok(None);
    };
    let addr = addr
        .parse()
        .with_context(|| format!("Invalid metrics address {}", addr))?;
    let sink = tela_telemetry::prometheus::install()?;
    tela_telemetry::sinks::SINK
        .set(sink)
        .map_err(|_| anyhow::anyhow!("Metrics sink already set"))?;

    let (tx, rx) = watch::channel(false);
    tokio::spawn(tela_telemetry::http::run_server(addr, rx));
    Ok(Some(tx))
}

/// Waits for Ctrl-C, then stops every server and removes hosted files.
pub async fn serve_until_interrupted(registry: &Registry) -> Result<()> {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl-C")?;
            tracing::info!(target: "tela::cli", event = "shutdown", reason = "ctrl-c");
        }
    }
    registry.shutdown_all().await;
    tracing::info!(target: "tela::cli", event = "shutdown", reason = "complete");
    Ok(())
}
