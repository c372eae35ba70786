// Path: crates/types/src/config/mod.rs

//! Hosting configuration shared by the CLI and the server registry.
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default first port probed for new servers.
pub const DEFAULT_PORT_START: u16 = 8082;
/// The default maximum number of concurrently active servers.
pub const DEFAULT_MAX_SERVERS: u16 = 20;
/// The lowest port a server may be started on.
pub const MIN_PORT: u16 = 1200;
/// The highest port a server may be started on.
pub const MAX_PORT: u16 = 65535;

/// Configuration for the TELA hosting service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Root data directory. Hosted trees live in `<data_dir>/tela`, clones in `<data_dir>/clone`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// The ledger daemon RPC endpoint, `host:port`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// The first port probed when starting a server.
    #[serde(default = "default_port_start")]
    pub port_start: u16,
    /// The maximum number of concurrently active servers.
    #[serde(default = "default_max_servers")]
    pub max_servers: u16,
    /// Allow content whose code was updated after installation.
    #[serde(default)]
    pub allow_updates: bool,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
    /// Optional listen address for the `/metrics` and `/healthz` endpoints.
    #[serde(default)]
    pub metrics_listen_addr: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("datashards")
}
fn default_endpoint() -> String {
    "127.0.0.1:10102".to_string()
}
fn default_port_start() -> u16 {
    DEFAULT_PORT_START
}
fn default_max_servers() -> u16 {
    DEFAULT_MAX_SERVERS
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            endpoint: default_endpoint(),
            port_start: default_port_start(),
            max_servers: default_max_servers(),
            allow_updates: false,
            json_logs: false,
            metrics_listen_addr: None,
        }
    }
}

impl HostConfig {
    /// Loads a configuration from a TOML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, crate::error::TelaError> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| crate::error::TelaError::Config(e.to_string()))
    }

    /// Renders this configuration as TOML.
    pub fn to_toml(&self) -> Result<String, crate::error::TelaError> {
        toml::to_string_pretty(self).map_err(|e| crate::error::TelaError::Config(e.to_string()))
    }

    /// The directory hosted trees are materialized under.
    pub fn hosting_root(&self) -> PathBuf {
        self.data_dir.join("tela")
    }

    /// The directory clones are materialized under.
    pub fn clone_root(&self) -> PathBuf {
        self.data_dir.join("clone")
    }
}

/// Returns true if `port` can start a range of `max_servers` ports.
pub fn is_valid_port(port: u16, max_servers: u16) -> bool {
    port >= MIN_PORT && u32::from(port) <= u32::from(MAX_PORT) - u32::from(max_servers)
}

/// Clamps `max_servers` to `1..=65535-port_start`.
pub fn clamp_max_servers(max_servers: u16, port_start: u16) -> u16 {
    let upper = MAX_PORT.saturating_sub(port_start).max(1);
    max_servers.clamp(1, upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: HostConfig = toml::from_str("allow_updates = true\n").unwrap();
        assert!(cfg.allow_updates);
        assert_eq!(cfg.port_start, DEFAULT_PORT_START);
        assert_eq!(cfg.max_servers, DEFAULT_MAX_SERVERS);
        assert_eq!(cfg.hosting_root(), PathBuf::from("datashards/tela"));
    }

    #[test]
    fn config_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tela.toml");
        let cfg = HostConfig {
            endpoint: "node:20000".into(),
            max_servers: 3,
            ..Default::default()
        };
        std::fs::write(&path, cfg.to_toml().unwrap()).unwrap();
        assert_eq!(HostConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn port_validation_bounds() {
        assert!(!is_valid_port(1199, 20));
        assert!(is_valid_port(1200, 20));
        assert!(is_valid_port(65515, 20));
        assert!(!is_valid_port(65516, 20));
    }

    #[test]
    fn max_servers_is_clamped() {
        assert_eq!(clamp_max_servers(0, 8082), 1);
        assert_eq!(clamp_max_servers(20, 8082), 20);
        assert_eq!(clamp_max_servers(u16::MAX, 65500), 35);
    }
}
