// Path: crates/core/src/registry.rs

//! The table of active hosting servers.
//!
//! Each hosted tree is served by its own axum listener on a port from
//! `[port_start, port_start + max_servers)`. The listener runs in a spawned
//! task and stops when its watch channel fires. One mutex guards the table and
//! the hosting policy; it is never held across an await point.

use crate::locator::Locator;
use crate::resolver::{Resolver, Revision};
use axum::Router;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tela_telemetry::hosting_metrics;
use tela_types::app::{ServerInfo, TreeClone};
use tela_types::config::{clamp_max_servers, is_valid_port, HostConfig};
use tela_types::error::HostError;
use tela_types::keys;
use tela_types::Result;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const PORT_PROBE_BACKOFF: Duration = Duration::from_millis(50);

struct ServerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
    base_path: PathBuf,
}

struct State {
    servers: HashMap<ServerInfo, ServerHandle>,
    port_start: u16,
    max_servers: u16,
    allow_updates: bool,
}

impl State {
    fn at_capacity(&self) -> bool {
        self.servers.len() >= usize::from(self.max_servers)
    }

    fn ports(&self) -> std::ops::Range<u16> {
        let end = u32::from(self.port_start) + u32::from(self.max_servers);
        let end = u16::try_from(end).unwrap_or(u16::MAX);
        self.port_start..end
    }
}

async fn remove_files(path: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(target: "tela::registry", path = %path.display(), error = %e, "Failed to remove files");
        }
    }
}

/// Drops a failed server's table entry and removes its files.
async fn forget_failed(state: &Mutex<State>, info: &ServerInfo, path: &Path) {
    if state.lock().servers.remove(info).is_some() {
        hosting_metrics().dec_servers_active();
    }
    remove_files(path).await;
}

/// Hosts resolved trees and tracks their servers.
#[derive(Clone)]
pub struct Registry {
    locator: Locator,
    data_dir: PathBuf,
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("data_dir", &self.data_dir)
            .field("servers", &self.state.lock().servers.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an empty registry with the policy of `config`.
    pub fn new(locator: Locator, config: &HostConfig) -> Self {
        Self {
            locator,
            data_dir: config.data_dir.clone(),
            state: Arc::new(Mutex::new(State {
                servers: HashMap::new(),
                port_start: config.port_start,
                max_servers: clamp_max_servers(config.max_servers, config.port_start),
                allow_updates: config.allow_updates,
            })),
        }
    }

    /// The locator shared with every resolution.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// The directory hosted trees are materialized under.
    pub fn hosting_path(&self) -> PathBuf {
        self.data_dir.join("tela")
    }

    /// The directory clones are materialized under.
    pub fn clone_path(&self) -> PathBuf {
        self.data_dir.join("clone")
    }

    /// The first port of the hosting range.
    pub fn port_start(&self) -> u16 {
        self.state.lock().port_start
    }

    /// Sets the first port of the hosting range.
    pub fn set_port_start(&self, port: u16) -> Result<()> {
        let mut state = self.state.lock();
        if !is_valid_port(port, state.max_servers) {
            return Err(HostError::InvalidPort(port).into());
        }
        state.port_start = port;
        Ok(())
    }

    /// The maximum number of concurrent servers.
    pub fn max_servers(&self) -> u16 {
        self.state.lock().max_servers
    }

    /// Sets the maximum number of concurrent servers, clamped to the port range.
    ///
    /// Active servers above the new limit keep running.
    pub fn set_max_servers(&self, max_servers: u16) {
        let mut state = self.state.lock();
        state.max_servers = clamp_max_servers(max_servers, state.port_start);
    }

    /// Whether updated content may be resolved.
    pub fn allow_updates(&self) -> bool {
        self.state.lock().allow_updates
    }

    /// Allows or refuses updated content in later resolutions.
    pub fn set_allow_updates(&self, allow: bool) {
        self.state.lock().allow_updates = allow;
    }

    /// The identities of every active server, sorted.
    pub fn server_info(&self) -> Vec<ServerInfo> {
        let mut servers: Vec<_> = self.state.lock().servers.keys().cloned().collect();
        servers.sort();
        servers
    }

    /// Returns true if a server with `name` is active, ignoring case.
    pub fn has_server(&self, name: &str) -> bool {
        self.state
            .lock()
            .servers
            .keys()
            .any(|info| info.name.eq_ignore_ascii_case(name))
    }

    fn resolver(&self) -> Resolver {
        Resolver::new(self.locator.clone(), self.allow_updates())
    }

    fn ensure_capacity(&self) -> Result<()> {
        let state = self.state.lock();
        if state.at_capacity() {
            return Err(HostError::AtCapacity(state.servers.len()).into());
        }
        Ok(())
    }

    /// Returns the first port of the range that can be bound, releasing it again.
    pub async fn find_open_port(&self) -> Option<SocketAddr> {
        let listener = self.bind_open_port().await?;
        listener.local_addr().ok()
    }

    async fn bind_open_port(&self) -> Option<TcpListener> {
        let ports: Vec<u16> = self.state.lock().ports().collect();
        for port in ports {
            match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
                Ok(listener) => return Some(listener),
                Err(e) => {
                    tracing::debug!(target: "tela::registry", port, error = %e, "Finding port");
                    tokio::time::sleep(PORT_PROBE_BACKOFF).await;
                }
            }
        }
        None
    }

    /// Serves `clone` on a new server registered under `scid`.
    ///
    /// Returns `http://localhost:<port><serve_path>/<entrypoint>`.
    pub async fn host_clone(&self, scid: &str, clone: TreeClone) -> Result<String> {
        if clone.is_library() {
            remove_files(&clone.base_path).await;
            return Err(HostError::NotServable(clone.durl).into());
        }
        if let Err(e) = self.ensure_capacity() {
            remove_files(&clone.base_path).await;
            return Err(e);
        }

        let Some(listener) = self.bind_open_port().await else {
            remove_files(&clone.base_path).await;
            return Err(HostError::NoOpenPort.into());
        };
        let port = listener
            .local_addr()
            .map_err(|e| HostError::Bind(e.to_string()))?
            .port();

        let info = ServerInfo {
            name: clone.durl.clone(),
            address: format!(":{}", port),
            scid: scid.to_string(),
            entrypoint: clone.entrypoint.clone(),
        };
        let link = format!(
            "http://localhost:{}{}/{}",
            port, clone.serve_path, clone.entrypoint
        );
        let app = Router::new()
            .fallback_service(ServeDir::new(&clone.base_path))
            .layer(TraceLayer::new_for_http());

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let task_state = Arc::clone(&self.state);
        let task_info = info.clone();
        let task_path = clone.base_path.clone();

        let registered = {
            let mut state = self.state.lock();
            if state.at_capacity() {
                Err(state.servers.len())
            } else {
                let task = tokio::spawn(async move {
                    let served = axum::serve(listener, app.into_make_service())
                        .with_graceful_shutdown(async move {
                            shutdown_rx.changed().await.ok();
                        })
                        .await;
                    match served {
                        Ok(()) => {
                            tracing::info!(target: "tela::registry", name = %task_info.name, address = %task_info.address, "Closed server");
                        }
                        // axum retries failed accepts itself, so this arm is rarely reached.
                        Err(e) => {
                            tracing::error!(target: "tela::registry", name = %task_info.name, address = %task_info.address, error = %e, "Server failed");
                            forget_failed(&task_state, &task_info, &task_path).await;
                        }
                    }
                });
                state.servers.insert(
                    info,
                    ServerHandle {
                        shutdown,
                        task,
                        base_path: clone.base_path.clone(),
                    },
                );
                Ok(())
            }
        };
        if let Err(active) = registered {
            remove_files(&clone.base_path).await;
            return Err(HostError::AtCapacity(active).into());
        }
        hosting_metrics().inc_servers_active();

        tracing::info!(target: "tela::registry", durl = %clone.durl, link = %link, "Serving");
        Ok(link)
    }

    fn check_servable(durl: &str) -> Result<()> {
        if keys::is_library(durl) || keys::is_doc_shards(durl) {
            return Err(HostError::NotServable(durl.to_string()).into());
        }
        Ok(())
    }

    /// Resolves index `scid` into the hosting root and serves it.
    pub async fn serve(&self, scid: &str) -> Result<String> {
        let durl = self.locator.fetch_var(scid, keys::DURL).await?;
        Self::check_servable(&durl)?;
        self.ensure_capacity()?;

        let clone = self
            .resolver()
            .resolve_index_graph(scid, &self.hosting_path(), Revision::Latest)
            .await?;
        self.host_clone(scid, clone).await
    }

    /// Resolves index `scid` as of transaction `txid` and serves it.
    ///
    /// Requires updates to be allowed.
    pub async fn serve_at_commit(&self, scid: &str, txid: &str) -> Result<String> {
        if !self.allow_updates() {
            return Err(HostError::UpdatesDisabled.into());
        }
        let durl = self.locator.fetch_var(scid, keys::DURL).await?;
        Self::check_servable(&durl)?;
        self.ensure_capacity()?;

        let clone = self
            .resolver()
            .resolve_index_graph(
                scid,
                &self.hosting_path(),
                Revision::Commit(txid.to_string()),
            )
            .await?;
        self.host_clone(scid, clone).await
    }

    /// Resolves `scid` into the clone root without serving it.
    pub async fn clone(&self, scid: &str) -> Result<TreeClone> {
        self.resolver().clone(scid, &self.clone_path()).await
    }

    /// Resolves index `scid` as of transaction `txid` into the clone root.
    pub async fn clone_at_commit(&self, scid: &str, txid: &str) -> Result<TreeClone> {
        self.resolver()
            .clone_at_commit(scid, txid, &self.clone_path())
            .await
    }

    async fn stop(info: ServerInfo, handle: ServerHandle) {
        handle.shutdown.send(true).ok();
        if let Err(e) = handle.task.await {
            tracing::error!(target: "tela::registry", name = %info.name, error = %e, "Server task failed");
        }
        hosting_metrics().dec_servers_active();
        remove_files(&handle.base_path).await;
    }

    /// Stops every server whose name matches `name`, ignoring case, and removes its files.
    ///
    /// Returns the number of servers stopped.
    pub async fn shutdown_one(&self, name: &str) -> usize {
        let stopped: Vec<(ServerInfo, ServerHandle)> = {
            let mut state = self.state.lock();
            let keys: Vec<ServerInfo> = state
                .servers
                .keys()
                .filter(|info| info.name.eq_ignore_ascii_case(name))
                .cloned()
                .collect();
            keys.into_iter()
                .filter_map(|info| state.servers.remove(&info).map(|h| (info, h)))
                .collect()
        };

        tracing::info!(target: "tela::registry", name, count = stopped.len(), "Shutdown");
        let count = stopped.len();
        for (info, handle) in stopped {
            Self::stop(info, handle).await;
        }
        count
    }

    /// Stops every server, closes the ledger connection and deletes the hosting root.
    pub async fn shutdown_all(&self) {
        let stopped: Vec<(ServerInfo, ServerHandle)> =
            self.state.lock().servers.drain().collect();
        tracing::info!(target: "tela::registry", count = stopped.len(), "Shutdown all");
        for (info, handle) in stopped {
            Self::stop(info, handle).await;
        }
        self.locator.ledger().close();
        remove_files(&self.hosting_path()).await;
    }
}
