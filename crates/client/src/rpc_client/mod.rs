// Path: crates/client/src/rpc_client/mod.rs

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tela_api::ledger::LedgerClient;
use tela_types::error::LedgerError;
use tela_types::rpc::{
    GetScParams, GetScResult, GetTransactionParams, GetTransactionResult, JsonRpcRequest,
    JsonRpcResponse, METHOD_GET_SC, METHOD_GET_TRANSACTION,
};

/// A JSON-RPC 2.0 client posting to `http://<endpoint>/json_rpc`.
///
/// The underlying HTTP client is created on first use and dropped by
/// [`LedgerClient::close`], so a closed client transparently reconnects.
pub struct RpcClient {
    url: String,
    http: Mutex<Option<reqwest::Client>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.url)
            .field("connected", &self.http.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    /// Creates a client for a daemon at `endpoint` (`host:port`).
    pub fn new(endpoint: &str) -> Self {
        Self {
            url: format!("http://{}/json_rpc", endpoint),
            http: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// The URL requests are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn http(&self) -> reqwest::Client {
        self.http
            .lock()
            .get_or_insert_with(reqwest::Client::new)
            .clone()
    }

    async fn call<P, R>(&self, method: &str, params: P) -> Result<R, LedgerError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        tracing::trace!(target: "tela::client", method, id, "rpc call");

        let resp = self
            .http()
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let body: JsonRpcResponse<R> = resp
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        match (body.result, body.error) {
            (_, Some(err)) => Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(LedgerError::Decode(format!(
                "{} response has neither result nor error",
                method
            ))),
        }
    }
}

#[async_trait]
impl LedgerClient for RpcClient {
    async fn get_sc(&self, params: GetScParams) -> Result<GetScResult, LedgerError> {
        self.call(METHOD_GET_SC, params).await
    }

    async fn get_transaction(
        &self,
        params: GetTransactionParams,
    ) -> Result<GetTransactionResult, LedgerError> {
        self.call(METHOD_GET_TRANSACTION, params).await
    }

    fn close(&self) {
        if self.http.lock().take().is_some() {
            tracing::debug!(target: "tela::client", url = %self.url, "closed daemon connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn daemon(Json(req): Json<Value>) -> Json<Value> {
        let id = req["id"].clone();
        match req["method"].as_str() {
            Some("DERO.GetSC") => Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {
                    "code": format!("// {}", req["params"]["scid"].as_str().unwrap_or_default()),
                    "stringkeys": {"likes": 1}
                }
            })),
            _ => Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": "method not found"}
            })),
        }
    }

    async fn spawn_daemon() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/json_rpc", post(daemon));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr.to_string()
    }

    #[tokio::test]
    async fn get_sc_decodes_result() {
        let client = RpcClient::new(&spawn_daemon().await);
        let res = client.get_sc(GetScParams::code("abc", None)).await.unwrap();
        assert_eq!(res.code, "// abc");
        assert_eq!(res.stringkeys["likes"], json!(1));
    }

    #[tokio::test]
    async fn rpc_errors_are_surfaced() {
        let client = RpcClient::new(&spawn_daemon().await);
        let err = client
            .get_transaction(GetTransactionParams {
                txs_hashes: vec!["tx".into()],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn closed_client_reconnects() {
        let client = RpcClient::new(&spawn_daemon().await);
        client.get_sc(GetScParams::code("a", None)).await.unwrap();
        client.close();
        assert!(client.http.lock().is_none());
        client.get_sc(GetScParams::code("b", None)).await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_daemon_is_a_transport_error() {
        let client = RpcClient::new("127.0.0.1:1");
        let err = client.get_sc(GetScParams::code("a", None)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
    }
}
