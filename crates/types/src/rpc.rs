// Path: crates/types/src/rpc.rs

//! JSON-RPC 2.0 envelopes and the daemon calls used to read TELA contracts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The daemon method returning contract state and code.
pub const METHOD_GET_SC: &str = "DERO.GetSC";
/// The daemon method returning raw transactions.
pub const METHOD_GET_TRANSACTION: &str = "DERO.GetTransaction";

/// Parameters of `DERO.GetSC`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GetScParams {
    /// The contract to query.
    pub scid: String,
    /// Return the contract code.
    pub code: bool,
    /// Return every stored variable.
    pub variables: bool,
    /// Query the state at this topo-height instead of the tip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topoheight: Option<u64>,
    /// Return only these string keys, in `valuesstring`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keysstring: Vec<String>,
}

impl GetScParams {
    /// Requests every stored variable.
    pub fn variables(scid: &str) -> Self {
        Self {
            scid: scid.to_string(),
            variables: true,
            ..Default::default()
        }
    }

    /// Requests the code, optionally at a topo-height.
    pub fn code(scid: &str, topoheight: Option<u64>) -> Self {
        Self {
            scid: scid.to_string(),
            code: true,
            topoheight,
            ..Default::default()
        }
    }

    /// Requests a single string key.
    pub fn key(scid: &str, key: &str) -> Self {
        Self {
            scid: scid.to_string(),
            keysstring: vec![key.to_string()],
            ..Default::default()
        }
    }
}

/// Result of `DERO.GetSC`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GetScResult {
    /// Values of the requested `keysstring`, in request order.
    #[serde(default)]
    pub valuesstring: Vec<String>,
    /// Every stored variable with a string key. Values are hex strings or numbers.
    #[serde(default)]
    pub stringkeys: BTreeMap<String, Value>,
    /// The contract code.
    #[serde(default)]
    pub code: String,
}

/// Parameters of `DERO.GetTransaction`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GetTransactionParams {
    /// The transactions to fetch.
    pub txs_hashes: Vec<String>,
}

/// Per-transaction metadata of `DERO.GetTransaction`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TxRelatedInfo {
    /// The height of the block the transaction was mined in.
    #[serde(default)]
    pub block_height: i64,
}

/// Result of `DERO.GetTransaction`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GetTransactionResult {
    /// The raw transactions, hex encoded.
    #[serde(default)]
    pub txs_as_hex: Vec<String>,
    /// Metadata of each transaction.
    #[serde(default)]
    pub txs: Vec<TxRelatedInfo>,
}

/// A JSON-RPC 2.0 request.
#[derive(Serialize, Debug, Clone)]
pub struct JsonRpcRequest<'a, P> {
    /// Always `2.0`.
    pub jsonrpc: &'static str,
    /// The request id.
    pub id: u64,
    /// The method name.
    pub method: &'a str,
    /// The method parameters.
    pub params: P,
}

impl<'a, P> JsonRpcRequest<'a, P> {
    /// Builds a request envelope.
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// The error object of a JSON-RPC 2.0 response.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct JsonRpcError {
    /// The error code.
    pub code: i64,
    /// The error message.
    pub message: String,
}

/// A JSON-RPC 2.0 response.
#[derive(Deserialize, Debug, Clone)]
pub struct JsonRpcResponse<R> {
    /// Present on success.
    pub result: Option<R>,
    /// Present on failure.
    pub error: Option<JsonRpcError>,
}
