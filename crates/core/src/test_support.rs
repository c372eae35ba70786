// Path: crates/core/src/test_support.rs

//! Contract fixtures and an in-memory ledger for unit tests.

use crate::locator::Locator;
use crate::parser::BasicParser;
use crate::templates::{TELA_DOC_1, TELA_INDEX_1};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tela_api::ledger::LedgerClient;
use tela_types::error::LedgerError;
use tela_types::keys;
use tela_types::rpc::{
    GetScParams, GetScResult, GetTransactionParams, GetTransactionResult, TxRelatedInfo,
};

pub const OWNER: &str = "dero1qyfixtureowner";

/// Inputs of a rendered TELA-DOC-1 contract.
#[derive(Debug, Clone)]
pub struct DocSpec {
    pub name: String,
    pub doc_type: String,
    pub body: String,
    pub sub_dir: String,
    pub durl: String,
}

impl DocSpec {
    pub fn new(name: &str, doc_type: &str, body: &str) -> Self {
        Self {
            name: name.into(),
            doc_type: doc_type.into(),
            body: body.into(),
            sub_dir: String::new(),
            durl: name.into(),
        }
    }

    pub fn sub_dir(mut self, sub_dir: &str) -> Self {
        self.sub_dir = sub_dir.into();
        self
    }
}

/// Inputs of a rendered TELA-INDEX-1 contract.
#[derive(Debug, Clone)]
pub struct IndexSpec {
    pub durl: String,
    pub docs: Vec<String>,
    pub mods: String,
}

impl IndexSpec {
    pub fn new(durl: &str, docs: &[&str]) -> Self {
        Self {
            durl: durl.into(),
            docs: docs.iter().map(|d| d.to_string()).collect(),
            mods: String::new(),
        }
    }
}

pub fn render_doc(spec: &DocSpec) -> String {
    let code = TELA_DOC_1
        .replace("<nameHdr>", &spec.name)
        .replace("<descrHdr>", "fixture")
        .replace("<iconURLHdr>", "")
        .replace("<dURL>", &spec.durl)
        .replace("<docType>", &spec.doc_type)
        .replace("<subDir>", &spec.sub_dir)
        .replace("<fileCheckC>", "")
        .replace("<fileCheckS>", "");
    format!("{}\n/*\n{}\n*/", code.trim_end(), spec.body)
}

pub fn render_index(spec: &IndexSpec) -> String {
    let docs: Vec<String> = spec
        .docs
        .iter()
        .enumerate()
        .map(|(i, scid)| format!("{} STORE(\"DOC{}\", \"{}\")", 40 + i, i + 1, scid))
        .collect();
    TELA_INDEX_1
        .replace("40 STORE(\"DOC1\", \"<DOC1>\")", &docs.join("\n"))
        .replace("<nameHdr>", &spec.durl)
        .replace("<descrHdr>", "fixture")
        .replace("<iconURLHdr>", "")
        .replace("<dURL>", &spec.durl)
        .replace("<mods>", &spec.mods)
}

#[derive(Debug, Default)]
struct MockContract {
    vars: BTreeMap<String, Value>,
    code: String,
    code_at: BTreeMap<u64, String>,
}

#[derive(Debug, Default)]
struct MockState {
    contracts: HashMap<String, MockContract>,
    txs: HashMap<String, (String, u64)>,
}

/// An in-memory daemon. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<MockState>>,
    closed: Arc<AtomicUsize>,
}

fn hex_var(value: &str) -> Value {
    json!(hex::encode(value))
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, scid: &str, code: String, mut vars: BTreeMap<String, Value>) {
        vars.insert(keys::CODE.into(), hex_var(&code));
        vars.insert(keys::OWNER.into(), hex_var(OWNER));
        vars.insert(keys::HASH.into(), hex_var(scid));
        vars.insert(keys::LIKES.into(), json!(0));
        vars.insert(keys::DISLIKES.into(), json!(0));
        self.state.lock().contracts.insert(
            scid.to_string(),
            MockContract {
                vars,
                code,
                code_at: BTreeMap::new(),
            },
        );
    }

    pub fn add_doc(&self, scid: &str, spec: &DocSpec) {
        let mut vars = BTreeMap::new();
        vars.insert(keys::NAME_HDR.into(), hex_var(&spec.name));
        vars.insert(keys::DESCR_HDR.into(), hex_var("fixture"));
        vars.insert(keys::DURL.into(), hex_var(&spec.durl));
        vars.insert(keys::DOC_TYPE.into(), hex_var(&spec.doc_type));
        vars.insert(keys::SUB_DIR.into(), hex_var(&spec.sub_dir));
        vars.insert(keys::DOC_VERSION.into(), hex_var("1.0.0"));
        self.insert(scid, render_doc(spec), vars);
    }

    pub fn add_index(&self, scid: &str, spec: &IndexSpec) {
        let mut vars = BTreeMap::new();
        vars.insert(keys::NAME_HDR.into(), hex_var(&spec.durl));
        vars.insert(keys::DESCR_HDR.into(), hex_var("fixture"));
        vars.insert(keys::DURL.into(), hex_var(&spec.durl));
        vars.insert(keys::MODS.into(), hex_var(&spec.mods));
        vars.insert(keys::TELA_VERSION.into(), hex_var("1.1.0"));
        vars.insert("commit".into(), json!(0));
        for (i, doc) in spec.docs.iter().enumerate() {
            vars.insert(keys::doc_key(i + 1), hex_var(doc));
        }
        self.insert(scid, render_index(spec), vars);
    }

    /// A contract holding only `code`.
    pub fn add_raw(&self, scid: &str, code: &str) {
        let mut vars = BTreeMap::new();
        if !code.is_empty() {
            vars.insert(keys::CODE.into(), hex_var(code));
        }
        self.state.lock().contracts.insert(
            scid.to_string(),
            MockContract {
                vars,
                code: code.to_string(),
                code_at: BTreeMap::new(),
            },
        );
    }

    pub fn set_var(&self, scid: &str, key: &str, value: Value) {
        if let Some(c) = self.state.lock().contracts.get_mut(scid) {
            c.vars.insert(key.to_string(), value);
        }
    }

    pub fn remove_var(&self, scid: &str, key: &str) {
        if let Some(c) = self.state.lock().contracts.get_mut(scid) {
            c.vars.remove(key);
        }
    }

    /// Marks `scid` as updated by changing its commit hash.
    pub fn mark_updated(&self, scid: &str) {
        self.set_var(scid, keys::HASH, hex_var("f00d"));
    }

    /// Replaces the current code, keeping the old one as of `height`.
    pub fn update_code(&self, scid: &str, height: u64, code: &str) {
        if let Some(c) = self.state.lock().contracts.get_mut(scid) {
            let old = std::mem::replace(&mut c.code, code.to_string());
            c.code_at.insert(height, old);
            c.vars.insert(keys::CODE.into(), hex_var(code));
        }
    }

    /// Records the code `scid` had from `height` on.
    pub fn set_code_at(&self, scid: &str, height: u64, code: &str) {
        if let Some(c) = self.state.lock().contracts.get_mut(scid) {
            c.code_at.insert(height, code.to_string());
        }
    }

    /// Stores a transaction updating `scid` with `code`, between binary framing.
    pub fn add_tx(&self, txid: &str, scid: &str, code: &str, height: u64) {
        let mut raw = vec![0x01, 0x00];
        raw.extend_from_slice(scid.as_bytes());
        raw.extend_from_slice(&[0xfe, 0x7f]);
        raw.extend_from_slice(code.as_bytes());
        raw.extend_from_slice(&[0x00, 0x02]);
        self.state
            .lock()
            .txs
            .insert(txid.to_string(), (hex::encode(raw), height));
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_sc(&self, params: GetScParams) -> Result<GetScResult, LedgerError> {
        let state = self.state.lock();
        let contract = state
            .contracts
            .get(&params.scid)
            .ok_or_else(|| LedgerError::Rpc {
                code: -32098,
                message: format!("SCID {} not found", params.scid),
            })?;

        let mut result = GetScResult::default();
        for key in &params.keysstring {
            let value = match contract.vars.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => format!("NOT AVAILABLE err: key '{}' not found", key),
            };
            result.valuesstring.push(value);
        }
        if params.variables {
            result.stringkeys = contract.vars.clone();
        }
        if params.code {
            result.code = match params.topoheight {
                Some(h) => contract
                    .code_at
                    .range(..=h)
                    .next_back()
                    .map(|(_, code)| code.clone())
                    .unwrap_or_else(|| contract.code.clone()),
                None => contract.code.clone(),
            };
        }
        Ok(result)
    }

    async fn get_transaction(
        &self,
        params: GetTransactionParams,
    ) -> Result<GetTransactionResult, LedgerError> {
        let state = self.state.lock();
        let mut result = GetTransactionResult::default();
        for txid in &params.txs_hashes {
            if let Some((hex, height)) = state.txs.get(txid) {
                result.txs_as_hex.push(hex.clone());
                result.txs.push(TxRelatedInfo {
                    block_height: *height as i64,
                });
            }
        }
        Ok(result)
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn locator(ledger: &MockLedger) -> Locator {
    Locator::new(Arc::new(ledger.clone()), Arc::new(BasicParser))
}
