// Path: crates/core/src/locator.rs

//! Read-only queries against the ledger daemon.
//!
//! Every operation is a single pass over one or two RPC calls with no retry.
//! String variables are stored hex encoded; they are decoded on the way out,
//! and values that are not valid hex are returned unchanged.

use crate::validator::{valid_doc_version, valid_index_version};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tela_api::contract::{Contract, ContractParser};
use tela_api::ledger::LedgerClient;
use tela_types::app::{DocType, Document, Headers, Index, Rating, RatingSummary, Signature};
use tela_types::error::{LedgerError, TelaError, ValidationError};
use tela_types::keys;
use tela_types::rpc::{GetScParams, GetTransactionParams};
use tela_types::Result;

/// Markers the daemon places in `valuesstring` instead of a value.
const VALUE_ERROR_MARKERS: [&str; 3] = ["NOT AVAILABLE err:", "Unmarshal error", "UNKNOWN Data type"];

/// Address prefixes of rating keys.
const ADDRESS_PREFIXES: [&str; 2] = ["dero1", "deto1"];

/// What kind of TELA contract a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// A TELA-DOC-1 contract.
    Document,
    /// A TELA-INDEX-1 contract.
    Index,
    /// Neither.
    Invalid,
}

/// Decodes a hex string, returning the input unchanged if it is not hex or not UTF-8.
pub fn decode_hex_string(value: &str) -> String {
    hex::decode(value)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| value.to_string())
}

/// Renders a stored variable as text. Numbers are formatted as integers.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => decode_hex_string(s),
        Value::Number(n) => match n.as_u64() {
            Some(u) => u.to_string(),
            None => format!("{:.0}", n.as_f64().unwrap_or_default()),
        },
        other => other.to_string(),
    }
}

fn str_var(vars: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    vars.get(key).and_then(Value::as_str).map(decode_hex_string)
}

fn missing(scid: &str, key: &str) -> LedgerError {
    LedgerError::MissingVar {
        scid: scid.to_string(),
        key: key.to_string(),
    }
}

fn is_value_error(value: &str) -> bool {
    VALUE_ERROR_MARKERS.iter().any(|m| value.contains(m))
}

fn is_address_key(key: &str) -> bool {
    ADDRESS_PREFIXES.iter().any(|p| key.starts_with(p))
        && key.len() > 5
        && key.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

/// Reads the ordered document references from an index's `InitializePrivate`.
///
/// References are `STORE("DOC<n>", "<scid>")` statements, returned in
/// ascending `<n>`. Duplicated references are kept.
pub fn index_docs(contract: &Contract) -> Vec<String> {
    let Some(init) = contract.function("InitializePrivate") else {
        return Vec::new();
    };
    let mut docs: Vec<(u64, String)> = Vec::new();
    for line in init.ordered_lines() {
        for (i, part) in line.iter().enumerate() {
            if !part.starts_with('"') {
                continue;
            }
            let Some(n) = keys::doc_number(part.trim_matches('"')) else {
                continue;
            };
            if let Some(value) = line.get(i + 2) {
                docs.push((n, value.trim_matches('"').to_string()));
            }
        }
    }
    docs.sort_by_key(|(n, _)| *n);
    docs.into_iter().map(|(_, scid)| scid).collect()
}

fn decode_tx(tx_hex: &str) -> Vec<u8> {
    hex::decode(tx_hex).unwrap_or_else(|_| tx_hex.as_bytes().to_vec())
}

fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

/// Returns true if transaction `txid` installs `scid` or carries its id.
///
/// An install transaction's id is the new contract's id. Update transactions
/// reference the contract by its raw 32-byte id.
pub fn tx_targets(tx_hex: &str, txid: &str, scid: &str) -> bool {
    if txid.eq_ignore_ascii_case(scid) {
        return true;
    }
    let id = hex::decode(scid).unwrap_or_else(|_| scid.as_bytes().to_vec());
    find(&decode_tx(tx_hex), &id).is_some()
}

/// Extracts contract code embedded in a raw transaction.
///
/// Every `Function ` ... `End Function` block is collected and the blocks are
/// joined by a blank line. Returns `None` when no complete block is found.
pub fn extract_code_from_tx(tx_hex: &str) -> Option<String> {
    const START: &[u8] = b"Function ";
    const END: &[u8] = b"End Function";

    let raw = decode_tx(tx_hex);

    let mut blocks = Vec::new();
    let mut rest = raw.as_slice();
    while let Some(start) = find(rest, START) {
        let Some(tail) = rest.get(start..) else { break };
        let Some(end) = find(tail, END) else { break };
        let end = end + END.len();
        let (block, remaining) = tail.split_at(end);
        blocks.push(String::from_utf8_lossy(block).into_owned());
        rest = remaining;
    }

    (!blocks.is_empty()).then(|| blocks.join("\n\n"))
}

/// Read access to TELA contracts through a [`LedgerClient`].
#[derive(Clone)]
pub struct Locator {
    ledger: Arc<dyn LedgerClient>,
    parser: Arc<dyn ContractParser>,
}

impl std::fmt::Debug for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Locator")
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

impl Locator {
    /// Creates a locator over `ledger`, validating code with `parser`.
    pub fn new(ledger: Arc<dyn LedgerClient>, parser: Arc<dyn ContractParser>) -> Self {
        Self { ledger, parser }
    }

    /// The underlying ledger client.
    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    /// The contract parser used for validation.
    pub fn parser(&self) -> &dyn ContractParser {
        self.parser.as_ref()
    }

    /// Fetches every stored variable of `scid`, still encoded.
    pub async fn fetch_vars(&self, scid: &str) -> Result<BTreeMap<String, Value>> {
        let result = self.ledger.get_sc(GetScParams::variables(scid)).await?;
        Ok(result.stringkeys)
    }

    /// Fetches and validates a TELA-DOC-1 contract.
    pub async fn fetch_document_vars(&self, scid: &str) -> Result<Document> {
        let vars = self.fetch_vars(scid).await?;
        let code = str_var(&vars, keys::CODE).ok_or_else(|| missing(scid, keys::CODE))?;
        let (_, version) = valid_doc_version(self.parser(), &code)?;

        let doc_type = str_var(&vars, keys::DOC_TYPE).ok_or_else(|| missing(scid, keys::DOC_TYPE))?;
        let doc_type: DocType = doc_type
            .parse()
            .map_err(|_| ValidationError::InvalidDocType(doc_type))?;
        let durl = str_var(&vars, keys::DURL).ok_or_else(|| missing(scid, keys::DURL))?;
        let opt = |key: &str| str_var(&vars, key).unwrap_or_default();

        Ok(Document {
            doc_type,
            code,
            sub_dir: opt(keys::SUB_DIR),
            scid: scid.to_string(),
            author: str_var(&vars, keys::OWNER).unwrap_or_else(|| keys::ANON_AUTHOR.to_string()),
            durl,
            version,
            signature: Signature {
                check_c: opt(keys::FILE_CHECK_C),
                check_s: opt(keys::FILE_CHECK_S),
            },
            headers: Headers {
                name: opt(keys::NAME_HDR),
                description: opt(keys::DESCR_HDR),
                icon_url: opt(keys::ICON_URL_HDR),
            },
        })
    }

    /// Fetches and validates a TELA-INDEX-1 contract.
    pub async fn fetch_index_vars(&self, scid: &str) -> Result<Index> {
        let vars = self.fetch_vars(scid).await?;
        let code = str_var(&vars, keys::CODE).ok_or_else(|| missing(scid, keys::CODE))?;
        let (contract, version) = valid_index_version(self.parser(), &code)?;
        let durl = str_var(&vars, keys::DURL).ok_or_else(|| missing(scid, keys::DURL))?;
        let opt = |key: &str| str_var(&vars, key).unwrap_or_default();

        Ok(Index {
            scid: scid.to_string(),
            author: str_var(&vars, keys::OWNER).unwrap_or_else(|| keys::ANON_AUTHOR.to_string()),
            durl,
            mods: opt(keys::MODS),
            docs: index_docs(&contract),
            version,
            headers: Headers {
                name: opt(keys::NAME_HDR),
                description: opt(keys::DESCR_HDR),
                icon_url: opt(keys::ICON_URL_HDR),
            },
        })
    }

    /// Fetches the current code of `scid`.
    pub async fn fetch_code(&self, scid: &str) -> Result<String> {
        self.code(scid, None).await
    }

    /// Fetches the code of `scid` as of a topo-height.
    pub async fn fetch_code_at_height(&self, scid: &str, height: u64) -> Result<String> {
        self.code(scid, Some(height)).await
    }

    async fn code(&self, scid: &str, height: Option<u64>) -> Result<String> {
        let result = self.ledger.get_sc(GetScParams::code(scid, height)).await?;
        if result.code.is_empty() {
            return Err(LedgerError::EmptyCode(scid.to_string()).into());
        }
        Ok(result.code)
    }

    /// Recovers the code of `scid` installed or updated by transaction `txid`,
    /// with its block height.
    pub async fn fetch_historical_code(&self, scid: &str, txid: &str) -> Result<(String, u64)> {
        let result = self
            .ledger
            .get_transaction(GetTransactionParams {
                txs_hashes: vec![txid.to_string()],
            })
            .await?;

        let tx_hex = result
            .txs_as_hex
            .first()
            .filter(|hex| !hex.is_empty())
            .ok_or_else(|| LedgerError::TxNotFound(txid.to_string()))?;
        if !tx_targets(tx_hex, txid, scid) {
            return Err(LedgerError::TxTargetMismatch {
                txid: txid.to_string(),
                scid: scid.to_string(),
            }
            .into());
        }
        let height = result
            .txs
            .first()
            .map(|tx| u64::try_from(tx.block_height).unwrap_or(0))
            .unwrap_or(0);
        let code = extract_code_from_tx(tx_hex)
            .ok_or_else(|| LedgerError::NoCodeInTx(txid.to_string()))?;

        Ok((code, height))
    }

    /// Fetches one string variable.
    ///
    /// Unset values and daemon error markers are reported as
    /// [`LedgerError::MissingVar`]. `likes` and `dislikes` are returned as stored.
    pub async fn fetch_var(&self, scid: &str, key: &str) -> Result<String> {
        let result = self.ledger.get_sc(GetScParams::key(scid, key)).await?;
        let value = result
            .valuesstring
            .first()
            .filter(|v| !v.is_empty() && !is_value_error(v))
            .ok_or_else(|| missing(scid, key))?;

        if key == keys::LIKES || key == keys::DISLIKES {
            return Ok(value.clone());
        }
        Ok(decode_hex_string(value))
    }

    /// Like [`fetch_var`](Self::fetch_var), mapping an unset value to `None`.
    pub async fn fetch_optional_var(&self, scid: &str, key: &str) -> Result<Option<String>> {
        match self.fetch_var(scid, key).await {
            Ok(v) => Ok(Some(v)),
            Err(TelaError::Ledger(LedgerError::MissingVar { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Classifies `scid` by the variables only a document or an index stores.
    pub async fn probe(&self, scid: &str) -> Result<Probe> {
        if self.fetch_optional_var(scid, keys::DOC_TYPE).await?.is_some() {
            return Ok(Probe::Document);
        }
        if self
            .fetch_optional_var(scid, &keys::doc_key(1))
            .await?
            .is_some()
        {
            return Ok(Probe::Index);
        }
        Ok(Probe::Invalid)
    }

    /// Returns the value stored at `key`, if any.
    pub async fn key_exists(&self, scid: &str, key: &str) -> Result<Option<String>> {
        let vars = self.fetch_vars(scid).await?;
        Ok(vars.get(key).map(format_value))
    }

    /// Returns the first key (in sorted order) starting with `prefix` and its value.
    pub async fn key_prefix_exists(
        &self,
        scid: &str,
        prefix: &str,
    ) -> Result<Option<(String, String)>> {
        let vars = self.fetch_vars(scid).await?;
        Ok(vars
            .iter()
            .find(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), format_value(v))))
    }

    /// Aggregates the ratings left on a TELA contract.
    ///
    /// Individual ratings below `min_height` are dropped; likes and dislikes
    /// are always the stored totals.
    pub async fn fetch_rating(&self, scid: &str, min_height: u64) -> Result<RatingSummary> {
        let vars = self.fetch_vars(scid).await?;
        let code = str_var(&vars, keys::CODE).ok_or_else(|| missing(scid, keys::CODE))?;
        if valid_index_version(self.parser(), &code).is_err() {
            valid_doc_version(self.parser(), &code)?;
        }

        let count = |key: &str| {
            vars.get(key)
                .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
                .unwrap_or(0)
        };
        let mut summary = RatingSummary {
            likes: count(keys::LIKES),
            dislikes: count(keys::DISLIKES),
            ..Default::default()
        };

        for (key, value) in &vars {
            if !is_address_key(key) {
                continue;
            }
            let Some(raw) = value.as_str() else { continue };
            let decoded = decode_hex_string(raw);
            let mut parts = decoded.split('_');
            let (Some(rating), Some(height)) = (parts.next(), parts.next()) else {
                continue;
            };
            let (Ok(rating), Ok(height)) = (rating.parse::<u64>(), height.parse::<u64>()) else {
                continue;
            };
            if height < min_height {
                continue;
            }
            summary.ratings.push(Rating {
                address: key.clone(),
                rating,
                height,
            });
        }

        summary.ratings.sort_by(|a, b| b.height.cmp(&a.height));
        let sum: u64 = summary.ratings.iter().map(|r| r.rating / 10).sum();
        if sum > 0 {
            summary.average = sum as f64 / summary.ratings.len() as f64;
        }
        Ok(summary)
    }
}
