// Path: crates/api/src/ledger/mod.rs

//! The remote ledger interface.

use async_trait::async_trait;
use std::fmt::Debug;
use tela_types::error::LedgerError;
use tela_types::rpc::{GetScParams, GetScResult, GetTransactionParams, GetTransactionResult};

/// Read access to contract state and transactions on the ledger daemon.
///
/// Implementations perform a single request per call. Retries are left to
/// the caller.
#[async_trait]
pub trait LedgerClient: Send + Sync + Debug {
    /// Calls `DERO.GetSC`.
    async fn get_sc(&self, params: GetScParams) -> Result<GetScResult, LedgerError>;

    /// Calls `DERO.GetTransaction`.
    async fn get_transaction(
        &self,
        params: GetTransactionParams,
    ) -> Result<GetTransactionResult, LedgerError>;

    /// Releases any held connection. Later calls may reconnect.
    fn close(&self) {}
}

#[async_trait]
impl<T: LedgerClient + ?Sized> LedgerClient for std::sync::Arc<T> {
    async fn get_sc(&self, params: GetScParams) -> Result<GetScResult, LedgerError> {
        (**self).get_sc(params).await
    }

    async fn get_transaction(
        &self,
        params: GetTransactionParams,
    ) -> Result<GetTransactionResult, LedgerError> {
        (**self).get_transaction(params).await
    }

    fn close(&self) {
        (**self).close()
    }
}
