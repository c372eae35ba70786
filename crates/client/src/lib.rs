// Path: crates/client/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # TELA Client
//!
//! Provides the HTTP JSON-RPC implementation of `LedgerClient`.

pub mod rpc_client;

pub use rpc_client::RpcClient;
