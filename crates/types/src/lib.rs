// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # TELA Types
//!
//! This crate is the foundational library for TELA hosting, containing the
//! content data model, the header keys stored on TELA smart contracts, the
//! daemon RPC wire types, configuration objects and all error types.
//!
//! ## Architectural Role
//!
//! As the base crate, `tela-types` has minimal dependencies and is itself a
//! dependency for every other crate in the workspace. This prevents circular
//! dependencies and provides a single canonical definition for shared types
//! like `Document`, `Index`, `TreeClone` and `ServerInfo`.

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::TelaError> = std::result::Result<T, E>;

/// Content data structures: documents, indexes, clones and server identities.
pub mod app;
/// Hosting configuration (`HostConfig`) and its defaults.
pub mod config;
/// A unified set of all error types used across the workspace.
pub mod error;
/// Well-known variable keys stored on TELA smart contracts.
pub mod keys;
/// JSON-RPC request and response shapes of the ledger daemon.
pub mod rpc;
