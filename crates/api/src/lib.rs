// Path: crates/api/src/lib.rs

//! # TELA API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # TELA API
//!
//! Core traits at the seams of TELA hosting. The resolver and the server
//! registry only see a [`ledger::LedgerClient`] and a
//! [`contract::ContractParser`], so both can be swapped for mocks in tests.

/// The parsed contract model and the `ContractParser` trait.
pub mod contract;
/// Defines the `LedgerClient` trait for reading contract state from the daemon.
pub mod ledger;

