// Path: crates/core/src/lib.rs
#![forbid(unsafe_code)]
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

//! # TELA Core
//!
//! Turns TELA content published on the ledger into local file trees and
//! serves them over HTTP.
//!
//! Leaves first: the [`validator`] checks contract code against the canonical
//! templates, the [`locator`] reads contract state, the [`resolver`] walks an
//! index's reference graph onto disk, the [`registry`] hosts resolved trees,
//! and [`link`] dereferences `open://` links against the registry.

/// Resolves `open://<scid>/...` links to running servers.
pub mod link;
/// Reads documents, indexes, code and single variables from the ledger.
pub mod locator;
/// A minimal line-numbered contract tokenizer implementing `ContractParser`.
pub mod parser;
/// Table of active hosting servers, port allocation and teardown.
pub mod registry;
/// Materializes documents and index graphs onto disk.
pub mod resolver;
/// The canonical TELA contract templates, per version.
pub mod templates;
/// Structural comparison of contracts against the templates.
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use link::{parse_link, resolve_link};
pub use locator::{Locator, Probe};
pub use parser::BasicParser;
pub use registry::Registry;
pub use resolver::{Resolver, Revision};
