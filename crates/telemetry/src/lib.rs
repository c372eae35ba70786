// Path: crates/telemetry/src/lib.rs
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

//! # TELA Telemetry
//!
//! Logging setup and hosting metrics. Instrumented code reports through the
//! sink traits; the CLI decides whether a Prometheus backend is installed.

/// `/metrics` and `/healthz` over axum.
pub mod http;
/// Global `tracing` subscriber setup.
pub mod init;
/// Prometheus-backed sink.
pub mod prometheus;
/// Sink traits for server, resolution and error metrics.
pub mod sinks;
/// Drop guard that records resolution durations.
pub mod time;

pub use sinks::{error_metrics, hosting_metrics};
