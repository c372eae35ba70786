// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling core logic from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// A lazily-initialized static reference to the global `MetricsSink` implementation.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Returns a static reference to the configured error metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Returns a static reference to the configured hosting metrics sink.
/// If no sink has been initialized, it returns a no-op sink.
pub fn hosting_metrics() -> &'static dyn HostingMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// A sink for metrics related to content resolution and hosting servers.
pub trait HostingMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments the gauge of active hosting servers.
    fn inc_servers_active(&self);
    /// Decrements the gauge of active hosting servers.
    fn dec_servers_active(&self);
    /// Increments a counter of finished resolutions, labeled by kind and outcome.
    fn inc_resolutions(&self, kind: &'static str, outcome: &'static str);
    /// Observes the duration of a resolution, labeled by kind.
    fn observe_resolution_duration(&self, kind: &'static str, duration_secs: f64);
    /// Increments the total number of bytes written to disk for materialized files.
    fn inc_bytes_materialized(&self, bytes: u64);
}
impl HostingMetricsSink for NopSink {
    fn inc_servers_active(&self) {}
    fn dec_servers_active(&self) {}
    fn inc_resolutions(&self, _kind: &'static str, _outcome: &'static str) {}
    fn observe_resolution_duration(&self, _kind: &'static str, _duration_secs: f64) {}
    fn inc_bytes_materialized(&self, _bytes: u64) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and variant.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink: HostingMetricsSink + ErrorMetricsSink {}

// Blanket implementation to allow any type that implements all sub-traits
// to be used as a `MetricsSink`.
impl<T> MetricsSink for T where T: HostingMetricsSink + ErrorMetricsSink {}
