// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

// --- Metric Statics ---
// Collectors are held in OnceCells and initialized exactly once by `install`.

static HOSTING_SERVERS_ACTIVE: OnceCell<IntGauge> = OnceCell::new();
static HOSTING_RESOLUTIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static HOSTING_RESOLUTION_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static HOSTING_BYTES_MATERIALIZED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

/// The Prometheus-backed metrics sink.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Runs `$body` with the collector if `install()` has been called.
/// Before installation every observation is dropped.
macro_rules! with_metric {
    ($metric:ident, |$m:ident| $body:expr) => {
        if let Some($m) = $metric.get() {
            $body;
        }
    };
}

impl HostingMetricsSink for PrometheusSink {
    fn inc_servers_active(&self) {
        with_metric!(HOSTING_SERVERS_ACTIVE, |m| m.inc());
    }
    fn dec_servers_active(&self) {
        with_metric!(HOSTING_SERVERS_ACTIVE, |m| m.dec());
    }
    fn inc_resolutions(&self, kind: &'static str, outcome: &'static str) {
        with_metric!(HOSTING_RESOLUTIONS_TOTAL, |m| m
            .with_label_values(&[kind, outcome])
            .inc());
    }
    fn observe_resolution_duration(&self, kind: &'static str, duration_secs: f64) {
        with_metric!(HOSTING_RESOLUTION_DURATION_SECONDS, |m| m
            .with_label_values(&[kind])
            .observe(duration_secs));
    }
    fn inc_bytes_materialized(&self, bytes: u64) {
        with_metric!(HOSTING_BYTES_MATERIALIZED_TOTAL, |m| m.inc_by(bytes));
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        with_metric!(ERRORS_TOTAL, |m| m.with_label_values(&[kind, variant]).inc());
    }
}

/// Initializes all Prometheus metrics collectors and returns a static reference to the sink.
///
/// Calling it more than once fails with an `AlreadyReg` error from the registry.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    let already = || prometheus::Error::Msg("prometheus sink already installed".into());

    HOSTING_SERVERS_ACTIVE
        .set(register_int_gauge!(
            "tela_hosting_servers_active",
            "Current number of active TELA hosting servers."
        )?)
        .map_err(|_| already())?;
    HOSTING_RESOLUTIONS_TOTAL
        .set(register_int_counter_vec!(
            "tela_hosting_resolutions_total",
            "Total number of finished resolutions, by kind and outcome.",
            &["kind", "outcome"]
        )?)
        .map_err(|_| already())?;
    HOSTING_RESOLUTION_DURATION_SECONDS
        .set(register_histogram_vec!(
            "tela_hosting_resolution_duration_seconds",
            "Latency of resolving content into a local file tree.",
            &["kind"],
            exponential_buckets(0.005, 2.0, 14)?
        )?)
        .map_err(|_| already())?;
    HOSTING_BYTES_MATERIALIZED_TOTAL
        .set(register_int_counter!(
            "tela_hosting_bytes_materialized_total",
            "Total bytes written to disk for materialized files."
        )?)
        .map_err(|_| already())?;
    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "tela_errors_total",
            "Total number of errors, categorized by type and variant.",
            &["kind", "variant"]
        )?)
        .map_err(|_| already())?;

    static SINK: PrometheusSink = PrometheusSink;
    Ok(&SINK)
}
