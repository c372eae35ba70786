// Path: crates/telemetry/src/time.rs
use crate::sinks::HostingMetricsSink;
use std::time::Instant;

/// Observes the lifetime of a resolution when dropped.
pub struct Timer<'a> {
    sink: &'a dyn HostingMetricsSink,
    kind: &'static str,
    start: Instant,
}

impl<'a> Timer<'a> {
    /// Starts timing a resolution of `kind`.
    pub fn new(sink: &'a dyn HostingMetricsSink, kind: &'static str) -> Self {
        Self {
            sink,
            kind,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_resolution_duration(self.kind, self.start.elapsed().as_secs_f64());
    }
}
