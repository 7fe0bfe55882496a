//! Prometheus metrics for tree requests.
//!
//! This module provides metrics for:
//! - Tree requests served
//! - Tree load failures, labelled by error code
//! - Tree load latency

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Tree requests counter metric name.
pub const METRIC_TREE_REQUESTS: &str = "tree_requests_total";
/// Tree load failures counter metric name.
pub const METRIC_TREE_LOAD_FAILURES: &str = "tree_load_failures_total";
/// Tree load latency metric name.
pub const METRIC_TREE_LOAD_LATENCY: &str = "tree_load_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup, after the recorder is installed.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_TREE_LOAD_LATENCY,
        "Time to read and parse the decision tree in milliseconds"
    );

    describe_counter!(
        METRIC_TREE_REQUESTS,
        "Total number of decision tree requests"
    );
    describe_counter!(
        METRIC_TREE_LOAD_FAILURES,
        "Total number of failed decision tree loads"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and describe our metrics.
///
/// Fails if a recorder is already installed for this process.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Increment tree requests counter.
pub fn inc_tree_requests() {
    counter!(METRIC_TREE_REQUESTS).increment(1);
}

/// Increment tree load failures counter.
pub fn inc_tree_load_failures(code: &'static str) {
    counter!(METRIC_TREE_LOAD_FAILURES, "code" => code).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for tree loads.
pub fn timer_tree_load() -> LatencyTimer {
    LatencyTimer::new(METRIC_TREE_LOAD_LATENCY)
}
