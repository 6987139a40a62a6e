//! Prometheus metrics for Kanon.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `kanon_bindings_total` | Counter | `endpoint`, `outcome` | Binding attempts |
//! | `kanon_validation_errors_total` | Counter | `endpoint`, `kind` | Reported validation errors |
//!
//! Recording functions go through the `metrics` facade and are no-ops until
//! a recorder is installed with [`init_metrics`].

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Counter of binding attempts.
pub const BINDINGS_TOTAL: &str = "kanon_bindings_total";

/// Counter of reported validation errors.
pub const VALIDATION_ERRORS_TOTAL: &str = "kanon_validation_errors_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Installs the global Prometheus recorder.
///
/// Calling it again after a successful install is a no-op.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if another recorder is installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();
    Ok(())
}

/// Renders metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(BINDINGS_TOTAL, "Binding attempts by endpoint and outcome");
    describe_counter!(
        VALIDATION_ERRORS_TOTAL,
        "Validation errors reported by endpoint and kind"
    );
}

/// Records one binding attempt.
///
/// # Arguments
///
/// * `endpoint` - The endpoint (operation) name
/// * `bound` - Whether every parameter validated
pub fn record_binding(endpoint: &str, bound: bool) {
    counter!(
        BINDINGS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "outcome" => if bound { "bound" } else { "rejected" }
    )
    .increment(1);
}

/// Records one reported validation error.
///
/// # Arguments
///
/// * `endpoint` - The endpoint (operation) name
/// * `kind` - Machine-readable error kind (e.g., "missing", "type_mismatch")
pub fn record_validation_error(endpoint: &str, kind: &str) {
    counter!(
        VALIDATION_ERRORS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}
