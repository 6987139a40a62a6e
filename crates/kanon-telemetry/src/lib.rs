//! Structured logging and binding metrics for Kanon.
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, JSON or pretty
//!   output on stderr
//! - **Metrics**: Prometheus-format counters via the `metrics` crate
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `kanon_bindings_total` | Counter | `endpoint`, `outcome` | Binding attempts |
//! | `kanon_validation_errors_total` | Counter | `endpoint`, `kind` | Validation errors |
//!
//! ```text
//! # TYPE kanon_bindings_total counter
//! kanon_bindings_total{endpoint="read_item",outcome="bound"} 1234
//! kanon_bindings_total{endpoint="read_item",outcome="rejected"} 56
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use kanon_telemetry::{init_telemetry, LogConfig, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .logging(LogConfig::development())
//!     .build();
//! init_telemetry(&config)?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{
    init_metrics, record_binding, record_validation_error, render_metrics, MetricsConfig,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
