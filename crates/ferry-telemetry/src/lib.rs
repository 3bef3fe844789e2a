//! # Ferry Telemetry
//!
//! Logging and metrics for the Ferry bridge.
//!
//! ## Components
//!
//! - **Logs**: `tracing` events rendered by a `tracing-subscriber` registry,
//!   human-readable or JSON.
//! - **Metrics**: Prometheus counters, gauges and histograms in a private
//!   registry, rendered with [`gather_text`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ferry_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FERRY_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `FERRY_JSON_LOGS` | `false` | Emit JSON lines instead of text |
//! | `FERRY_SERVICE_NAME` | `ferry` | Service name attached to startup logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingGuard};
pub use metrics::{
    encode_metrics, gather_text, register_metrics, HistogramTimer, MetricsHandle,
    DISPATCH_DURATION, DISPATCH_TOTAL, EVENTS_DELIVERED, EVENTS_MALFORMED, EVENT_SUBSCRIPTIONS,
    LIVE_HANDLES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Global logger already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Installs the logger and registers metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let logging = init_logging(config)?;
    Ok(TelemetryGuard {
        _logging: logging,
        _metrics: metrics,
    })
}

/// Keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

/// Structured log line with a `component` field.
///
/// ```rust,ignore
/// log_dispatch!(debug, "dispatcher", "Method dispatched", method = %name);
/// ```
#[macro_export]
macro_rules! log_dispatch {
    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Increment a counter metric.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $($label:expr),+) => {
        $metric.with_label_values(&[$($label),+]).inc()
    };
}
