//! Telemetry configuration from environment variables or JSON.

use std::env;

use serde::{Deserialize, Serialize};

use crate::TelemetryError;

/// Configuration for logging output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error, or a directive list)
    pub log_level: String,

    /// Whether to write log lines at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ferry".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FERRY_SERVICE_NAME`: Service name (default: ferry)
    /// - `FERRY_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `FERRY_CONSOLE_OUTPUT`: Enable log output (default: true)
    /// - `FERRY_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("FERRY_SERVICE_NAME").unwrap_or_else(|_| "ferry".to_string()),

            log_level: env::var("FERRY_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("FERRY_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("FERRY_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Parses a logger configuration handed over as JSON text. Missing
    /// fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, TelemetryError> {
        serde_json::from_str(text).map_err(|e| TelemetryError::Config(e.to_string()))
    }
}
