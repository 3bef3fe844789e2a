//! Bridge configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use ferry_core::BridgeConfig;
//!
//! let config = BridgeConfig::from_env()
//!     .with_log_payloads(true)
//!     .with_event_buffer(256);
//! config.validate()?;
//! ```

use std::env;

use ferry_bus::{SubscriptionOptions, DEFAULT_EVENT_BUFFER};
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Bridge configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Queued events per subscription before a backlog warning
    pub event_buffer: usize,
    /// Include (redacted) method data and responses in debug logs
    pub log_payloads: bool,
    /// Clear native listeners before freeing a root handle
    pub destroy_clears_listeners: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            event_buffer: DEFAULT_EVENT_BUFFER,
            log_payloads: false,
            destroy_clears_listeners: true,
        }
    }
}

impl BridgeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FERRY_EVENT_BUFFER`: backlog warning threshold (default: 1000)
    /// - `FERRY_LOG_PAYLOADS`: log redacted payloads (default: false)
    /// - `FERRY_DESTROY_CLEARS_LISTENERS`: clear listeners on destroy (default: true)
    pub fn from_env() -> Self {
        Self {
            event_buffer: env::var("FERRY_EVENT_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EVENT_BUFFER),

            log_payloads: env::var("FERRY_LOG_PAYLOADS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),

            destroy_clears_listeners: env::var("FERRY_DESTROY_CLEARS_LISTENERS")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.event_buffer == 0 {
            return Err(BridgeError::Config(
                "event_buffer cannot be 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Builder-style method to set the event backlog threshold
    #[must_use]
    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer;
        self
    }

    /// Builder-style method to toggle payload logging
    #[must_use]
    pub fn with_log_payloads(mut self, log_payloads: bool) -> Self {
        self.log_payloads = log_payloads;
        self
    }

    /// Builder-style method to toggle listener clearing on destroy
    #[must_use]
    pub fn with_destroy_clears_listeners(mut self, clear: bool) -> Self {
        self.destroy_clears_listeners = clear;
        self
    }

    pub(crate) fn subscription_options(&self) -> SubscriptionOptions {
        SubscriptionOptions {
            buffer_warning: self.event_buffer,
        }
    }
}
