//! # Native Core Port
//!
//! The boundary to the domain core. Everything crossing it is string-shaped:
//! method envelopes go in as JSON text, responses come back as
//! `ResponseEnvelope` text, pushed events arrive as JSON text.
//!
//! Implementors must honour the response contract: `call` returns an `ok`,
//! `error` or `panic` envelope and never unwinds into the caller.

use std::sync::Arc;

use async_trait::async_trait;

use crate::events::EventType;
use crate::handle::{HandleKind, InstanceId};

/// Delivery callback handed to `NativeCore::listen`.
///
/// `Ok` carries one pushed event as JSON text; `Err` carries a delivery error
/// reported by the core (for example a dropped MQTT connection).
pub type PushSink = Arc<dyn Fn(Result<String, String>) + Send + Sync>;

/// Native domain core reached through the bridge.
#[async_trait]
pub trait NativeCore: Send + Sync {
    /// Creates a root object from opaque JSON options.
    async fn create(&self, kind: HandleKind, options: String) -> Result<InstanceId, String>;

    /// Returns an object owned by `parent` (a wallet's client or secret manager).
    async fn derive(&self, parent: InstanceId, kind: HandleKind) -> Result<InstanceId, String>;

    /// Executes one method envelope; returns response envelope text.
    async fn call(&self, instance: InstanceId, method: String) -> String;

    /// Executes a stateless utility method; returns response envelope text.
    async fn call_utils(&self, method: String) -> String;

    /// Registers `sink` for `event_types` (empty means every type).
    async fn listen(
        &self,
        instance: InstanceId,
        event_types: Vec<EventType>,
        sink: PushSink,
    ) -> Result<(), String>;

    /// Drops listeners for `event_types` (empty means all).
    async fn clear_listeners(
        &self,
        instance: InstanceId,
        event_types: Vec<EventType>,
    ) -> Result<(), String>;

    /// Frees the native object.
    async fn destroy(&self, instance: InstanceId) -> Result<(), String>;
}
