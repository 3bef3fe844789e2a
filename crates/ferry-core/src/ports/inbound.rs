//! Inbound Ports (Driving Ports)
//!
//! The API callers use to talk to a native core through the bridge.

use async_trait::async_trait;
use ferry_bus::{EventCallback, EventStream, SubscriptionId};
use ferry_types::{AccountId, EventType, HandleKind, MethodEnvelope};
use serde_json::Value;

use crate::domain::Handle;
use crate::error::BridgeError;

/// Primary bridge API (Driving Port)
#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// Create a native object from opaque JSON options.
    async fn create(&self, kind: HandleKind, options: &Value) -> Result<Handle, BridgeError>;

    /// Free the native object behind `handle`. Repeated calls are a no-op.
    async fn destroy(&self, handle: &Handle) -> Result<(), BridgeError>;

    /// Whether calls through `handle` can still succeed.
    fn is_valid(&self, handle: &Handle) -> bool;

    /// Send one method through `handle` and return its success payload.
    async fn dispatch(&self, handle: &Handle, method: MethodEnvelope) -> Result<Value, BridgeError>;

    /// Send one stateless utility method.
    async fn dispatch_utils(&self, method: MethodEnvelope) -> Result<Value, BridgeError>;

    /// Send `inner` to one account of the wallet behind `wallet`.
    async fn dispatch_account_method(
        &self,
        wallet: &Handle,
        account_id: AccountId,
        inner: MethodEnvelope,
    ) -> Result<Value, BridgeError>;

    /// Deliver events of `event_types` (empty = all) to `callback`.
    async fn listen(
        &self,
        handle: &Handle,
        event_types: Vec<EventType>,
        callback: EventCallback,
    ) -> Result<SubscriptionId, BridgeError>;

    /// Deliver events of `event_types` (empty = all) as a stream.
    async fn subscribe(
        &self,
        handle: &Handle,
        event_types: Vec<EventType>,
    ) -> Result<EventStream, BridgeError>;

    /// Remove listeners for `event_types` (empty = all).
    async fn clear_listeners(
        &self,
        handle: &Handle,
        event_types: Vec<EventType>,
    ) -> Result<(), BridgeError>;
}
