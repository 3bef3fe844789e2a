//! Event Bridge
//!
//! Registers native listeners for a handle and wires each one to its own
//! sequential worker. Registration is additive; clearing narrows or closes
//! the matching subscriptions on both sides of the boundary.

use ferry_bus::{
    stream_subscription, Delivery, EventCallback, EventFilter, EventStream, Subscription,
    SubscriptionId,
};
use ferry_telemetry::log_dispatch;
use ferry_types::EventType;

use crate::domain::Handle;
use crate::error::BridgeError;
use crate::service::registry::HandleRegistry;

/// Delivers events of `event_types` (empty = all) on `handle` to
/// `callback`, in emission order, until cleared or destroyed.
pub async fn listen(
    registry: &HandleRegistry,
    handle: &Handle,
    event_types: Vec<EventType>,
    callback: EventCallback,
) -> Result<SubscriptionId, BridgeError> {
    let filter = EventFilter::of(event_types.clone());
    let (subscription, sink) = Subscription::spawn(
        filter,
        registry.config().subscription_options(),
        Delivery::Callback(callback),
    );
    register(handle, event_types, subscription, sink).await
}

/// Like [`listen`], but deliveries are consumed as a stream.
pub async fn subscribe(
    registry: &HandleRegistry,
    handle: &Handle,
    event_types: Vec<EventType>,
) -> Result<EventStream, BridgeError> {
    let (subscription, sink, stream) = stream_subscription(
        EventFilter::of(event_types.clone()),
        registry.config().subscription_options(),
    );
    register(handle, event_types, subscription, sink).await?;
    Ok(stream)
}

/// Removes listeners for `event_types`; an empty list removes all.
pub async fn clear_listeners(
    handle: &Handle,
    event_types: Vec<EventType>,
) -> Result<(), BridgeError> {
    let _guard = handle.slot.enter().await?;
    let _listeners = handle.slot.lock_listeners().await;
    handle
        .slot
        .core
        .clear_listeners(handle.slot.instance, event_types.clone())
        .await
        .map_err(|message| BridgeError::domain(handle.kind().error_kind(), message))?;
    let closed = handle.slot.subscriptions.clear(&event_types);
    log_dispatch!(
        debug,
        "events",
        "Listeners cleared",
        handle = %handle.id(),
        types = ?event_types,
        closed
    );
    Ok(())
}

async fn register(
    handle: &Handle,
    event_types: Vec<EventType>,
    subscription: Subscription,
    sink: ferry_types::PushSink,
) -> Result<SubscriptionId, BridgeError> {
    let _guard = handle.slot.enter().await?;
    let _listeners = handle.slot.lock_listeners().await;
    let id = subscription.id();
    handle
        .slot
        .core
        .listen(handle.slot.instance, event_types.clone(), sink)
        .await
        .map_err(|message| BridgeError::domain(handle.kind().error_kind(), message))?;
    handle.slot.subscriptions.add(subscription);
    log_dispatch!(
        debug,
        "events",
        "Listener registered",
        handle = %handle.id(),
        subscription = %id,
        types = ?event_types
    );
    Ok(id)
}
