//! # Ferry Bus - Native Event Bridge
//!
//! Turns push-style callbacks from a native core into ordered deliveries to
//! caller listeners.
//!
//! ```text
//! ┌──────────────┐   PushSink(text)   ┌──────────────┐   decoded    ┌──────────┐
//! │ Native core  │ ─────────────────▶ │ mpsc worker  │ ───────────▶ │ listener │
//! └──────────────┘                    └──────────────┘              └──────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Emission order is preserved per subscription.
//! - A malformed push is logged and skipped; the subscription survives.
//! - Registration is additive; an empty type list means every type, both
//!   for listening and for clearing.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod listeners;
pub mod subscriber;

pub use events::{topic_matches, BridgeEvent, EventError, EventFilter, TopicMessage, WalletEvent};
pub use listeners::SubscriptionSet;
pub use subscriber::{
    stream_subscription, Delivery, EventCallback, EventStream, Subscription, SubscriptionId,
    SubscriptionOptions,
};

/// Queued events per subscription before a backlog warning is logged.
pub const DEFAULT_EVENT_BUFFER: usize = 1000;
