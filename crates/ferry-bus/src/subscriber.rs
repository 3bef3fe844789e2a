//! # Event Subscriber
//!
//! One subscription = one unbounded channel + one sequential worker task.
//!
//! ```text
//!  native thread ──PushSink──▶ mpsc ──▶ worker ──▶ callback / EventStream
//! ```
//!
//! The sink never blocks the native side. The worker decodes pushes in
//! arrival order and hands each result to the listener before taking the
//! next one, so deliveries to one listener never overlap.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use ferry_telemetry::{EVENTS_DELIVERED, EVENTS_MALFORMED, EVENT_SUBSCRIPTIONS};
use ferry_types::PushSink;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::events::{BridgeEvent, EventError, EventFilter};

/// Listener callback. Receives decoded events or delivery errors, never
/// wire text.
pub type EventCallback = Arc<dyn Fn(Result<BridgeEvent, EventError>) + Send + Sync>;

/// Unique id of one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a worker hands decoded events.
pub enum Delivery {
    Callback(EventCallback),
    Stream(mpsc::UnboundedSender<Result<BridgeEvent, EventError>>),
}

impl Delivery {
    /// Returns `false` once the listener is gone for good.
    fn deliver(&self, id: SubscriptionId, item: Result<BridgeEvent, EventError>) -> bool {
        match self {
            Self::Callback(callback) => {
                if catch_unwind(AssertUnwindSafe(|| callback(item))).is_err() {
                    error!(subscription = %id, "Event callback panicked");
                }
                true
            }
            Self::Stream(sender) => sender.send(item).is_ok(),
        }
    }
}

enum Push {
    Native(Result<String, String>),
    Close,
}

/// Worker-side options.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionOptions {
    /// Queue depth at which a backlog warning is logged.
    pub buffer_warning: usize,
}

impl Default for SubscriptionOptions {
    fn default() -> Self {
        Self {
            buffer_warning: crate::DEFAULT_EVENT_BUFFER,
        }
    }
}

/// A live subscription. Closing it stops accepting pushes; events already
/// queued are still delivered.
pub struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    sender: mpsc::UnboundedSender<Push>,
    closed: Arc<AtomicBool>,
}

impl Subscription {
    /// Starts the worker and returns the subscription plus the sink to hand
    /// to the native core. Must be called inside a tokio runtime.
    pub fn spawn(
        filter: EventFilter,
        options: SubscriptionOptions,
        delivery: Delivery,
    ) -> (Self, PushSink) {
        let id = SubscriptionId::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(AtomicUsize::new(0));

        tokio::spawn(run_worker(id, receiver, delivery, Arc::clone(&pending)));
        EVENT_SUBSCRIPTIONS.inc();

        let sink = {
            let sender = sender.clone();
            let closed = Arc::clone(&closed);
            let threshold = options.buffer_warning.max(1);
            Arc::new(move |push: Result<String, String>| {
                if closed.load(Ordering::Acquire) {
                    return;
                }
                let queued = pending.fetch_add(1, Ordering::AcqRel) + 1;
                if queued == threshold {
                    warn!(subscription = %id, queued, "Event listener is falling behind");
                }
                if sender.send(Push::Native(push)).is_err() {
                    pending.fetch_sub(1, Ordering::AcqRel);
                }
            }) as PushSink
        };

        debug!(subscription = %id, ?filter, "Subscription opened");
        (
            Self {
                id,
                filter,
                sender,
                closed,
            },
            sink,
        )
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Get the filter for this subscription.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub(crate) fn set_filter(&mut self, filter: EventFilter) {
        self.filter = filter;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stops accepting pushes. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.sender.send(Push::Close);
        EVENT_SUBSCRIPTIONS.dec();
        debug!(subscription = %self.id, "Subscription closed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_worker(
    id: SubscriptionId,
    mut receiver: mpsc::UnboundedReceiver<Push>,
    delivery: Delivery,
    pending: Arc<AtomicUsize>,
) {
    while let Some(push) = receiver.recv().await {
        let raw = match push {
            Push::Close => break,
            Push::Native(raw) => raw,
        };
        pending.fetch_sub(1, Ordering::AcqRel);

        let item = match raw {
            Ok(text) => match BridgeEvent::decode(&text) {
                Ok(event) => Ok(event),
                Err(e) => {
                    EVENTS_MALFORMED.inc();
                    warn!(subscription = %id, error = %e, "Skipping malformed event");
                    continue;
                }
            },
            Err(message) => Err(EventError::Delivery(message)),
        };

        if !delivery.deliver(id, item) {
            debug!(subscription = %id, "Event stream dropped by consumer");
            break;
        }
        EVENTS_DELIVERED.inc();
    }
    debug!(subscription = %id, "Event worker stopped");
}

/// A stream over one subscription's deliveries.
///
/// Implements `tokio_stream::Stream`; ends once the subscription is closed
/// and its queue drained.
pub struct EventStream {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<Result<BridgeEvent, EventError>>,
}

impl EventStream {
    pub(crate) fn new(
        id: SubscriptionId,
        receiver: mpsc::UnboundedReceiver<Result<BridgeEvent, EventError>>,
    ) -> Self {
        Self { id, receiver }
    }

    /// Id of the subscription feeding this stream.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Receive the next delivery. `None` once the subscription is closed.
    pub async fn recv(&mut self) -> Option<Result<BridgeEvent, EventError>> {
        self.receiver.recv().await
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream").field("id", &self.id).finish()
    }
}

impl Stream for EventStream {
    type Item = Result<BridgeEvent, EventError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Opens a stream-backed subscription.
pub fn stream_subscription(
    filter: EventFilter,
    options: SubscriptionOptions,
) -> (Subscription, PushSink, EventStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let (subscription, sink) = Subscription::spawn(filter, options, Delivery::Stream(sender));
    let stream = EventStream::new(subscription.id(), receiver);
    (subscription, sink, stream)
}
