//! # Bridge Events
//!
//! Decoded form of the JSON text a native core pushes to a listener.
//!
//! Two push shapes are understood:
//!
//! ```json
//! { "accountIndex": 0, "event": { "type": "NewOutput", ... } }
//! { "topic": "milestones/confirmed", "payload": "<json text>" }
//! ```
//!
//! Wallet event `type` may be the PascalCase name or its numeric wire code.
//! MQTT payloads arrive serialized twice and are decoded exactly once here.

use std::collections::BTreeSet;

use ferry_types::EventType;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced to a listener instead of an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Pushed text could not be decoded into a `BridgeEvent`.
    #[error("Malformed event: {0}")]
    Malformed(String),

    /// The native core reported a delivery failure on this subscription.
    #[error("Event delivery failed: {0}")]
    Delivery(String),
}

/// A wallet state change scoped to one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletEvent {
    pub account_index: u32,
    pub event_type: EventType,
    /// Event body without its `type` field.
    pub payload: Value,
}

/// A message received on an MQTT topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicMessage {
    pub topic: String,
    pub payload: Value,
}

/// Event delivered to listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BridgeEvent {
    Wallet(WalletEvent),
    Mqtt(TopicMessage),
}

impl BridgeEvent {
    /// The type this event is filtered by.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Wallet(event) => event.event_type.clone(),
            Self::Mqtt(message) => EventType::Topic(message.topic.clone()),
        }
    }

    /// Decodes one pushed event.
    pub fn decode(raw: &str) -> Result<Self, EventError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| EventError::Malformed(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(EventError::Malformed("event is not an object".into()));
        };

        if let Some(topic) = object.remove("topic") {
            let Value::String(topic) = topic else {
                return Err(EventError::Malformed("topic is not a string".into()));
            };
            let payload = match object.remove("payload") {
                Some(Value::String(text)) => {
                    serde_json::from_str(&text).unwrap_or(Value::String(text))
                }
                Some(other) => other,
                None => Value::Null,
            };
            return Ok(Self::Mqtt(TopicMessage { topic, payload }));
        }

        let account_index = object
            .get("accountIndex")
            .and_then(Value::as_u64)
            .and_then(|index| u32::try_from(index).ok())
            .ok_or_else(|| EventError::Malformed("missing accountIndex".into()))?;
        let Some(Value::Object(mut body)) = object.remove("event") else {
            return Err(EventError::Malformed("missing event body".into()));
        };
        let event_type = match body.remove("type") {
            Some(Value::String(name)) => Some(EventType::from(name)).filter(|t| !t.is_topic()),
            Some(Value::Number(code)) => code.as_u64().and_then(EventType::from_code),
            _ => None,
        }
        .ok_or_else(|| EventError::Malformed("unknown wallet event type".into()))?;

        Ok(Self::Wallet(WalletEvent {
            account_index,
            event_type,
            payload: Value::Object(body),
        }))
    }
}

/// Filter for event subscriptions.
///
/// An empty `include` set means every type. `exclude` only grows when
/// specific types are cleared from an all-types subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Types to include. Empty means all types.
    pub include: BTreeSet<EventType>,
    /// Types removed from an all-types filter.
    pub exclude: BTreeSet<EventType>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific types. An empty list accepts all.
    #[must_use]
    pub fn of(types: impl IntoIterator<Item = EventType>) -> Self {
        Self {
            include: types.into_iter().collect(),
            exclude: BTreeSet::new(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.include.is_empty()
    }

    /// Check if an event type passes this filter. Topic entries may use
    /// MQTT `+` / `#` wildcards.
    #[must_use]
    pub fn matches(&self, event_type: &EventType) -> bool {
        if self.exclude.contains(event_type) {
            return false;
        }
        self.include.is_empty()
            || self.include.iter().any(|wanted| match (wanted, event_type) {
                (EventType::Topic(filter), EventType::Topic(topic)) => topic_matches(filter, topic),
                (wanted, actual) => wanted == actual,
            })
    }

    /// The filter left after clearing `types`, or `None` if nothing is left.
    /// Clearing an empty list clears everything.
    #[must_use]
    pub fn without(&self, types: &[EventType]) -> Option<Self> {
        if types.is_empty() {
            return None;
        }
        let mut remaining = self.clone();
        if remaining.include.is_empty() {
            remaining.exclude.extend(types.iter().cloned());
            let all_wallet_cleared = EventType::WALLET
                .iter()
                .all(|wallet| remaining.exclude.contains(wallet));
            (!all_wallet_cleared).then_some(remaining)
        } else {
            for event_type in types {
                remaining.include.remove(event_type);
            }
            (!remaining.include.is_empty()).then_some(remaining)
        }
    }
}

/// MQTT topic filter matching: `+` spans one level, a trailing `#` spans the
/// rest (including none).
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut levels = topic.split('/');
    for part in filter.split('/') {
        if part == "#" {
            return true;
        }
        match levels.next() {
            Some(level) if part == "+" || part == level => {}
            _ => return false,
        }
    }
    levels.next().is_none()
}
