//! Event type vocabulary accepted by `listen` / `clearListeners`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A wallet event type or a free-form MQTT topic.
///
/// Wallet variants use their PascalCase names on the wire; any other string
/// is treated as a topic and passed through unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    ConsolidationRequired,
    LedgerAddressGeneration,
    NewOutput,
    SpentOutput,
    TransactionInclusion,
    TransactionProgress,
    Topic(String),
}

impl EventType {
    /// Wallet event types in their numeric wire order.
    pub const WALLET: [EventType; 6] = [
        Self::ConsolidationRequired,
        Self::LedgerAddressGeneration,
        Self::NewOutput,
        Self::SpentOutput,
        Self::TransactionInclusion,
        Self::TransactionProgress,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::ConsolidationRequired => "ConsolidationRequired",
            Self::LedgerAddressGeneration => "LedgerAddressGeneration",
            Self::NewOutput => "NewOutput",
            Self::SpentOutput => "SpentOutput",
            Self::TransactionInclusion => "TransactionInclusion",
            Self::TransactionProgress => "TransactionProgress",
            Self::Topic(topic) => topic,
        }
    }

    /// Wallet event type for a numeric wire code.
    pub fn from_code(code: u64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::WALLET.get(index).cloned())
    }

    pub fn is_topic(&self) -> bool {
        matches!(self, Self::Topic(_))
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::WALLET
            .iter()
            .find(|known| known.as_str() == name)
            .cloned()
            .unwrap_or_else(|| Self::Topic(name.to_string()))
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
