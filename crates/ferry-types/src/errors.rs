//! # Error Types
//!
//! Codec failures and the domain error vocabulary carried inside `error`
//! responses.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or decoding wire values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A typed method value could not be serialized.
    #[error("Failed to encode method {method}: {reason}")]
    Encode { method: String, reason: String },

    /// A serialized method value is not shaped like `{name, data?}`.
    #[error("Not a method envelope: {0}")]
    NotAnEnvelope(String),

    /// Response text is not a `{type, payload}` envelope.
    #[error("Malformed response envelope: {0}")]
    MalformedResponse(String),

    /// Amount text is neither decimal nor `0x` hex, or overflows.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// The `type` field of an `error` response payload.
///
/// Known kinds map to the native core's error families; anything else is
/// preserved verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DomainErrorKind {
    Client,
    Wallet,
    SecretManager,
    Block,
    Utils,
    Json,
    Unknown,
    Other(String),
}

impl DomainErrorKind {
    /// Wire spelling of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Client => "client",
            Self::Wallet => "wallet",
            Self::SecretManager => "secretManager",
            Self::Block => "block",
            Self::Utils => "utils",
            Self::Json => "json",
            Self::Unknown => "unknown",
            Self::Other(kind) => kind,
        }
    }
}

impl From<&str> for DomainErrorKind {
    fn from(kind: &str) -> Self {
        match kind {
            "client" => Self::Client,
            "wallet" => Self::Wallet,
            "secretManager" => Self::SecretManager,
            "block" => Self::Block,
            "utils" => Self::Utils,
            "json" => Self::Json,
            "unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for DomainErrorKind {
    fn from(kind: String) -> Self {
        Self::from(kind.as_str())
    }
}

impl From<DomainErrorKind> for String {
    fn from(kind: DomainErrorKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for DomainErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
