//! Error types for the bridge

use ferry_types::{CodecError, DomainErrorKind, HandleKind};
use thiserror::Error;

/// Errors returned to callers of the bridge.
///
/// `Domain`, `Panic` and `Transport` mirror the classified outcome of a
/// native call; the rest are raised on the caller side before or after the
/// boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("{kind} error: {message}")]
    Domain {
        kind: DomainErrorKind,
        message: String,
    },

    /// The native call faulted. Only that call is affected.
    #[error("Native panic: {0}")]
    Panic(String),

    /// The native side answered with something that is not an envelope.
    #[error("Transport failure: unexpected response {raw}")]
    Transport { raw: String },

    #[error("Encode error: {0}")]
    Encode(#[from] CodecError),

    /// A success payload did not match the requested result type.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn domain(kind: DomainErrorKind, message: impl Into<String>) -> Self {
        Self::Domain {
            kind,
            message: message.into(),
        }
    }

    /// Error for a call through a destroyed handle.
    pub fn destroyed(kind: HandleKind) -> Self {
        Self::domain(kind.error_kind(), format!("{kind} got destroyed"))
    }

    /// Domain error family, if the error has one. Encode and decode
    /// failures report as `json`.
    pub fn kind(&self) -> Option<DomainErrorKind> {
        match self {
            Self::Domain { kind, .. } => Some(kind.clone()),
            Self::Encode(_) | Self::Decode(_) => Some(DomainErrorKind::Json),
            Self::Panic(_) | Self::Transport { .. } | Self::Config(_) => None,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }
}
