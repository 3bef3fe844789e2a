//! Identifiers for native objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainErrorKind;

/// The three native object families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HandleKind {
    Client,
    Wallet,
    SecretManager,
}

impl HandleKind {
    /// Error family reported for failures on this kind of handle.
    pub fn error_kind(self) -> DomainErrorKind {
        match self {
            Self::Client => DomainErrorKind::Client,
            Self::Wallet => DomainErrorKind::Wallet,
            Self::SecretManager => DomainErrorKind::SecretManager,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Wallet => "wallet",
            Self::SecretManager => "secretManager",
        }
    }
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-side registry slot id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Native-side object id handed out by a `NativeCore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}
