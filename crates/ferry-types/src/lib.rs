//! # Ferry Types
//!
//! Wire-level vocabulary shared by every Ferry crate.
//!
//! ## Contents
//!
//! - **Envelopes**: `MethodEnvelope` (`{name, data?}`) going into the native
//!   core and `ResponseEnvelope` (`{type, payload}`) coming back.
//! - **Numeric fidelity**: `serde_with` adapters that keep u64 / U256 amounts
//!   and token maps exact across JSON.
//! - **Outcome**: the four-way classification of a raw response.
//! - **Native port**: the `NativeCore` trait a domain core implements.
//!
//! Nothing in here performs I/O. The dispatcher and event bridge live in
//! `ferry-core` and `ferry-bus`.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod account;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod handle;
pub mod methods;
pub mod native;
pub mod numeric;
pub mod outcome;

pub use account::{AccountBalance, AccountId, AccountInfo, AccountMethodCall, BaseCoinBalance};
pub use envelope::{redact, MethodEnvelope, ResponseEnvelope, REDACTED, SECRET_KEYS};
pub use errors::{CodecError, DomainErrorKind};
pub use events::EventType;
pub use handle::{HandleId, HandleKind, InstanceId};
pub use methods::{AccountMethod, ClientMethod, SecretManagerMethod, UtilsMethod, WalletMethod};
pub use native::{NativeCore, PushSink};
pub use numeric::{PairList, TokenAmounts, U256Hex, U64String};
pub use outcome::{classify, unwrap_encoded, Outcome};

/// Re-exported so downstream crates agree on one 256-bit integer type.
pub use primitive_types::U256;

/// Method name the account multiplexer wraps account calls in.
pub const CALL_ACCOUNT_METHOD: &str = "callAccountMethod";
