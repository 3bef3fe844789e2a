//! # Ferry Core
//!
//! Method dispatch, handle lifecycle and event bridging between a host
//! runtime and a native domain core.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): handles and configuration
//!   - `Handle`: opaque, non-cloneable reference to a native object
//!   - `BridgeConfig`: buffer sizes, payload logging, destroy behaviour
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `BridgeApi`: Driving port (inbound API)
//!   - `NativeCore`: Driven port, implemented by the domain core
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `HandleRegistry`: create / derive / destroy, at most one destroy
//!   - `dispatcher`: encode, call, classify, resolve
//!   - `accounts`: per-account multiplexing over a wallet handle
//!   - `events`: listener registration and clearing
//!   - `Bridge`: implements `BridgeApi`
//!
//! - **Adapters Layer** (`adapters/`): `InMemoryCore` and response helpers
//!
//! ## Invariants
//!
//! - A destroyed handle never reaches the native core again.
//! - Every dispatch resolves to exactly one of success, domain error,
//!   panic or transport failure.
//! - Destroy waits for calls already in flight on the handle.
//! - Events for one subscription are delivered in push order.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ferry_core::{Bridge, InMemoryCore};
//! use ferry_types::{AccountMethod, EventType, WalletMethod};
//! use std::sync::Arc;
//!
//! let bridge = Bridge::new(Arc::new(InMemoryCore::new()));
//! let wallet = bridge.create_wallet(&serde_json::json!({})).await?;
//! bridge.call(&wallet, &WalletMethod::CreateAccount { alias: None }).await?;
//!
//! let balance = bridge.account(&wallet, 0u32).call(&AccountMethod::GetBalance).await?;
//!
//! let mut events = bridge.subscribe(&wallet, vec![EventType::NewOutput]).await?;
//! bridge.destroy(&wallet).await?;
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{catch_panics, respond, InMemoryCore, NativeError, TRIGGER_PANIC};
pub use domain::{BridgeConfig, Handle};
pub use error::BridgeError;
pub use ports::{BridgeApi, NativeCore, PushSink};
pub use service::{Account, Bridge, HandleRegistry};

pub use ferry_bus::{
    BridgeEvent, EventCallback, EventError, EventFilter, EventStream, SubscriptionId,
};
pub use ferry_types::{AccountId, DomainErrorKind, EventType, HandleKind, Outcome};
