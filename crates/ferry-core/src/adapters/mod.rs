//! Adapters Layer
//!
//! - `responder`: envelope helpers for cores written in Rust
//! - `in_memory`: `InMemoryCore`, a process-local reference core

pub mod in_memory;
pub mod responder;

pub use in_memory::{InMemoryCore, TRIGGER_PANIC};
pub use responder::{catch_panics, respond, NativeError};
