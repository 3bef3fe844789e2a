//! Ports Layer
//!
//! - Driving Port (inbound): `BridgeApi`, used by callers
//! - Driven Port (outbound): `NativeCore`, implemented by domain cores

pub mod inbound;
pub mod outbound;

pub use inbound::BridgeApi;
pub use outbound::{NativeCore, PushSink};
