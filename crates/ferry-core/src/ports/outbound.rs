//! Outbound Ports (Driven Ports)
//!
//! The bridge depends on exactly one external component: the native domain
//! core. Its trait lives in `ferry-types` so that cores can be implemented
//! without depending on the bridge.

pub use ferry_types::{NativeCore, PushSink};
