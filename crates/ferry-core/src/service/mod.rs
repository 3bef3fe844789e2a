//! Service Layer
//!
//! Orchestrates handle lifecycle, dispatch and event registration against
//! the injected `NativeCore`.

pub mod accounts;
pub mod bridge;
pub mod dispatcher;
pub mod events;
pub mod registry;

pub use accounts::Account;
pub use bridge::Bridge;
pub use registry::HandleRegistry;
