//! Domain layer: configuration and handle state. No native calls happen
//! here.

pub mod config;
pub mod handle;

pub use config::BridgeConfig;
pub use handle::Handle;
