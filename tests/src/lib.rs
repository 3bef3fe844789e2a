//! # Ferry Test Suite
//!
//! Cross-crate scenarios run against `InMemoryCore`.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── lifecycle.rs   # create, derive, destroy, drop
//!     ├── dispatch.rs    # outcomes, utils, numeric fidelity
//!     ├── accounts.rs    # account multiplexing
//!     └── events.rs      # listeners, streams, MQTT topics
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ferry-tests
//! cargo test -p ferry-tests integration::events::
//! ```

pub mod integration;
