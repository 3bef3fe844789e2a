//! Response helpers for native cores written in Rust.
//!
//! A core must answer every call with an envelope and must never unwind
//! into the bridge. [`respond`] builds the envelope from a `Result`;
//! [`catch_panics`] turns an unwinding panic into a `panic` envelope.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use ferry_types::{DomainErrorKind, ResponseEnvelope};
use futures::FutureExt;
use serde::Serialize;

/// Failure of one native operation.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeError {
    pub kind: DomainErrorKind,
    pub message: String,
}

impl NativeError {
    pub fn new(kind: DomainErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for NativeError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(DomainErrorKind::Json, e.to_string())
    }
}

/// Envelope for the outcome of one native operation.
pub fn respond<T: Serialize>(result: Result<T, NativeError>) -> ResponseEnvelope {
    match result.and_then(|value| serde_json::to_value(value).map_err(NativeError::from)) {
        Ok(payload) => ResponseEnvelope::ok(payload),
        Err(e) => ResponseEnvelope::error(e.kind, e.message),
    }
}

/// Runs `future`, converting a panic into `panic("Internal error: <msg>")`.
pub async fn catch_panics<F>(future: F) -> ResponseEnvelope
where
    F: Future<Output = ResponseEnvelope>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            ResponseEnvelope::panic(format!("Internal error: {message}"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
