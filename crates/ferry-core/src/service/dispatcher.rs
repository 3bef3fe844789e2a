//! Method Dispatcher
//!
//! One envelope in, one classified outcome out. No batching, request ids,
//! timeouts or retries: concurrent dispatches on one handle are issued
//! independently and serialising them is the native core's business.
//! Dropping the returned future does not stop native work already started.

use ferry_telemetry::{log_dispatch, metric_inc, time_histogram, DISPATCH_DURATION, DISPATCH_TOTAL};
use ferry_types::{classify, redact, MethodEnvelope, Outcome};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::Handle;
use crate::error::BridgeError;
use crate::service::registry::HandleRegistry;

const UTILS_ROUTE: &str = "utils";

/// Sends `method` through `handle` and classifies the response.
pub async fn dispatch(
    registry: &HandleRegistry,
    handle: &Handle,
    method: MethodEnvelope,
) -> Result<Value, BridgeError> {
    let wire = method.encode()?;
    let _guard = handle.slot.enter().await?;
    trace_request(registry, handle.kind().as_str(), &method);

    let raw = {
        let _timer = time_histogram!(DISPATCH_DURATION);
        handle.slot.core.call(handle.slot.instance, wire).await
    };
    resolve(registry, handle.kind().as_str(), method.name(), classify(&raw))
}

/// Sends a stateless utility method; no handle involved.
pub async fn dispatch_utils(
    registry: &HandleRegistry,
    method: MethodEnvelope,
) -> Result<Value, BridgeError> {
    let wire = method.encode()?;
    trace_request(registry, UTILS_ROUTE, &method);

    let raw = {
        let _timer = time_histogram!(DISPATCH_DURATION);
        registry.core().call_utils(wire).await
    };
    resolve(registry, UTILS_ROUTE, method.name(), classify(&raw))
}

/// Dispatches a value of a typed method catalogue.
pub async fn call<M: Serialize>(
    registry: &HandleRegistry,
    handle: &Handle,
    method: &M,
) -> Result<Value, BridgeError> {
    dispatch(registry, handle, MethodEnvelope::from_typed(method)?).await
}

/// Dispatches a typed method and decodes the success payload into `R`.
pub async fn call_as<M: Serialize, R: DeserializeOwned>(
    registry: &HandleRegistry,
    handle: &Handle,
    method: &M,
) -> Result<R, BridgeError> {
    decode_payload(call(registry, handle, method).await?)
}

pub(crate) fn decode_payload<R: DeserializeOwned>(value: Value) -> Result<R, BridgeError> {
    serde_json::from_value(value).map_err(|e| BridgeError::Decode(e.to_string()))
}

fn trace_request(registry: &HandleRegistry, route: &str, method: &MethodEnvelope) {
    if registry.config().log_payloads {
        log_dispatch!(
            debug,
            "dispatcher",
            "Dispatching",
            route,
            method = %method.name(),
            data = %method.redacted()
        );
    } else {
        log_dispatch!(debug, "dispatcher", "Dispatching", route, method = %method.name());
    }
}

/// Maps a classified outcome onto the caller's result.
fn resolve(
    registry: &HandleRegistry,
    route: &str,
    method: &str,
    outcome: Outcome,
) -> Result<Value, BridgeError> {
    metric_inc!(DISPATCH_TOTAL, route, outcome.label());
    match outcome {
        Outcome::Success(payload) => {
            if registry.config().log_payloads {
                log_dispatch!(
                    debug,
                    "dispatcher",
                    "Dispatch succeeded",
                    route,
                    method,
                    payload = %redact(&payload)
                );
            }
            Ok(payload)
        }
        Outcome::DomainError { kind, message } => {
            log_dispatch!(
                debug,
                "dispatcher",
                "Dispatch returned domain error",
                route,
                method,
                %kind,
                %message
            );
            Err(BridgeError::Domain { kind, message })
        }
        Outcome::Panic(message) => {
            log_dispatch!(warn, "dispatcher", "Native call panicked", route, method, %message);
            Err(BridgeError::Panic(message))
        }
        Outcome::TransportFailure(raw) => {
            log_dispatch!(
                error,
                "dispatcher",
                "Response violated the envelope contract",
                route,
                method,
                %raw
            );
            Err(BridgeError::Transport { raw })
        }
    }
}
