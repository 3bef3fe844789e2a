//! # Outcome Classification
//!
//! Every raw response is mapped to exactly one of four outcomes:
//!
//! | Outcome            | Source                                   |
//! |--------------------|------------------------------------------|
//! | `Success`          | `{"type":"ok"}`                          |
//! | `DomainError`      | `{"type":"error"}`                       |
//! | `Panic`            | `{"type":"panic"}`                       |
//! | `TransportFailure` | anything that is not a response envelope |
//!
//! Classification is total: it never returns an error.
//!
//! Some native paths serialize their payload twice, so a payload may arrive
//! as a JSON string holding JSON text. Such strings are decoded exactly once
//! and only when they look like an object or array; deeper nesting is left
//! alone.

use serde_json::Value;

use crate::envelope::ResponseEnvelope;
use crate::errors::DomainErrorKind;

/// Classified response.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    DomainError { kind: DomainErrorKind, message: String },
    Panic(String),
    /// The native side broke the envelope contract; carries the raw text.
    TransportFailure(String),
}

impl Outcome {
    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "ok",
            Self::DomainError { .. } => "error",
            Self::Panic(_) => "panic",
            Self::TransportFailure(_) => "transport",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Classifies raw response text.
pub fn classify(raw: &str) -> Outcome {
    match ResponseEnvelope::decode(raw) {
        Ok(ResponseEnvelope::Ok(payload)) => Outcome::Success(unwrap_encoded(payload)),
        Ok(ResponseEnvelope::Panic(message)) => Outcome::Panic(message),
        Ok(ResponseEnvelope::Error(payload)) => {
            let (kind, message) = error_parts(unwrap_encoded(payload));
            Outcome::DomainError { kind, message }
        }
        Err(_) => Outcome::TransportFailure(raw.to_string()),
    }
}

/// Decodes a string holding object/array JSON text one level. Any other
/// value is returned unchanged.
#[must_use]
pub fn unwrap_encoded(value: Value) -> Value {
    match value {
        Value::String(text) => {
            let trimmed = text.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                match serde_json::from_str::<Value>(&text) {
                    Ok(inner @ (Value::Object(_) | Value::Array(_))) => inner,
                    _ => Value::String(text),
                }
            } else {
                Value::String(text)
            }
        }
        other => other,
    }
}

fn error_parts(payload: Value) -> (DomainErrorKind, String) {
    match payload {
        Value::Object(mut object) => {
            let kind = object
                .get("type")
                .and_then(Value::as_str)
                .map(DomainErrorKind::from);
            match (kind, object.remove("error")) {
                (Some(kind), Some(Value::String(message))) => (kind, message),
                (Some(kind), Some(other)) => (kind, other.to_string()),
                (kind, error) => {
                    if let Some(error) = error {
                        object.insert("error".into(), error);
                    }
                    (
                        kind.unwrap_or(DomainErrorKind::Unknown),
                        Value::Object(object).to_string(),
                    )
                }
            }
        }
        Value::String(message) => (DomainErrorKind::Unknown, message),
        other => (DomainErrorKind::Unknown, other.to_string()),
    }
}
