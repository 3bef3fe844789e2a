//! # Envelopes
//!
//! `MethodEnvelope` is the single request shape sent into the native core:
//!
//! ```json
//! { "name": "getBalance", "data": { ... } }
//! ```
//!
//! `ResponseEnvelope` is the single response shape coming back:
//!
//! ```json
//! { "type": "ok",    "payload": <value> }
//! { "type": "error", "payload": { "type": "wallet", "error": "..." } }
//! { "type": "panic", "payload": "Internal error: ..." }
//! ```
//!
//! Secret-bearing fields are never rendered by `Debug`; see [`redact`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CodecError, DomainErrorKind};

/// Placeholder rendered instead of a secret value.
pub const REDACTED: &str = "<omitted>";

/// Object keys whose values are replaced by [`REDACTED`] in logs.
pub const SECRET_KEYS: &[&str] = &[
    "password",
    "currentPassword",
    "newPassword",
    "mnemonic",
    "secretManager",
    "privateKey",
];

/// One invocable operation. Built fresh per call and never mutated after
/// construction.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodEnvelope {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl MethodEnvelope {
    /// Envelope for a method without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }

    /// Attaches the method parameters.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Converts a value of a closed method catalogue (a serde enum tagged
    /// with `name` and content `data`) into an envelope.
    pub fn from_typed<M: Serialize>(method: &M) -> Result<Self, CodecError> {
        let value = serde_json::to_value(method).map_err(|e| CodecError::Encode {
            method: std::any::type_name::<M>().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Validates an already-built JSON tree as an envelope.
    pub fn from_value(value: Value) -> Result<Self, CodecError> {
        let Value::Object(mut object) = value else {
            return Err(CodecError::NotAnEnvelope(value.to_string()));
        };
        if object.keys().any(|key| key != "name" && key != "data") {
            return Err(CodecError::NotAnEnvelope(Value::Object(object).to_string()));
        }
        let name = match object.remove("name") {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => return Err(CodecError::NotAnEnvelope(Value::Object(object).to_string())),
        };
        let data = object.remove("data");
        Ok(Self { name, data })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Consumes the envelope, yielding its JSON tree.
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut object = Map::new();
        object.insert("name".into(), Value::String(self.name));
        if let Some(data) = self.data {
            object.insert("data".into(), data);
        }
        Value::Object(object)
    }

    /// Wire text sent across the boundary.
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::Encode {
            method: self.name.clone(),
            reason: e.to_string(),
        })
    }

    /// JSON tree with secret fields replaced, safe for logs.
    #[must_use]
    pub fn redacted(&self) -> Value {
        redact(&self.clone().into_value())
    }
}

impl fmt::Debug for MethodEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEnvelope")
            .field("name", &self.name)
            .field("data", &self.data.as_ref().map(redact))
            .finish()
    }
}

/// Returns a copy of `value` with every [`SECRET_KEYS`] entry replaced.
#[must_use]
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, inner)| {
                    let rendered = if SECRET_KEYS.contains(&key.as_str()) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(inner)
                    };
                    (key.clone(), rendered)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Structural response from the native core, before classification.
///
/// `Error` keeps its payload as a raw tree; normalising it into a kind and
/// message is the classifier's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ResponseEnvelope {
    Ok(Value),
    Error(Value),
    Panic(String),
}

impl ResponseEnvelope {
    #[must_use]
    pub fn ok(payload: Value) -> Self {
        Self::Ok(payload)
    }

    /// Structured domain error `{type: kind, error: message}`.
    #[must_use]
    pub fn error(kind: DomainErrorKind, message: impl Into<String>) -> Self {
        Self::Error(serde_json::json!({
            "type": kind.as_str(),
            "error": message.into(),
        }))
    }

    #[must_use]
    pub fn panic(message: impl Into<String>) -> Self {
        Self::Panic(message.into())
    }

    /// Wire text. Falls back to a hand-built panic envelope if the payload
    /// cannot be serialized, so a response is always produced.
    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            let fallback = Value::String(format!("Internal error: {e}"));
            format!("{{\"type\":\"panic\",\"payload\":{fallback}}}")
        })
    }

    /// Structural decode. An `ok` without payload decodes to `null`; a
    /// non-string `panic` payload is rendered as JSON text.
    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| CodecError::MalformedResponse(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(CodecError::MalformedResponse("response is not an object".into()));
        };
        let payload = object.remove("payload").unwrap_or(Value::Null);
        match object.get("type").and_then(Value::as_str) {
            Some("ok") => Ok(Self::Ok(payload)),
            Some("error") => Ok(Self::Error(payload)),
            Some("panic") => Ok(Self::Panic(match payload {
                Value::String(message) => message,
                other => other.to_string(),
            })),
            Some(other) => Err(CodecError::MalformedResponse(format!(
                "unknown response type {other}"
            ))),
            None => Err(CodecError::MalformedResponse("missing response type".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(tag = "name", content = "data", rename_all = "camelCase")]
    enum Sample {
        Ping,
        SetAlias { alias: String },
    }

    #[test]
    fn test_typed_catalogue_converts_to_envelope() {
        let envelope =
            MethodEnvelope::from_typed(&Sample::SetAlias { alias: "main".into() }).unwrap();
        assert_eq!(envelope.name(), "setAlias");
        assert_eq!(envelope.data(), Some(&json!({ "alias": "main" })));

        let unit = MethodEnvelope::from_typed(&Sample::Ping).unwrap();
        assert_eq!(unit.encode().unwrap(), r#"{"name":"ping"}"#);
    }

    #[test]
    fn test_non_envelope_values_rejected() {
        assert!(MethodEnvelope::from_value(json!("ping")).is_err());
        assert!(MethodEnvelope::from_value(json!({ "data": 1 })).is_err());
        assert!(MethodEnvelope::from_value(json!({ "name": "a", "extra": 1 })).is_err());
        assert!(MethodEnvelope::from_typed(&42u8).is_err());
    }

    #[test]
    fn test_debug_output_omits_secrets() {
        let envelope = MethodEnvelope::new("createWallet").with_data(json!({
            "storagePath": "./db",
            "secretManager": { "mnemonic": "abandon abandon" },
            "nested": [{ "password": "hunter2" }]
        }));
        let rendered = format!("{envelope:?}");
        assert!(!rendered.contains("abandon"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("./db"));
        assert!(rendered.contains(REDACTED));
        // Wire text keeps the real values.
        assert!(envelope.encode().unwrap().contains("hunter2"));
    }

    #[test]
    fn test_response_wire_shapes() {
        assert_eq!(
            ResponseEnvelope::ok(json!(1)).encode(),
            r#"{"type":"ok","payload":1}"#
        );
        let error: Value =
            serde_json::from_str(&ResponseEnvelope::error(DomainErrorKind::Wallet, "boom").encode())
                .unwrap();
        assert_eq!(
            error,
            json!({ "type": "error", "payload": { "type": "wallet", "error": "boom" } })
        );
        assert_eq!(
            ResponseEnvelope::panic("Internal error: x").encode(),
            r#"{"type":"panic","payload":"Internal error: x"}"#
        );
    }

    #[test]
    fn test_decode_tolerates_missing_ok_payload() {
        assert_eq!(
            ResponseEnvelope::decode(r#"{"type":"ok"}"#).unwrap(),
            ResponseEnvelope::Ok(Value::Null)
        );
    }

    #[test]
    fn test_decode_rejects_unknown_types() {
        assert!(ResponseEnvelope::decode(r#"{"type":"maybe","payload":1}"#).is_err());
        assert!(ResponseEnvelope::decode("[1,2]").is_err());
        assert!(ResponseEnvelope::decode("not json").is_err());
    }
}
