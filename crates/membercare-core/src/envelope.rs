//! Response envelope normalization.
//!
//! The API wraps payloads differently per endpoint: a bare array, an object
//! under `data`, a doubly nested `data.data`, or a resource-specific key such
//! as `logs`. Each [`crate::resource::Resource`] declares its shape once and
//! every response is unwrapped here, so callers always get `Vec<Record>` or a
//! single `Record`.

use crate::error::{MembercareError, Result};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum EnvelopeShape {
    /// Payload is the body itself.
    Bare,
    /// Payload is under `data`.
    #[default]
    Data,
    /// Payload is under `data.data`.
    NestedData,
    /// Payload is under a named top-level key.
    Field(String),
}

impl EnvelopeShape {
    pub fn field(key: impl Into<String>) -> Self {
        EnvelopeShape::Field(key.into())
    }

    /// Extracts the payload from a response body.
    pub fn unwrap_payload(&self, body: Value) -> Result<Value> {
        match self {
            EnvelopeShape::Bare => Ok(body),
            EnvelopeShape::Data => take_key(body, "data"),
            EnvelopeShape::NestedData => take_key(take_key(body, "data")?, "data"),
            EnvelopeShape::Field(key) => take_key(body, key),
        }
    }

    /// Normalizes a list response. `null` payloads are an empty list.
    pub fn normalize_list(&self, body: Value) -> Result<Vec<Record>> {
        match self.unwrap_payload(body)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value::<Record>(item).map_err(MembercareError::from))
                .collect(),
            other => Err(MembercareError::serialization(
                "JSON",
                format!("expected a list payload, found {}", kind_of(&other)),
            )),
        }
    }

    /// Normalizes a single-record response (create/update).
    ///
    /// Servers that answer with an empty body or a bare acknowledgement yield
    /// `None`; the caller keeps what it sent.
    pub fn normalize_one(&self, body: Value) -> Result<Option<Record>> {
        if body.is_null() {
            return Ok(None);
        }
        match self.unwrap_payload(body.clone()) {
            Ok(Value::Object(map)) => Ok(Some(serde_json::from_value(Value::Object(map))?)),
            Ok(Value::Null) => Ok(None),
            Ok(other) => Err(MembercareError::serialization(
                "JSON",
                format!("expected an object payload, found {}", kind_of(&other)),
            )),
            // Single-record answers are often sent unwrapped even when lists are wrapped.
            Err(_) if body.is_object() => Ok(Some(serde_json::from_value(body)?)),
            Err(e) => Err(e),
        }
    }
}

fn take_key(body: Value, key: &str) -> Result<Value> {
    match body {
        Value::Object(mut map) => map.remove(key).ok_or_else(|| {
            MembercareError::serialization("JSON", format!("response is missing `{}`", key))
        }),
        other => Err(MembercareError::serialization(
            "JSON",
            format!("expected an object with `{}`, found {}", key, kind_of(&other)),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
