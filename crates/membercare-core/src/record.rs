//! Record domain model.
//!
//! A [`Record`] is a single structured item exchanged with the remote API:
//! a form submission on the way out, a list entry on the way back.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A single field value.
///
/// Deserialization tries the variants in declaration order. Only a string
/// that is exactly `YYYY-MM-DD` becomes [`FieldValue::Date`]; any other
/// string stays [`FieldValue::Text`] byte for byte, so a fetched record
/// sends back what it received. Objects and arrays are kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Date(#[serde(deserialize_with = "canonical_date")] NaiveDate),
    Text(String),
    Json(serde_json::Value),
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepts a date only when formatting it again yields the same text.
fn canonical_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == text)
        .ok_or_else(|| serde::de::Error::custom(format!("not a canonical date: {:?}", text)))
}

impl FieldValue {
    /// True for `null` and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Text used by list search. Booleans and structured values are not searchable.
    pub fn search_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(text) => Some(Cow::Borrowed(text)),
            FieldValue::Number(number) => Some(Cow::Owned(number.to_string())),
            FieldValue::Date(date) => Some(Cow::Owned(date.format(DATE_FORMAT).to_string())),
            FieldValue::Null | FieldValue::Bool(_) | FieldValue::Json(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(value) => write!(f, "{}", value),
            FieldValue::Number(number) => write!(f, "{}", number),
            FieldValue::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Json(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<f64> for FieldValue {
    /// Non-finite numbers have no JSON form and become `Null`.
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Null)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

/// Opaque identifier assigned by the remote system.
///
/// Accepted from the wire as either a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WireId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match WireId::deserialize(deserializer)? {
            WireId::Text(text) => RecordId(text),
            WireId::Number(number) => RecordId(number.to_string()),
        })
    }
}

/// An ordered mapping of field name to value, plus the remote identity once persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    #[serde(flatten)]
    fields: IndexMap<String, FieldValue>,
}

impl Record {
    /// Creates an empty, not-yet-persisted record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style id setter.
    pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Sets a field, returning the previous value. Insertion order is kept for new fields.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text value of a field, if it holds text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.shift_remove(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON body for create/update requests: the fields only, never the id.
    pub fn to_body(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(name, value)| {
                let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                (name.clone(), json)
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}
