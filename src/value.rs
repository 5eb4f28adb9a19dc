//! Dynamic values stored in document slots
//!
//! Fields accept any raw input and decide during `set` and `validate` what to do
//! with it, so slots hold a `Value` rather than a concrete Rust type.
//!
//! JSON conversion follows MongoDB extended JSON for the two types plain JSON cannot
//! express: identifiers are `{"$oid": "<hex>"}` and date-times are
//! `{"$date": "<RFC 3339>"}`.

use std::fmt;

use bson::oid::ObjectId;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::json;

use crate::document::Document;
use crate::embedded_list::EmbeddedList;
use crate::error::{Result, SchemaError};

/// A value held by a document field
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Naive date and time, interpreted as UTC when serialized
    DateTime(NaiveDateTime),
    ObjectId(ObjectId),
    Array(Vec<Value>),
    Embedded(Box<Document>),
    List(EmbeddedList),
}

impl Value {
    /// Whether the value counts as "set" for presence checks.
    ///
    /// Null, `false`, zero, empty text and empty sequences are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::List(list) => !list.is_empty(),
            Value::DateTime(_) | Value::ObjectId(_) | Value::Embedded(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::ObjectId(_) => "object_id",
            Value::Array(_) => "array",
            Value::Embedded(_) => "embedded",
            Value::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Value::ObjectId(oid) => Some(oid),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Embedded(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Embedded(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&EmbeddedList> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut EmbeddedList> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Number of items when the value is an ordered sequence
    pub fn sequence_len(&self) -> Option<usize> {
        match self {
            Value::Array(items) => Some(items.len()),
            Value::List(list) => Some(list.len()),
            _ => None,
        }
    }

    /// Convert to JSON using extended JSON for identifiers and date-times.
    ///
    /// Embedded documents contribute their persisted fields as currently stored.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Int(i) => json!(i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => json!(s),
            Value::DateTime(dt) => json!({ "$date": format_datetime(dt) }),
            Value::ObjectId(oid) => json!({ "$oid": oid.to_hex() }),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Embedded(doc) => doc.stored_data(),
            Value::List(list) => {
                serde_json::Value::Array(list.iter().map(Document::stored_data).collect())
            }
        }
    }

    /// Convert plain or extended JSON into a value.
    ///
    /// Objects other than `$oid`/`$date` wrappers need a schema to become documents,
    /// so they are rejected here; [`Document::from_json_value`] handles them.
    pub fn from_json(json: &serde_json::Value) -> Result<Value> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_json::Value::Object(map) => {
                if let Some(value) = extended_json(map)? {
                    value
                } else {
                    return Err(SchemaError::InvalidDocument(
                        "nested object found where no embedded document is declared".into(),
                    ));
                }
            }
        })
    }
}

/// Decode `{"$oid": ..}` and `{"$date": ..}` wrappers; `None` for ordinary objects
fn extended_json(map: &serde_json::Map<String, serde_json::Value>) -> Result<Option<Value>> {
    if map.len() != 1 {
        return Ok(None);
    }

    if let Some(raw) = map.get("$oid") {
        let hex = raw
            .as_str()
            .ok_or_else(|| SchemaError::InvalidDocument("$oid must be a string".into()))?;
        // Unparseable ids stay as text so validation can report them
        return Ok(Some(
            ObjectId::parse_str(hex)
                .map(Value::ObjectId)
                .unwrap_or_else(|_| Value::String(hex.to_string())),
        ));
    }

    if let Some(raw) = map.get("$date") {
        let text = raw
            .as_str()
            .ok_or_else(|| SchemaError::InvalidDocument("$date must be a string".into()))?;
        return parse_datetime(text).map(|dt| Some(Value::DateTime(dt)));
    }

    Ok(None)
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    Utc.from_utc_datetime(dt)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| SchemaError::InvalidDocument(format!("invalid $date {text}: {e}")))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt.naive_utc())
    }
}

impl From<ObjectId> for Value {
    fn from(oid: ObjectId) -> Self {
        Value::ObjectId(oid)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Embedded(Box::new(doc))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
