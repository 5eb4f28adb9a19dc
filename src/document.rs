//! Document classes and instances
//!
//! A [`Schema`] is a document class: a name, a kind and an ordered list of field
//! descriptors, built once and shared behind an `Arc`. A [`Document`] is one
//! instance of a schema. It owns a slot map and exactly one [`Errors`] collection.
//!
//! ```
//! use docschema::prelude::*;
//!
//! let user = Schema::builder("User")
//!     .field(StringField::new("name").required(true))
//!     .field(IntegerField::new("age").min_value(0))
//!     .build()
//!     .unwrap();
//!
//! let mut doc = Document::new(user);
//! doc.set("age", -1).unwrap();
//! doc.validate();
//!
//! assert_eq!(
//!     doc.errors().full_messages(),
//!     vec!["Name is required", "Age is too small (minimum is 0)"]
//! );
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embedded_list::EmbeddedList;
use crate::error::{Result, SchemaError};
use crate::errors::Errors;
use crate::field::{Field, FieldKind, Slots};
use crate::value::{parse_datetime, Value};

/// Whether a schema describes a top-level or an embedded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Document,
    Embedded,
}

/// A document class
pub struct Schema {
    name: String,
    kind: DocumentKind,
    fields: Vec<Arc<dyn Field>>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Start building a top-level document class
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name, DocumentKind::Document)
    }

    /// Start building an embedded document class
    pub fn embedded(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name, DocumentKind::Embedded)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn is_embedded(&self) -> bool {
        self.kind == DocumentKind::Embedded
    }

    /// Every declared field, in declaration order
    pub fn fields(&self) -> &[Arc<dyn Field>] {
        &self.fields
    }

    /// Fields written to storage serialization
    pub fn persisted_fields(&self) -> impl Iterator<Item = &Arc<dyn Field>> {
        self.fields.iter().filter(|f| f.options().persist())
    }

    pub fn field(&self, name: &str) -> Option<&Arc<dyn Field>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`Schema`]
pub struct SchemaBuilder {
    name: String,
    kind: DocumentKind,
    fields: Vec<Arc<dyn Field>>,
}

impl SchemaBuilder {
    fn new(name: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
        }
    }

    pub fn field<F: Field + 'static>(mut self, field: F) -> Self {
        self.fields.push(Arc::new(field));
        self
    }

    pub fn shared_field(mut self, field: Arc<dyn Field>) -> Self {
        self.fields.push(field);
        self
    }

    /// Finish the schema; field names must be unique
    pub fn build(self) -> Result<Arc<Schema>> {
        let mut index = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if index.insert(field.name().to_string(), i).is_some() {
                return Err(SchemaError::DuplicateField {
                    document: self.name,
                    field: field.name().to_string(),
                });
            }
        }

        Ok(Arc::new(Schema {
            name: self.name,
            kind: self.kind,
            fields: self.fields,
            index,
        }))
    }
}

/// Named field access, the capability an embedded document must provide
pub trait FieldAccess {
    fn type_name(&self) -> &str;

    fn is_embedded(&self) -> bool;

    fn field_names(&self) -> Vec<String>;

    fn get_field(&mut self, name: &str) -> Result<&Value>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;
}

/// Copy every field of `source` into `target` through the target's own `set`
pub fn copy_fields<T, S>(target: &mut T, source: &mut S) -> Result<()>
where
    T: FieldAccess + ?Sized,
    S: FieldAccess + ?Sized,
{
    for name in source.field_names() {
        let value = source.get_field(&name)?.clone();
        target.set_field(&name, value)?;
    }
    Ok(())
}

/// An instance of a [`Schema`]
#[derive(Debug, Clone)]
pub struct Document {
    schema: Arc<Schema>,
    slots: Slots,
    errors: Errors,
}

impl Document {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            slots: Slots::new(),
            errors: Errors::new(),
        }
    }

    /// Create a document and assign each `(name, value)` pair through `set`
    pub fn with_values<I, K, V>(schema: Arc<Schema>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut doc = Self::new(schema);
        for (name, value) in values {
            doc.set(name.as_ref(), value)?;
        }
        Ok(doc)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn is_embedded(&self) -> bool {
        self.schema.is_embedded()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.schema.field_names()
    }

    fn field(&self, name: &str) -> Result<Arc<dyn Field>> {
        self.schema
            .field(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownField {
                document: self.schema.name().to_string(),
                field: name.to_string(),
            })
    }

    /// Read a field, materializing its default when unset
    pub fn get(&mut self, name: &str) -> Result<&Value> {
        let field = self.field(name)?;
        field.materialize(&mut self.slots);
        Ok(self
            .slots
            .get(field.options().attribute_key())
            .unwrap_or(&Value::Null))
    }

    /// Mutable access to a field's slot. Writes through this reference skip
    /// the field's coercion.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Value> {
        let field = self.field(name)?;
        field.materialize(&mut self.slots);
        Ok(self
            .slots
            .entry(field.options().attribute_key().to_string())
            .or_insert(Value::Null))
    }

    /// Assign a field through its coercion
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let field = self.field(name)?;
        field.set(&mut self.slots, value.into())
    }

    /// The nested document owned by an embedded field
    pub fn embedded_mut(&mut self, name: &str) -> Result<&mut Document> {
        let value = self.get_mut(name)?;
        let actual = value.type_name();
        value
            .as_document_mut()
            .ok_or_else(|| SchemaError::TypeMismatch {
                field: name.to_string(),
                expected: "embedded".into(),
                actual: actual.into(),
            })
    }

    /// The list owned by a list field
    pub fn list_mut(&mut self, name: &str) -> Result<&mut EmbeddedList> {
        let value = self.get_mut(name)?;
        let actual = value.type_name();
        value.as_list_mut().ok_or_else(|| SchemaError::TypeMismatch {
            field: name.to_string(),
            expected: "list".into(),
            actual: actual.into(),
        })
    }

    /// The items of an array field
    pub fn array_mut(&mut self, name: &str) -> Result<&mut Vec<Value>> {
        let value = self.get_mut(name)?;
        let actual = value.type_name();
        value.as_array_mut().ok_or_else(|| SchemaError::TypeMismatch {
            field: name.to_string(),
            expected: "array".into(),
            actual: actual.into(),
        })
    }

    /// Run a full validation pass and return the fresh errors.
    ///
    /// Defaults are materialized first so every field validates the value a read
    /// would return.
    pub fn validate(&mut self) -> &Errors {
        let schema = Arc::clone(&self.schema);
        self.errors.clear_all();

        for field in schema.fields() {
            field.materialize(&mut self.slots);
        }

        for field in schema.fields() {
            let value = self
                .slots
                .get(field.options().attribute_key())
                .unwrap_or(&Value::Null);
            field.validate(value, &mut self.errors);
        }

        self.errors.sort_by_declaration(&schema.field_names());

        tracing::debug!(
            document = schema.name(),
            errors = self.errors.count(),
            "validated document"
        );
        &self.errors
    }

    /// Validate this document and every embedded document below it.
    ///
    /// Nested messages are keyed by path, e.g. `address.city` or
    /// `previous_addresses[0].city`. This document's own collection keeps only
    /// what `validate` reports.
    pub fn validate_nested(&mut self) -> Errors {
        let mut all = self.validate().clone();
        let schema = Arc::clone(&self.schema);

        for field in schema.fields() {
            match self.slots.get_mut(field.options().attribute_key()) {
                Some(Value::Embedded(doc)) => {
                    merge_nested(&mut all, field.name(), &doc.validate_nested());
                }
                Some(Value::List(list)) => {
                    for (index, doc) in list.iter_mut().enumerate() {
                        let path = format!("{}[{}]", field.name(), index);
                        merge_nested(&mut all, &path, &doc.validate_nested());
                    }
                }
                _ => {}
            }
        }
        all
    }

    /// Errors from the most recent validation pass
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Mutable access for callers that record their own messages
    pub fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    /// Whether the last validation pass found nothing. Call `validate` first.
    pub fn is_valid(&self) -> bool {
        self.errors.count() == 0
    }

    fn materialize_all(&mut self) {
        let schema = Arc::clone(&self.schema);
        for field in schema.fields() {
            field.materialize(&mut self.slots);
        }

        for value in self.slots.values_mut() {
            match value {
                Value::Embedded(doc) => doc.materialize_all(),
                Value::List(list) => list.iter_mut().for_each(Document::materialize_all),
                _ => {}
            }
        }
    }

    /// JSON object of every persisted field, with defaults applied
    pub fn data(&mut self) -> serde_json::Value {
        self.materialize_all();
        self.stored_data()
    }

    /// JSON object of every persisted field as currently stored
    pub(crate) fn stored_data(&self) -> serde_json::Value {
        let map = self
            .schema
            .persisted_fields()
            .map(|field| {
                let value = self
                    .slots
                    .get(field.options().attribute_key())
                    .map(Value::to_json)
                    .unwrap_or(serde_json::Value::Null);
                (field.name().to_string(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }

    /// Serialize persisted fields, optionally restricted to `fields`
    pub fn to_json(&mut self, fields: Option<&[&str]>) -> Result<String> {
        let data = self.data();
        let Some(fields) = fields else {
            return Ok(serde_json::to_string(&data)?);
        };

        let mut selected = serde_json::Map::new();
        for name in fields {
            let value = data.get(*name).ok_or_else(|| SchemaError::UnknownField {
                document: self.schema.name().to_string(),
                field: name.to_string(),
            })?;
            selected.insert(name.to_string(), value.clone());
        }
        Ok(serde_json::to_string(&selected)?)
    }

    /// Build a document from a JSON string
    pub fn from_json(schema: Arc<Schema>, json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(schema, &value)
    }

    /// Build a document from a JSON object, assigning each known key through `set`.
    ///
    /// Keys that match no declared field are skipped. Nested objects become
    /// embedded documents of the field's declared schema.
    pub fn from_json_value(schema: Arc<Schema>, json: &serde_json::Value) -> Result<Self> {
        let object = json.as_object().ok_or_else(|| {
            SchemaError::InvalidDocument(format!("{} must be a JSON object", schema.name()))
        })?;

        let mut doc = Self::new(Arc::clone(&schema));

        for (key, raw) in object {
            let Some(field) = schema.field(key) else {
                tracing::debug!(document = schema.name(), key = %key, "skipping undeclared key");
                continue;
            };

            match (field.kind(), field.nested_schema()) {
                (FieldKind::Embedded, Some(nested)) => {
                    let value = if raw.is_null() {
                        Value::Null
                    } else {
                        Value::from(Self::from_json_value(Arc::clone(nested), raw)?)
                    };
                    doc.set(key, value)?;
                }
                (FieldKind::List, Some(nested)) => {
                    let items = match raw {
                        serde_json::Value::Null => continue,
                        serde_json::Value::Array(items) => items,
                        _ => {
                            return Err(SchemaError::InvalidDocument(format!(
                                "{} must be an array of {} documents",
                                key,
                                nested.name()
                            )))
                        }
                    };
                    let list = doc.list_mut(key)?;
                    for item in items {
                        list.push(Self::from_json_value(Arc::clone(nested), item)?)?;
                    }
                }
                (FieldKind::DateTime, _) => {
                    let value = match raw.as_str() {
                        Some(text) => parse_datetime(text)
                            .map(Value::DateTime)
                            .unwrap_or_else(|_| Value::from(text)),
                        None => Value::from_json(raw)?,
                    };
                    doc.set(key, value)?;
                }
                _ => doc.set(key, Value::from_json(raw)?)?,
            }
        }

        Ok(doc)
    }
}

fn merge_nested(into: &mut Errors, prefix: &str, nested: &Errors) {
    for (field, message) in nested.iter() {
        into.add(format!("{}.{}", prefix, field), message);
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.slots == other.slots
    }
}

impl FieldAccess for Document {
    fn type_name(&self) -> &str {
        self.schema.name()
    }

    fn is_embedded(&self) -> bool {
        Document::is_embedded(self)
    }

    fn field_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    fn get_field(&mut self, name: &str) -> Result<&Value> {
        self.get(name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.set(name, value)
    }
}
