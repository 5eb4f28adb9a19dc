//! Fields holding nested documents

use std::sync::Arc;

use crate::document::{copy_fields, Document, Schema};
use crate::embedded_list::EmbeddedList;
use crate::error::{Result, SchemaError};
use crate::errors::Errors;
use crate::value::Value;

use super::{Field, FieldKind, FieldOptions, Slots};

fn ensure_embedded(schema: &Arc<Schema>) -> Result<()> {
    let sample = Document::new(Arc::clone(schema));
    if !sample.is_embedded() {
        return Err(SchemaError::NotEmbedded {
            type_name: schema.name().to_string(),
        });
    }
    Ok(())
}

/// A single nested document.
///
/// Each owning document gets its own nested instance, created from the declared
/// schema (or a copy of the default) the first time the slot is read or assigned.
/// Assignment copies field values into the owned instance instead of replacing it.
#[derive(Debug, Clone)]
pub struct EmbeddedField {
    options: FieldOptions,
    schema: Arc<Schema>,
}

impl_field_builder!(EmbeddedField);

impl EmbeddedField {
    /// Fails when `schema` does not describe an embedded document
    pub fn new(name: impl Into<String>, schema: Arc<Schema>) -> Result<Self> {
        ensure_embedded(&schema)?;
        Ok(Self {
            options: FieldOptions::new(name),
            schema,
        })
    }

    fn fresh(&self) -> Value {
        match self.options.default_value() {
            Some(default @ Value::Embedded(_)) => default.clone(),
            _ => Value::Embedded(Box::new(Document::new(Arc::clone(&self.schema)))),
        }
    }
}

impl Field for EmbeddedField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Embedded
    }

    fn nested_schema(&self) -> Option<&Arc<Schema>> {
        Some(&self.schema)
    }

    fn initial_value(&self) -> Option<Value> {
        Some(self.fresh())
    }

    fn set(&self, slots: &mut Slots, raw: Value) -> Result<()> {
        let key = self.options.attribute_key();

        if !raw.is_truthy() {
            slots.insert(key.to_string(), Value::Null);
            return Ok(());
        }

        let mut source = match raw {
            Value::Embedded(doc) if doc.is_embedded() => doc,
            Value::Embedded(doc) => {
                return Err(SchemaError::NotEmbedded {
                    type_name: doc.schema().name().to_string(),
                })
            }
            other => {
                return Err(SchemaError::NotEmbedded {
                    type_name: other.type_name().to_string(),
                })
            }
        };

        if !Arc::ptr_eq(source.schema(), &self.schema) {
            return Err(SchemaError::WrongDocumentType {
                expected: self.schema.name().to_string(),
                actual: source.schema().name().to_string(),
            });
        }

        let slot = slots.entry(key.to_string()).or_insert(Value::Null);
        if !matches!(slot, Value::Embedded(_)) {
            *slot = Value::Embedded(Box::new(Document::new(Arc::clone(&self.schema))));
        }

        if let Value::Embedded(owned) = slot {
            copy_fields(&mut **owned, &mut *source)?;
        }
        Ok(())
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);
    }
}

/// A list of embedded documents of one type.
///
/// The list is created on first read and managed through [`EmbeddedList`];
/// assigning to the field does nothing.
#[derive(Debug, Clone)]
pub struct ListField {
    options: FieldOptions,
    schema: Arc<Schema>,
}

impl_field_builder!(ListField);

impl ListField {
    /// Fails when `schema` does not describe an embedded document
    pub fn new(name: impl Into<String>, schema: Arc<Schema>) -> Result<Self> {
        ensure_embedded(&schema)?;
        Ok(Self {
            options: FieldOptions::new(name),
            schema,
        })
    }
}

impl Field for ListField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::List
    }

    fn nested_schema(&self) -> Option<&Arc<Schema>> {
        Some(&self.schema)
    }

    fn initial_value(&self) -> Option<Value> {
        Some(Value::List(EmbeddedList::new(
            self.options.name(),
            Arc::clone(&self.schema),
        )))
    }

    fn set(&self, _slots: &mut Slots, _raw: Value) -> Result<()> {
        Ok(())
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);

        if self.options.is_required() && value.as_list().is_some_and(EmbeddedList::is_empty) {
            errors.add(self.name(), "is required");
        }
    }
}
