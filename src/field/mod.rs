//! Field descriptors
//!
//! A field is declared once per document class and shared by every instance of
//! that class. It never holds per-instance state: each [`crate::Document`] keeps its
//! own slot map keyed by the field's attribute key, and the field reads and writes
//! that map on the document's behalf.
//!
//! Every variant follows the same protocol:
//!
//! - **set** coerces raw input and stores it (`Field::set`, `Field::coerce`)
//! - **get** materializes a default into an unset slot (`Field::materialize`)
//! - **validate** runs the shared required/choices checks from
//!   [`FieldOptions::validate`], then layers the variant's own checks. Failures are
//!   appended to the document's [`Errors`]; validation never returns an error.

macro_rules! impl_field_builder {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::field::FieldBuilder for $ty {
                fn options_mut(&mut self) -> &mut $crate::field::FieldOptions {
                    &mut self.options
                }
            }
        )*
    };
}

mod array;
mod embedded;
mod object_id;
mod scalar;
mod string;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::Schema;
use crate::error::Result;
use crate::errors::{humanize, Errors};
use crate::value::Value;

pub use array::{ArrayField, ItemValidator, ItemValidators};
pub use embedded::{EmbeddedField, ListField};
pub use object_id::ObjectIdField;
pub use scalar::{BooleanField, DateTimeField, FloatField, IntegerField};
pub use string::StringField;

/// Per-document storage: attribute key to stored value
pub type Slots = HashMap<String, Value>;

/// The kind of a field, used by schema definitions and typed JSON loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Untyped field with only the shared checks
    Any,
    Boolean,
    DateTime,
    Float,
    Integer,
    ObjectId,
    String,
    Embedded,
    List,
    Array,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Any => "any",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "date_time",
            FieldKind::Float => "float",
            FieldKind::Integer => "integer",
            FieldKind::ObjectId => "object_id",
            FieldKind::String => "string",
            FieldKind::Embedded => "embedded",
            FieldKind::List => "list",
            FieldKind::Array => "array",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options shared by every field variant
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOptions {
    name: String,
    attribute_key: String,
    required: bool,
    default: Option<Value>,
    choices: Option<Vec<Value>>,
    persist: bool,
}

impl FieldOptions {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            attribute_key: format!("_{}", name),
            name,
            required: false,
            default: None,
            choices: None,
            persist: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage slot this field uses inside a document
    pub fn attribute_key(&self) -> &str {
        &self.attribute_key
    }

    /// Humanized name used in rendered messages
    pub fn label(&self) -> String {
        humanize(&self.name)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }

    pub fn choices(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    /// Whether the field is written to storage serialization
    pub fn persist(&self) -> bool {
        self.persist
    }

    /// The checks every field runs before its own
    pub fn validate(&self, value: &Value, errors: &mut Errors) {
        if self.required && value.is_null() {
            errors.add(&self.name, "is required");
        }

        if let Some(choices) = &self.choices {
            if !value.is_null() && !choices.iter().any(|choice| matches_choice(choice, value)) {
                errors.add(&self.name, "value must be in list");
            }
        }
    }
}

/// Numbers match across integer and float, so `1.0` is the choice `1`
fn matches_choice(choice: &Value, value: &Value) -> bool {
    match (choice.as_f64(), value.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => choice == value,
    }
}

/// A field descriptor
pub trait Field: fmt::Debug + Send + Sync {
    fn options(&self) -> &FieldOptions;

    fn kind(&self) -> FieldKind;

    fn name(&self) -> &str {
        self.options().name()
    }

    /// Schema of nested documents, for embedded and list fields
    fn nested_schema(&self) -> Option<&Arc<Schema>> {
        None
    }

    /// Value written into an unset slot on first read
    fn initial_value(&self) -> Option<Value> {
        self.options().default_value().cloned()
    }

    /// Apply the default to an unset slot.
    ///
    /// A slot is unset when absent, or when it holds null on a required field.
    fn materialize(&self, slots: &mut Slots) {
        let options = self.options();
        let unset = match slots.get(options.attribute_key()) {
            None => true,
            Some(Value::Null) => options.is_required(),
            Some(_) => false,
        };

        if unset {
            if let Some(value) = self.initial_value() {
                tracing::trace!(field = options.name(), "materialized default");
                slots.insert(options.attribute_key().to_string(), value);
            }
        }
    }

    /// Normalize raw input before it is stored
    fn coerce(&self, raw: Value) -> Value {
        raw
    }

    fn set(&self, slots: &mut Slots, raw: Value) -> Result<()> {
        let value = self.coerce(raw);
        slots.insert(self.options().attribute_key().to_string(), value);
        Ok(())
    }

    fn validate(&self, value: &Value, errors: &mut Errors);

    /// Kind-specific options, rendered as `name value` pairs
    fn constraints(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Builder methods for the shared options
pub trait FieldBuilder: Sized {
    fn options_mut(&mut self) -> &mut FieldOptions;

    fn required(mut self, required: bool) -> Self {
        self.options_mut().required = required;
        self
    }

    fn default(mut self, value: impl Into<Value>) -> Self {
        self.options_mut().default = Some(value.into());
        self
    }

    fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options_mut().choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    fn persist(mut self, persist: bool) -> Self {
        self.options_mut().persist = persist;
        self
    }
}

/// A field with only the shared required/choices/default behavior
#[derive(Debug, Clone)]
pub struct BaseField {
    options: FieldOptions,
}

impl_field_builder!(BaseField);

impl BaseField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name),
        }
    }
}

impl Field for BaseField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Any
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);
    }
}
