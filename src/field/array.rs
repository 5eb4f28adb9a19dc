//! Generic array field and item validators

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::Errors;
use crate::value::Value;

use super::{Field, FieldKind, FieldOptions, Slots};

/// Callback run once per array item during validation.
///
/// Receives the field, the item and the document's error collection, and may add
/// any messages it likes.
pub type ItemValidator = Arc<dyn Fn(&ArrayField, &Value, &mut Errors) + Send + Sync>;

/// An ordered sequence of arbitrary values.
///
/// Reading an unset array yields an empty one. Length constraints apply to every
/// sequence, empty ones included.
#[derive(Clone)]
pub struct ArrayField {
    options: FieldOptions,
    length: Option<usize>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    validate_item: Option<ItemValidator>,
    validate_item_name: Option<String>,
}

impl_field_builder!(ArrayField);

impl ArrayField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name),
            length: None,
            min_length: None,
            max_length: None,
            validate_item: None,
            validate_item_name: None,
        }
    }

    /// Require exactly `length` items
    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn validate_item<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ArrayField, &Value, &mut Errors) + Send + Sync + 'static,
    {
        self.validate_item = Some(Arc::new(validator));
        self
    }

    pub fn item_validator(mut self, validator: ItemValidator) -> Self {
        self.validate_item = Some(validator);
        self
    }

    /// Use a validator registered under `name`, keeping the name for display
    pub fn named_item_validator(mut self, name: impl Into<String>, validator: ItemValidator) -> Self {
        self.validate_item = Some(validator);
        self.validate_item_name = Some(name.into());
        self
    }
}

impl fmt::Debug for ArrayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayField")
            .field("options", &self.options)
            .field("length", &self.length)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("validate_item", &self.validate_item.is_some())
            .field("validate_item_name", &self.validate_item_name)
            .finish()
    }
}

impl Field for ArrayField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Array
    }

    fn initial_value(&self) -> Option<Value> {
        Some(
            self.options
                .default_value()
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        )
    }

    fn materialize(&self, slots: &mut Slots) {
        let key = self.options.attribute_key();
        if slots.get(key).map_or(true, Value::is_null) {
            if let Some(value) = self.initial_value() {
                slots.insert(key.to_string(), value);
            }
        }
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);

        let length = value.sequence_len();

        if !value.is_null() && length.is_none() {
            errors.add(self.name(), "is not a list.");
        }

        // Null was already reported by the shared check
        if self.options.is_required() && !value.is_null() && !value.is_truthy() {
            errors.add(self.name(), "is required");
        }

        if let Some(length) = length {
            if let Some(expected) = self.length {
                if length != expected {
                    errors.add(
                        self.name(),
                        format!("is the wrong length (should be {} items)", expected),
                    );
                }
            }

            if let Some(min) = self.min_length {
                if length < min {
                    errors.add(self.name(), format!("is too short (minimum is {} items)", min));
                }
            }

            if let Some(max) = self.max_length {
                if length > max {
                    errors.add(self.name(), format!("is too long (maximum is {} items)", max));
                }
            }
        }

        if let (Some(validator), Some(items)) = (&self.validate_item, value.as_array()) {
            for item in items {
                validator(self, item, errors);
            }
        }
    }

    fn constraints(&self) -> Vec<String> {
        let mut constraints: Vec<String> = [
            ("length", self.length),
            ("min_length", self.min_length),
            ("max_length", self.max_length),
        ]
        .into_iter()
        .filter_map(|(option, limit)| limit.map(|n| format!("{} {}", option, n)))
        .collect();

        match (&self.validate_item_name, &self.validate_item) {
            (Some(name), _) => constraints.push(format!("validate_item {}", name)),
            (None, Some(_)) => constraints.push("validate_item".to_string()),
            (None, None) => {}
        }
        constraints
    }
}

/// Named item validators, for schemas declared in definition files
#[derive(Clone, Default)]
pub struct ItemValidators {
    validators: HashMap<String, ItemValidator>,
}

impl ItemValidators {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in validators:
    /// `string`, `integer`, `float`, `boolean`, `object_id`, `date_time`, `non_empty`
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("string", |field, item, errors| {
            if item.as_str().is_none() {
                errors.add(field.name(), "contains a value that is not a string");
            }
        });
        registry.register("integer", |field, item, errors| {
            if item.as_i64().is_none() {
                errors.add(field.name(), "contains a value that is not an integer");
            }
        });
        registry.register("float", |field, item, errors| {
            if item.as_f64().is_none() {
                errors.add(field.name(), "contains a value that is not a float");
            }
        });
        registry.register("boolean", |field, item, errors| {
            if item.as_bool().is_none() {
                errors.add(field.name(), "contains a value that is not a boolean");
            }
        });
        registry.register("object_id", |field, item, errors| {
            if item.as_object_id().is_none() {
                errors.add(field.name(), "contains a value that is not a valid Object Id");
            }
        });
        registry.register("date_time", |field, item, errors| {
            if item.as_datetime().is_none() {
                errors.add(field.name(), "contains a value that is not a valid date and time");
            }
        });
        registry.register("non_empty", |field, item, errors| {
            if !item.is_truthy() {
                errors.add(field.name(), "contains an empty value");
            }
        });
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, validator: F)
    where
        F: Fn(&ArrayField, &Value, &mut Errors) + Send + Sync + 'static,
    {
        self.validators.insert(name.into(), Arc::new(validator));
    }

    pub fn get(&self, name: &str) -> Option<ItemValidator> {
        self.validators.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ItemValidators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemValidators")
            .field("names", &self.names())
            .finish()
    }
}
