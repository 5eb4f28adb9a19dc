//! Text field

use regex::Regex;

use crate::error::{Result, SchemaError};
use crate::errors::Errors;
use crate::value::Value;

use super::{Field, FieldKind, FieldOptions};

/// A text field with optional length and pattern constraints.
///
/// Truthy input is rendered to text and trimmed on `set`. Falsy input, including
/// empty text, is stored as null. Lengths count characters.
#[derive(Debug, Clone)]
pub struct StringField {
    options: FieldOptions,
    length: Option<usize>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    /// Source as declared, plus its anchored compiled form
    pattern: Option<(String, Regex)>,
}

impl_field_builder!(StringField);

impl StringField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name),
            length: None,
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    /// Require exactly `length` characters
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

    /// Require values to match `pattern` starting at the first character
    pub fn pattern(mut self, pattern: &str) -> Result<Self> {
        let anchored = format!("^(?:{})", pattern);
        let regex = Regex::new(&anchored).map_err(|source| SchemaError::InvalidPattern {
            field: self.options.name().to_string(),
            source,
        })?;
        self.pattern = Some((pattern.to_string(), regex));
        Ok(self)
    }
}

impl Field for StringField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::String
    }

    fn coerce(&self, raw: Value) -> Value {
        if !raw.is_truthy() {
            return Value::Null;
        }

        match raw {
            Value::String(text) => Value::String(text.trim().to_string()),
            other => Value::String(other.to_string().trim().to_string()),
        }
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);

        let Some(text) = value.as_str() else {
            return;
        };

        // Whitespace-only input trims down to ""
        if text.is_empty() {
            if self.options.is_required() {
                errors.add(self.name(), "is required");
            }
            return;
        }

        let length = text.chars().count();

        if let Some(expected) = self.length {
            if length != expected {
                errors.add(
                    self.name(),
                    format!("is the wrong length (should be {} characters)", expected),
                );
            }
        }

        if let Some(min) = self.min_length {
            if length < min {
                errors.add(
                    self.name(),
                    format!("is too short (minimum is {} characters)", min),
                );
            }
        }

        if let Some(max) = self.max_length {
            if length > max {
                errors.add(
                    self.name(),
                    format!("is too long (maximum is {} characters)", max),
                );
            }
        }

        if let Some((_, regex)) = &self.pattern {
            if !regex.is_match(text) {
                errors.add(self.name(), "is in the wrong format");
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

        if let Some((source, _)) = &self.pattern {
            constraints.push(format!("pattern {}", source));
        }
        constraints
    }
}
