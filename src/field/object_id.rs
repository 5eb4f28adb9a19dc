//! Document identifier field

use bson::oid::ObjectId;

use crate::errors::Errors;
use crate::value::Value;

use super::{Field, FieldKind, FieldOptions};

/// A 12-byte document identifier, written as 24 hex characters.
///
/// Text that does not parse is stored as-is; the failure surfaces on validation.
#[derive(Debug, Clone)]
pub struct ObjectIdField {
    options: FieldOptions,
}

impl_field_builder!(ObjectIdField);

impl ObjectIdField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name),
        }
    }
}

impl Field for ObjectIdField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::ObjectId
    }

    fn coerce(&self, raw: Value) -> Value {
        match raw {
            Value::String(text) => match ObjectId::parse_str(&text) {
                Ok(oid) => Value::ObjectId(oid),
                Err(e) => {
                    tracing::debug!(field = self.name(), error = %e, "keeping unparsed object id");
                    Value::String(text)
                }
            },
            other => other,
        }
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);

        if !value.is_null() && value.as_object_id().is_none() {
            errors.add(self.name(), "must be a valid Object Id");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Slots;

    const HEX: &str = "507f1f77bcf86cd799439011";

    #[test]
    fn test_set_parses_hex() {
        let field = ObjectIdField::new("_id");
        let mut slots = Slots::new();
        field.set(&mut slots, Value::from(HEX)).unwrap();

        let stored = &slots["__id"];
        assert_eq!(stored.as_object_id().unwrap().to_hex(), HEX);

        let mut errors = Errors::new();
        field.validate(stored, &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_set_keeps_invalid_input() {
        let field = ObjectIdField::new("owner_id");
        let mut slots = Slots::new();
        field.set(&mut slots, Value::from("not-an-id")).unwrap();

        let stored = &slots["_owner_id"];
        assert_eq!(stored, &Value::from("not-an-id"));

        let mut errors = Errors::new();
        field.validate(stored, &mut errors);
        assert_eq!(errors.full_messages(), vec!["Owner Id must be a valid Object Id"]);
    }

    #[test]
    fn test_null_and_existing_ids_pass_through() {
        let field = ObjectIdField::new("ref");
        assert_eq!(field.coerce(Value::Null), Value::Null);

        let oid = ObjectId::new();
        assert_eq!(field.coerce(Value::from(oid)), Value::ObjectId(oid));
        assert_eq!(field.coerce(Value::from(7)), Value::from(7));
    }
}
