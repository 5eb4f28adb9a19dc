//! Boolean, date-time and numeric fields

use crate::errors::Errors;
use crate::value::Value;

use super::{Field, FieldKind, FieldOptions};

/// A boolean field.
///
/// Only truthy non-boolean values are rejected, so `0` or `""` pass validation.
#[derive(Debug, Clone)]
pub struct BooleanField {
    options: FieldOptions,
}

impl_field_builder!(BooleanField);

impl BooleanField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name),
        }
    }
}

impl Field for BooleanField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Boolean
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);

        if value.is_truthy() && value.as_bool().is_none() {
            errors.add(self.name(), "must be a valid boolean");
        }
    }
}

/// A naive date and time field
#[derive(Debug, Clone)]
pub struct DateTimeField {
    options: FieldOptions,
}

impl_field_builder!(DateTimeField);

impl DateTimeField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name),
        }
    }
}

impl Field for DateTimeField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::DateTime
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);

        if !value.is_null() && value.as_datetime().is_none() {
            errors.add(self.name(), "must be a valid date and time");
        }
    }
}

/// A floating point field with optional bounds.
///
/// Integers are widened before the type check. Booleans are not numbers.
#[derive(Debug, Clone)]
pub struct FloatField {
    options: FieldOptions,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

impl_field_builder!(FloatField);

impl FloatField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name),
            min_value: None,
            max_value: None,
        }
    }

    pub fn min_value(mut self, min: impl Into<f64>) -> Self {
        self.min_value = Some(min.into());
        self
    }

    pub fn max_value(mut self, max: impl Into<f64>) -> Self {
        self.max_value = Some(max.into());
        self
    }

    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.min_value, self.max_value)
    }
}

impl Field for FloatField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Float
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);

        if value.is_null() {
            return;
        }

        let Some(number) = value.as_f64() else {
            errors.add(self.name(), "must be a float");
            return;
        };

        // Bounds render with a decimal point, e.g. "0.0"
        if let Some(min) = self.min_value {
            if number < min {
                errors.add(self.name(), format!("is too small (minimum is {:?})", min));
            }
        }

        if let Some(max) = self.max_value {
            if number > max {
                errors.add(self.name(), format!("is too big (maximum is {:?})", max));
            }
        }
    }
    fn constraints(&self) -> Vec<String> {
        [("min_value", self.min_value), ("max_value", self.max_value)]
            .into_iter()
            .filter_map(|(option, bound)| bound.map(|b| format!("{} {:?}", option, b)))
            .collect()
    }
}

/// An integer field with optional bounds
#[derive(Debug, Clone)]
pub struct IntegerField {
    options: FieldOptions,
    min_value: Option<i64>,
    max_value: Option<i64>,
}

impl_field_builder!(IntegerField);

impl IntegerField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            options: FieldOptions::new(name),
            min_value: None,
            max_value: None,
        }
    }

    pub fn min_value(mut self, min: impl Into<i64>) -> Self {
        self.min_value = Some(min.into());
        self
    }

    pub fn max_value(mut self, max: impl Into<i64>) -> Self {
        self.max_value = Some(max.into());
        self
    }

    pub fn bounds(&self) -> (Option<i64>, Option<i64>) {
        (self.min_value, self.max_value)
    }
}

impl Field for IntegerField {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Integer
    }

    fn validate(&self, value: &Value, errors: &mut Errors) {
        self.options.validate(value, errors);

        if value.is_null() {
            return;
        }

        if value.as_i64().is_none() {
            errors.add(self.name(), "must be a integer");
        }

        // Floats still get range-checked so an out-of-range 11.5 reports both problems
        let too_small = |min: i64| match value {
            Value::Int(i) => *i < min,
            Value::Float(f) => *f < min as f64,
            _ => false,
        };
        let too_big = |max: i64| match value {
            Value::Int(i) => *i > max,
            Value::Float(f) => *f > max as f64,
            _ => false,
        };

        if let Some(min) = self.min_value {
            if too_small(min) {
                errors.add(self.name(), format!("is too small (minimum is {})", min));
            }
        }

        if let Some(max) = self.max_value {
            if too_big(max) {
                errors.add(self.name(), format!("is too big (maximum is {})", max));
            }
        }
    }
    fn constraints(&self) -> Vec<String> {
        [("min_value", self.min_value), ("max_value", self.max_value)]
            .into_iter()
            .filter_map(|(option, bound)| bound.map(|b| format!("{} {}", option, b)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldBuilder;
    use chrono::NaiveDate;

    fn messages(field: &dyn Field, value: Value) -> Vec<String> {
        let mut errors = Errors::new();
        field.validate(&value, &mut errors);
        errors.full_messages()
    }

    #[test]
    fn test_boolean_field() {
        let field = BooleanField::new("active");
        assert!(messages(&field, Value::from(true)).is_empty());
        assert!(messages(&field, Value::from(false)).is_empty());
        assert!(messages(&field, Value::Null).is_empty());
        assert_eq!(
            messages(&field, Value::from("yes")),
            vec!["Active must be a valid boolean"]
        );
    }

    #[test]
    fn test_boolean_field_lets_falsy_values_pass() {
        let field = BooleanField::new("active");
        assert!(messages(&field, Value::from(0)).is_empty());
        assert!(messages(&field, Value::from("")).is_empty());
    }

    #[test]
    fn test_datetime_field() {
        let field = DateTimeField::new("created_at");
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        assert!(messages(&field, Value::from(dt)).is_empty());
        assert!(messages(&field, Value::Null).is_empty());
        assert_eq!(
            messages(&field, Value::from("2020-01-01")),
            vec!["Created At must be a valid date and time"]
        );
    }

    #[test]
    fn test_float_field_range() {
        let field = FloatField::new("score").min_value(0).max_value(10);

        assert_eq!(
            messages(&field, Value::from(-1)),
            vec!["Score is too small (minimum is 0.0)"]
        );
        assert_eq!(
            messages(&field, Value::from(11)),
            vec!["Score is too big (maximum is 10.0)"]
        );
        assert!(messages(&field, Value::from(5)).is_empty());
        assert!(messages(&field, Value::from(9.5)).is_empty());
    }

    #[test]
    fn test_float_field_type() {
        let field = FloatField::new("score");
        assert_eq!(messages(&field, Value::from("1.5")), vec!["Score must be a float"]);
        assert_eq!(messages(&field, Value::from(true)), vec!["Score must be a float"]);
    }

    #[test]
    fn test_integer_field() {
        let field = IntegerField::new("age").min_value(0).max_value(150);

        assert!(messages(&field, Value::from(30)).is_empty());
        assert_eq!(messages(&field, Value::from(-2)), vec!["Age is too small (minimum is 0)"]);
        assert_eq!(messages(&field, Value::from(200)), vec!["Age is too big (maximum is 150)"]);
        assert_eq!(messages(&field, Value::from(1.5)), vec!["Age must be a integer"]);
        assert_eq!(
            messages(&field, Value::from(151.5)),
            vec!["Age must be a integer", "Age is too big (maximum is 150)"]
        );
        assert_eq!(messages(&field, Value::from(false)), vec!["Age must be a integer"]);
    }

    #[test]
    fn test_numeric_constraints() {
        let float = FloatField::new("balance").min_value(0);
        assert_eq!(float.constraints(), vec!["min_value 0.0"]);

        let integer = IntegerField::new("age").min_value(13).max_value(150);
        assert_eq!(integer.constraints(), vec!["min_value 13", "max_value 150"]);
        assert!(BooleanField::new("active").constraints().is_empty());
    }

    #[test]
    fn test_required_numeric_reports_once() {
        let field = IntegerField::new("age").required(true).min_value(1);
        assert_eq!(messages(&field, Value::Null), vec!["Age is required"]);
    }
}
