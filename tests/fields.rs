//! Field behavior through the document API

use std::sync::Arc;

use docschema::prelude::*;

fn single(field: impl Field + 'static) -> Document {
    let schema = Schema::builder("Target").field(field).build().unwrap();
    Document::new(schema)
}

fn messages_for(field: impl Field + 'static, value: impl Into<Value>) -> Vec<String> {
    let mut doc = single(field);
    let name = doc.field_names()[0].to_string();
    doc.set(&name, value).unwrap();
    doc.validate().full_messages()
}

// =============================================================================
// Shared options
// =============================================================================

#[test]
fn test_required_fields_report_once() {
    let required: Vec<Box<dyn Fn() -> Document>> = vec![
        Box::new(|| single(BaseField::new("value").required(true))),
        Box::new(|| single(BooleanField::new("value").required(true))),
        Box::new(|| single(DateTimeField::new("value").required(true))),
        Box::new(|| single(FloatField::new("value").required(true))),
        Box::new(|| single(IntegerField::new("value").required(true))),
        Box::new(|| single(ObjectIdField::new("value").required(true))),
        Box::new(|| single(StringField::new("value").required(true))),
        Box::new(|| single(ArrayField::new("value").required(true))),
    ];

    for make in &required {
        let mut doc = make();
        doc.set("value", Value::Null).unwrap();
        assert_eq!(doc.validate().full_messages(), vec!["Value is required"]);
    }
}

#[test]
fn test_required_string_rejects_empty_text() {
    assert_eq!(
        messages_for(StringField::new("title").required(true), ""),
        vec!["Title is required"]
    );
    assert_eq!(
        messages_for(StringField::new("title").required(true), "   "),
        vec!["Title is required"]
    );
    assert!(messages_for(StringField::new("title").required(true), "Notes").is_empty());
}

#[test]
fn test_choices() {
    let field = || StringField::new("color").choices(["red", "green"]);
    assert_eq!(
        messages_for(field(), "blue"),
        vec!["Color value must be in list"]
    );
    assert!(messages_for(field(), "red").is_empty());
}

#[test]
fn test_default_then_override() {
    let mut doc = single(BaseField::new("my_field").default(1).required(true));

    assert_eq!(doc.get("my_field").unwrap(), &Value::from(1));
    assert!(doc.validate().is_empty());

    doc.set("my_field", 42).unwrap();
    assert_eq!(doc.get("my_field").unwrap(), &Value::from(42));
}

// =============================================================================
// Numeric fields
// =============================================================================

#[test]
fn test_float_bounds() {
    let field = || FloatField::new("score").min_value(0).max_value(10);
    assert_eq!(
        messages_for(field(), -1),
        vec!["Score is too small (minimum is 0.0)"]
    );
    assert_eq!(
        messages_for(field(), 11),
        vec!["Score is too big (maximum is 10.0)"]
    );
    assert!(messages_for(field(), 5).is_empty());
}

#[test]
fn test_integer_rejects_fractions_and_range() {
    let field = || IntegerField::new("age").min_value(0).max_value(150);
    assert_eq!(
        messages_for(field(), 151.5),
        vec!["Age must be a integer", "Age is too big (maximum is 150)"]
    );
    assert_eq!(messages_for(field(), "ten"), vec!["Age must be a integer"]);
    assert!(messages_for(field(), 30).is_empty());
}

#[test]
fn test_booleans_are_not_numbers() {
    assert_eq!(
        messages_for(FloatField::new("ratio"), true),
        vec!["Ratio must be a float"]
    );
}

// =============================================================================
// Text, identifiers, arrays
// =============================================================================

#[test]
fn test_string_exact_length() {
    let field = || StringField::new("code").length(5);
    assert_eq!(
        messages_for(field(), "abcd"),
        vec!["Code is the wrong length (should be 5 characters)"]
    );
    assert!(messages_for(field(), "abcde").is_empty());
}

#[test]
fn test_string_set_trims() {
    let mut doc = single(StringField::new("name"));
    doc.set("name", "  Grace  ").unwrap();
    assert_eq!(doc.get("name").unwrap(), &Value::from("Grace"));
}

#[test]
fn test_object_id_parsed_on_set() {
    let mut doc = single(ObjectIdField::new("owner"));
    doc.set("owner", "507f1f77bcf86cd799439011").unwrap();
    assert!(doc.get("owner").unwrap().as_object_id().is_some());
    assert!(doc.validate().is_empty());

    doc.set("owner", "xyz").unwrap();
    assert_eq!(
        doc.validate().full_messages(),
        vec!["Owner must be a valid Object Id"]
    );
}

#[test]
fn test_array_bounds() {
    let field = || ArrayField::new("tags").min_length(2).max_length(3);
    assert_eq!(
        messages_for(field(), vec![1]),
        vec!["Tags is too short (minimum is 2 items)"]
    );
    assert_eq!(
        messages_for(field(), vec![1, 2, 3, 4]),
        vec!["Tags is too long (maximum is 3 items)"]
    );
}

#[test]
fn test_array_items_appended_in_place() {
    let mut doc = single(ArrayField::new("tags").max_length(2));
    doc.array_mut("tags").unwrap().push(Value::from("a"));
    doc.array_mut("tags").unwrap().push(Value::from("b"));
    doc.array_mut("tags").unwrap().push(Value::from("c"));

    assert_eq!(
        doc.validate().full_messages(),
        vec!["Tags is too long (maximum is 2 items)"]
    );
}

#[test]
fn test_validate_item_sees_errors() {
    let field = ArrayField::new("scores").validate_item(|field, item, errors| {
        if item.as_i64().map_or(true, |n| n > 100) {
            errors.add(field.name(), format!("has an out of range score: {}", item));
        }
    });

    assert_eq!(
        messages_for(field, vec![10, 101]),
        vec!["Scores has an out of range score: 101"]
    );
}

#[test]
fn test_fields_are_shared_by_instances() {
    let schema = Schema::builder("Counter")
        .field(IntegerField::new("count").default(0))
        .build()
        .unwrap();

    let mut a = Document::new(Arc::clone(&schema));
    let mut b = Document::new(Arc::clone(&schema));
    a.set("count", 5).unwrap();

    assert!(Arc::ptr_eq(a.schema(), b.schema()));
    assert_eq!(a.get("count").unwrap(), &Value::from(5));
    assert_eq!(b.get("count").unwrap(), &Value::from(0));
}
