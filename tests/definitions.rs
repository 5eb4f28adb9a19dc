//! Loading schema definition files

use std::path::Path;

use docschema::field::{Field, FieldKind, ItemValidators};
use docschema::{DocumentKind, SchemaDefinition, SchemaError, SchemaSet, Value};

fn fixtures_path() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").leak()
}

#[test]
fn test_load_toml_definition() {
    let set = SchemaSet::load(fixtures_path().join("shop.toml")).unwrap();

    assert_eq!(set.name(), "shop");
    assert_eq!(set.version().to_string(), "1.2.0");
    assert_eq!(set.names().collect::<Vec<_>>(), vec!["Customer", "Address"]);

    let customer = set.require("Customer").unwrap();
    assert_eq!(customer.kind(), DocumentKind::Document);
    assert_eq!(customer.field("address").unwrap().kind(), FieldKind::Embedded);
    assert_eq!(
        customer
            .field("previous_addresses")
            .unwrap()
            .nested_schema()
            .unwrap()
            .name(),
        "Address"
    );
    assert_eq!(
        customer
            .persisted_fields()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .last(),
        Some(&"previous_addresses")
    );

    assert!(set.require("Address").unwrap().is_embedded());
}

#[test]
fn test_toml_and_json_definitions_share_checksum() {
    let from_toml = SchemaSet::load(fixtures_path().join("shop.toml")).unwrap();
    let from_json = SchemaSet::load(fixtures_path().join("shop.json")).unwrap();
    assert_eq!(from_toml.checksum(), from_json.checksum());
}

#[test]
fn test_checksum_tracks_content() {
    let original = std::fs::read_to_string(fixtures_path().join("shop.toml")).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let copy = dir.path().join("copy.toml");
    std::fs::write(&copy, &original).unwrap();

    let bumped = dir.path().join("bumped.toml");
    std::fs::write(&bumped, original.replace("1.2.0", "1.3.0")).unwrap();

    let reference = SchemaSet::load(fixtures_path().join("shop.toml")).unwrap();
    assert_eq!(SchemaSet::load(&copy).unwrap().checksum(), reference.checksum());
    assert_ne!(SchemaSet::load(&bumped).unwrap().checksum(), reference.checksum());
}

#[test]
fn test_defaults_and_choices_from_file() {
    let set = SchemaSet::load(fixtures_path().join("shop.toml")).unwrap();
    let mut customer = set.new_document("Customer").unwrap();

    assert_eq!(customer.get("tier").unwrap(), &Value::from("basic"));
    customer.set("tier", "silver").unwrap();
    customer.set("email", "x@y.z").unwrap();
    customer.set("name", "Xy").unwrap();

    assert_eq!(
        customer.validate().full_messages(),
        vec!["Tier value must be in list"]
    );
}

#[test]
fn test_field_constraints_from_file() {
    let set = SchemaSet::load(fixtures_path().join("shop.toml")).unwrap();
    let customer = set.require("Customer").unwrap();
    let constraints = |name: &str| customer.field(name).unwrap().constraints();

    assert_eq!(constraints("age"), vec!["min_value 13", "max_value 150"]);
    assert_eq!(constraints("balance"), vec!["min_value 0.0"]);
    assert_eq!(constraints("name"), vec!["min_length 2", "max_length 40"]);
    assert_eq!(constraints("email"), vec![r"pattern [^@\s]+@[^@\s]+$"]);
    assert_eq!(constraints("tags"), vec!["max_length 5", "validate_item string"]);
    assert!(constraints("joined").is_empty());
}

#[test]
fn test_unknown_item_validator() {
    let err = SchemaSet::load(fixtures_path().join("unknown_validator.toml")).unwrap_err();
    assert!(matches!(err, SchemaError::NotCallable { ref name, .. } if name == "shout"));
    assert!(err.to_string().starts_with("validate_item must be callable"));
}

#[test]
fn test_custom_item_validator() {
    let mut validators = ItemValidators::builtin();
    validators.register("shout", |field, item, errors| {
        let loud = item
            .as_str()
            .is_some_and(|s| s.chars().all(|c| !c.is_lowercase()));
        if !loud {
            errors.add(field.options().name(), "must be shouted");
        }
    });

    let set =
        SchemaSet::load_with(fixtures_path().join("unknown_validator.toml"), &validators).unwrap();
    let mut post = set.new_document("Post").unwrap();
    post.set("tags", vec!["HEY", "quiet"]).unwrap();

    assert_eq!(post.validate().full_messages(), vec!["Tags must be shouted"]);
}

#[test]
fn test_cyclic_embedding_rejected() {
    let err = SchemaSet::load(fixtures_path().join("cyclic.json")).unwrap_err();
    assert!(matches!(err, SchemaError::CircularReference(_)));
}

#[test]
fn test_embedding_a_top_level_document_rejected() {
    let err = SchemaSet::load(fixtures_path().join("not_embedded.toml")).unwrap_err();
    assert_eq!(err.to_string(), "expected Customer to be a subclass of EmbeddedDocument");
}

#[test]
fn test_unknown_document_reference() {
    let def = SchemaDefinition::from_json_str(
        r#"{
            "name": "s", "version": "0.1.0",
            "documents": [{ "name": "Order", "fields": [
                { "name": "lines", "type": "list", "document": "Line" }
            ]}]
        }"#,
    )
    .unwrap();

    let err = SchemaSet::from_definition(&def, &ItemValidators::builtin()).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownDocument(ref name) if name == "Line"));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.yaml");
    std::fs::write(&path, "name: shop").unwrap();

    assert!(matches!(SchemaSet::load(&path), Err(SchemaError::Io(_))));
}

#[test]
fn test_invalid_pattern_in_file() {
    let def = SchemaDefinition::from_toml_str(
        r#"
name = "s"
version = "0.1.0"

[[documents]]
name = "A"

[[documents.fields]]
name = "slug"
type = "string"
pattern = "("
"#,
    )
    .unwrap();

    let err = SchemaSet::from_definition(&def, &ItemValidators::builtin()).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidPattern { .. }));
}
