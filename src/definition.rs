//! Schema definition files
//!
//! Document classes can be declared in TOML or JSON instead of code:
//!
//! ```toml
//! name = "shop"
//! version = "1.2.0"
//!
//! [[documents]]
//! name = "Address"
//! embedded = true
//!
//! [[documents.fields]]
//! name = "city"
//! type = "string"
//! required = true
//!
//! [[documents]]
//! name = "Customer"
//!
//! [[documents.fields]]
//! name = "address"
//! type = "embedded"
//! document = "Address"
//! ```
//!
//! [`SchemaSet::from_definition`] compiles a definition into shared [`Schema`]s.
//! Documents may reference embedded documents declared later in the file.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;
use crate::document::{Document, Schema};
use crate::error::{Result, SchemaError};
use crate::field::{
    ArrayField, BaseField, BooleanField, DateTimeField, EmbeddedField, Field, FieldBuilder,
    FieldKind, FloatField, IntegerField, ItemValidators, ListField, ObjectIdField, StringField,
};
use crate::value::{parse_datetime, Value};

/// A versioned set of document declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    pub name: String,
    pub version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentDefinition>,
}

/// One document class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentDefinition {
    pub name: String,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// One field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<serde_json::Value>>,
    #[serde(default = "default_true")]
    pub persist: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Target document for embedded and list fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Name of a registered item validator, for array fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_item: Option<String>,
}

fn default_kind() -> FieldKind {
    FieldKind::Any
}

fn default_true() -> bool {
    true
}

impl SchemaDefinition {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a definition file, choosing the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(SchemaError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("unsupported definition format: {}", path.display()),
            ))),
        }
    }

    /// Fingerprint of the definition's content, independent of file format
    pub fn checksum(&self) -> Result<Checksum> {
        Ok(Checksum::from_json(&serde_json::to_value(self)?))
    }
}

impl FieldDefinition {
    fn allowed_options(&self) -> &'static [&'static str] {
        match self.kind {
            FieldKind::Float | FieldKind::Integer => &["min_value", "max_value"],
            FieldKind::String => &["length", "min_length", "max_length", "pattern"],
            FieldKind::Array => &["length", "min_length", "max_length", "validate_item"],
            FieldKind::Embedded | FieldKind::List => &["document"],
            FieldKind::Any | FieldKind::Boolean | FieldKind::DateTime | FieldKind::ObjectId => &[],
        }
    }

    fn given_options(&self) -> Vec<&'static str> {
        let given = [
            ("min_value", self.min_value.is_some()),
            ("max_value", self.max_value.is_some()),
            ("length", self.length.is_some()),
            ("min_length", self.min_length.is_some()),
            ("max_length", self.max_length.is_some()),
            ("pattern", self.pattern.is_some()),
            ("document", self.document.is_some()),
            ("validate_item", self.validate_item.is_some()),
        ];
        given
            .into_iter()
            .filter(|(_, set)| *set)
            .map(|(name, _)| name)
            .collect()
    }

    fn invalid(&self, reason: impl Into<String>) -> SchemaError {
        SchemaError::InvalidDefinition {
            field: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn check_options(&self) -> Result<()> {
        let allowed = self.allowed_options();
        if let Some(option) = self
            .given_options()
            .into_iter()
            .find(|option| !allowed.contains(option))
        {
            return Err(self.invalid(format!("{} does not apply to {} fields", option, self.kind)));
        }
        Ok(())
    }

    /// Parse a literal from the file, reading text as the field's own type
    fn literal(&self, json: &serde_json::Value) -> Result<Value> {
        match (self.kind, json) {
            (FieldKind::DateTime, serde_json::Value::String(text)) => {
                parse_datetime(text).map(Value::DateTime)
            }
            (FieldKind::ObjectId, serde_json::Value::String(text)) => {
                bson::oid::ObjectId::parse_str(text)
                    .map(Value::ObjectId)
                    .map_err(|e| self.invalid(e.to_string()))
            }
            _ => Value::from_json(json),
        }
    }

    fn apply_options<F: FieldBuilder>(&self, mut field: F) -> Result<F> {
        if matches!(self.kind, FieldKind::Embedded | FieldKind::List) {
            if self.default.is_some() || self.choices.is_some() {
                return Err(self.invalid(format!(
                    "{} fields take neither default nor choices",
                    self.kind
                )));
            }
        }

        field = field.required(self.required).persist(self.persist);

        if let Some(default) = &self.default {
            field = field.default(self.literal(default)?);
        }

        if let Some(choices) = &self.choices {
            let choices = choices
                .iter()
                .map(|c| self.literal(c))
                .collect::<Result<Vec<_>>>()?;
            field = field.choices(choices);
        }

        Ok(field)
    }

    fn integer_bound(&self, bound: Option<f64>, option: &str) -> Result<Option<i64>> {
        match bound {
            Some(b) if b.fract() != 0.0 => {
                Err(self.invalid(format!("{} must be a whole number for integer fields", option)))
            }
            // 2^63 is the first float past i64::MAX
            Some(b) if b < i64::MIN as f64 || b >= i64::MAX as f64 => {
                Err(self.invalid(format!("{} is out of range for integer fields", option)))
            }
            Some(b) => Ok(Some(b as i64)),
            None => Ok(None),
        }
    }

    fn target<'a>(&self, resolved: &'a HashMap<String, Arc<Schema>>) -> Result<&'a Arc<Schema>> {
        let name = self
            .document
            .as_deref()
            .ok_or_else(|| self.invalid(format!("{} fields need a document", self.kind)))?;
        resolved
            .get(name)
            .ok_or_else(|| SchemaError::UnknownDocument(name.to_string()))
    }

    fn compile(
        &self,
        resolved: &HashMap<String, Arc<Schema>>,
        validators: &ItemValidators,
    ) -> Result<Arc<dyn Field>> {
        self.check_options()?;

        let field: Arc<dyn Field> = match self.kind {
            FieldKind::Any => Arc::new(self.apply_options(BaseField::new(&self.name))?),
            FieldKind::Boolean => Arc::new(self.apply_options(BooleanField::new(&self.name))?),
            FieldKind::DateTime => Arc::new(self.apply_options(DateTimeField::new(&self.name))?),
            FieldKind::ObjectId => Arc::new(self.apply_options(ObjectIdField::new(&self.name))?),
            FieldKind::Float => {
                let mut field = FloatField::new(&self.name);
                if let Some(min) = self.min_value {
                    field = field.min_value(min);
                }
                if let Some(max) = self.max_value {
                    field = field.max_value(max);
                }
                Arc::new(self.apply_options(field)?)
            }
            FieldKind::Integer => {
                let mut field = IntegerField::new(&self.name);
                if let Some(min) = self.integer_bound(self.min_value, "min_value")? {
                    field = field.min_value(min);
                }
                if let Some(max) = self.integer_bound(self.max_value, "max_value")? {
                    field = field.max_value(max);
                }
                Arc::new(self.apply_options(field)?)
            }
            FieldKind::String => {
                let mut field = StringField::new(&self.name);
                if let Some(length) = self.length {
                    field = field.length(length);
                }
                if let Some(min) = self.min_length {
                    field = field.min_length(min);
                }
                if let Some(max) = self.max_length {
                    field = field.max_length(max);
                }
                if let Some(pattern) = &self.pattern {
                    field = field.pattern(pattern)?;
                }
                Arc::new(self.apply_options(field)?)
            }
            FieldKind::Array => {
                let mut field = ArrayField::new(&self.name);
                if let Some(length) = self.length {
                    field = field.length(length);
                }
                if let Some(min) = self.min_length {
                    field = field.min_length(min);
                }
                if let Some(max) = self.max_length {
                    field = field.max_length(max);
                }
                if let Some(name) = &self.validate_item {
                    let validator =
                        validators
                            .get(name)
                            .ok_or_else(|| SchemaError::NotCallable {
                                field: self.name.clone(),
                                name: name.clone(),
                            })?;
                    field = field.named_item_validator(name.clone(), validator);
                }
                Arc::new(self.apply_options(field)?)
            }
            FieldKind::Embedded => {
                let schema = Arc::clone(self.target(resolved)?);
                Arc::new(self.apply_options(EmbeddedField::new(&self.name, schema)?)?)
            }
            FieldKind::List => {
                let schema = Arc::clone(self.target(resolved)?);
                Arc::new(self.apply_options(ListField::new(&self.name, schema)?)?)
            }
        };

        Ok(field)
    }
}

impl DocumentDefinition {
    /// Documents this one embeds or lists
    fn references(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Embedded | FieldKind::List))
            .filter_map(|f| f.document.as_deref())
    }

    fn compile(
        &self,
        resolved: &HashMap<String, Arc<Schema>>,
        validators: &ItemValidators,
    ) -> Result<Arc<Schema>> {
        let mut builder = if self.embedded {
            Schema::embedded(&self.name)
        } else {
            Schema::builder(&self.name)
        };

        for field in &self.fields {
            builder = builder.shared_field(field.compile(resolved, validators)?);
        }

        builder.build()
    }
}

/// Compiled document classes from one definition
#[derive(Debug, Clone)]
pub struct SchemaSet {
    name: String,
    version: Version,
    checksum: Checksum,
    schemas: IndexMap<String, Arc<Schema>>,
}

impl SchemaSet {
    /// Compile every document in `definition`.
    ///
    /// Embedded documents are compiled before the documents that reference them,
    /// whatever their order in the file.
    pub fn from_definition(
        definition: &SchemaDefinition,
        validators: &ItemValidators,
    ) -> Result<Self> {
        let mut declared = HashSet::new();
        for doc in &definition.documents {
            if !declared.insert(doc.name.as_str()) {
                return Err(SchemaError::DuplicateDocument(doc.name.clone()));
            }
        }

        let mut resolved: HashMap<String, Arc<Schema>> = HashMap::new();
        let mut pending: Vec<&DocumentDefinition> = definition.documents.iter().collect();

        while !pending.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|doc| doc.references().all(|r| resolved.contains_key(r)));

            if ready.is_empty() {
                return Err(unresolved(&blocked, &declared));
            }

            for doc in ready {
                tracing::debug!(schema = %definition.name, document = %doc.name, "compiled document");
                let schema = doc.compile(&resolved, validators)?;
                resolved.insert(doc.name.clone(), schema);
            }
            pending = blocked;
        }

        let schemas = definition
            .documents
            .iter()
            .filter_map(|doc| {
                resolved
                    .get(&doc.name)
                    .map(|schema| (doc.name.clone(), Arc::clone(schema)))
            })
            .collect();

        Ok(Self {
            name: definition.name.clone(),
            version: definition.version.clone(),
            checksum: definition.checksum()?,
            schemas,
        })
    }

    /// Load and compile a definition file with the built-in item validators
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, &ItemValidators::builtin())
    }

    pub fn load_with(path: impl AsRef<Path>, validators: &ItemValidators) -> Result<Self> {
        let definition = SchemaDefinition::load(path)?;
        Self::from_definition(&definition, validators)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Like `get`, but a missing document is an error
    pub fn require(&self, name: &str) -> Result<Arc<Schema>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownDocument(name.to_string()))
    }

    /// Document names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn new_document(&self, name: &str) -> Result<Document> {
        Ok(Document::new(self.require(name)?))
    }
}

/// Pick the error explaining why no blocked document can be compiled
fn unresolved(blocked: &[&DocumentDefinition], declared: &HashSet<&str>) -> SchemaError {
    let missing = blocked
        .iter()
        .flat_map(|doc| doc.references())
        .find(|r| !declared.contains(r));

    match missing {
        Some(name) => SchemaError::UnknownDocument(name.to_string()),
        None => SchemaError::CircularReference(
            blocked.first().map(|d| d.name.clone()).unwrap_or_default(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;

    const SHOP: &str = r#"
name = "shop"
version = "1.2.0"

[[documents]]
name = "Customer"

[[documents.fields]]
name = "email"
type = "string"
required = true
pattern = "[^@]+@[^@]+"

[[documents.fields]]
name = "tier"
type = "string"
default = "basic"
choices = ["basic", "gold"]

[[documents.fields]]
name = "address"
type = "embedded"
document = "Address"

[[documents]]
name = "Address"
embedded = true

[[documents.fields]]
name = "city"
type = "string"
required = true
"#;

    #[test]
    fn test_parse_toml() {
        let def = SchemaDefinition::from_toml_str(SHOP).unwrap();
        assert_eq!(def.name, "shop");
        assert_eq!(def.version, Version::new(1, 2, 0));
        assert_eq!(def.documents.len(), 2);
        assert_eq!(def.documents[0].fields[0].kind, FieldKind::String);
        assert!(def.documents[1].embedded);
    }

    #[test]
    fn test_forward_references_resolve() {
        let def = SchemaDefinition::from_toml_str(SHOP).unwrap();
        let set = SchemaSet::from_definition(&def, &ItemValidators::builtin()).unwrap();

        assert_eq!(set.names().collect::<Vec<_>>(), vec!["Customer", "Address"]);
        assert_eq!(set.require("Address").unwrap().kind(), DocumentKind::Embedded);

        let mut customer = set.new_document("Customer").unwrap();
        assert_eq!(customer.get("tier").unwrap(), &Value::from("basic"));
        assert_eq!(
            customer.validate().full_messages(),
            vec!["Email is required"]
        );
    }

    #[test]
    fn test_unknown_option_for_kind() {
        let json = r#"{
            "name": "s", "version": "0.1.0",
            "documents": [{ "name": "A", "fields": [
                { "name": "flag", "type": "boolean", "min_length": 2 }
            ]}]
        }"#;
        let def = SchemaDefinition::from_json_str(json).unwrap();
        let err = SchemaSet::from_definition(&def, &ItemValidators::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_fractional_integer_bound() {
        let json = r#"{
            "name": "s", "version": "0.1.0",
            "documents": [{ "name": "A", "fields": [
                { "name": "count", "type": "integer", "max_value": 2.5 }
            ]}]
        }"#;
        let def = SchemaDefinition::from_json_str(json).unwrap();
        assert!(SchemaSet::from_definition(&def, &ItemValidators::new()).is_err());
    }

    #[test]
    fn test_integer_bound_out_of_range() {
        let json = r#"{
            "name": "s", "version": "0.1.0",
            "documents": [{ "name": "A", "fields": [
                { "name": "count", "type": "integer", "max_value": 1e30 }
            ]}]
        }"#;
        let def = SchemaDefinition::from_json_str(json).unwrap();
        let err = SchemaSet::from_definition(&def, &ItemValidators::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDefinition { ref reason, .. }
            if reason.contains("out of range")));
    }

    #[test]
    fn test_misspelled_document_option_rejected() {
        let toml = r#"
name = "s"
version = "0.1.0"

[[documents]]
name = "Address"
embeded = true
"#;
        let err = SchemaDefinition::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, SchemaError::Toml(_)));

        let json = r#"{ "name": "s", "version": "0.1.0", "documnets": [] }"#;
        assert!(SchemaDefinition::from_json_str(json).is_err());
    }

    #[test]
    fn test_duplicate_documents() {
        let json = r#"{
            "name": "s", "version": "0.1.0",
            "documents": [{ "name": "A" }, { "name": "A" }]
        }"#;
        let def = SchemaDefinition::from_json_str(json).unwrap();
        let err = SchemaSet::from_definition(&def, &ItemValidators::new()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateDocument(name) if name == "A"));
    }

    #[test]
    fn test_cycle_detected() {
        let json = r#"{
            "name": "s", "version": "0.1.0",
            "documents": [
                { "name": "A", "embedded": true, "fields": [
                    { "name": "b", "type": "embedded", "document": "B" }
                ]},
                { "name": "B", "embedded": true, "fields": [
                    { "name": "a", "type": "embedded", "document": "A" }
                ]}
            ]
        }"#;
        let def = SchemaDefinition::from_json_str(json).unwrap();
        let err = SchemaSet::from_definition(&def, &ItemValidators::new()).unwrap_err();
        assert!(matches!(err, SchemaError::CircularReference(_)));
    }

    #[test]
    fn test_checksum_ignores_format() {
        let toml_def = SchemaDefinition::from_toml_str(SHOP).unwrap();
        let json = serde_json::to_string_pretty(&toml_def).unwrap();
        let json_def = SchemaDefinition::from_json_str(&json).unwrap();
        assert_eq!(toml_def.checksum().unwrap(), json_def.checksum().unwrap());
    }
}
