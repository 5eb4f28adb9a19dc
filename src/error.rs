//! Error types for schema construction and document access
//!
//! Validation failures are never reported through this type; they accumulate in
//! [`crate::Errors`]. A `SchemaError` means the schema itself (or the way a document
//! is being addressed) is wrong.

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema construction and access errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("expected {type_name} to be a subclass of EmbeddedDocument")]
    NotEmbedded { type_name: String },

    #[error("expected an instance of {expected}, got {actual}")]
    WrongDocumentType { expected: String, actual: String },

    #[error("index {index} is out of bounds for {field} (length {len})")]
    IndexOutOfBounds {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("{document} has no field named {field}")]
    UnknownField { document: String, field: String },

    #[error("{document} declares field {field} more than once")]
    DuplicateField { document: String, field: String },

    #[error("field {field} holds {actual}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Document {0} is defined more than once")]
    DuplicateDocument(String),

    #[error("Circular embedded reference involving {0}")]
    CircularReference(String),

    #[error("Invalid pattern for field {field}: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("validate_item must be callable: no item validator named {name} for field {field}")]
    NotCallable { field: String, name: String },

    #[error("Invalid field definition for {field}: {reason}")]
    InvalidDefinition { field: String, reason: String },

    #[error("Invalid JSON document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
