//! Declarative document schemas
//!
//! Field descriptors for document-oriented data models: each field coerces what is
//! assigned to it, supplies a default when read unset, and reports validation
//! failures into a per-document error collection.
//!
//! ## Features
//!
//! - **Typed fields**: boolean, date-time, float, integer, object id, string, array
//! - **Embedded documents**: single nested documents and lists of them, owned per instance
//! - **Shared options**: `required`, `default`, `choices`, `persist` on every field
//! - **Accumulated errors**: validation never fails fast, it collects human-readable messages
//! - **Definition files**: declare schemas in TOML or JSON, fingerprinted with SHA256
//!
//! ## Architecture
//!
//! ```text
//! SchemaSet ── Schema (Arc, shared) ── [Arc<dyn Field>]
//!                  │
//!               Document ── Slots ("_name" -> Value)
//!                  └─────── Errors
//! ```

pub mod checksum;
pub mod config;
pub mod definition;
pub mod document;
pub mod embedded_list;
pub mod error;
pub mod errors;
pub mod field;
pub mod value;

pub use checksum::Checksum;
pub use config::ValidatorConfig;
pub use definition::{SchemaDefinition, SchemaSet};
pub use document::{copy_fields, Document, DocumentKind, FieldAccess, Schema, SchemaBuilder};
pub use embedded_list::EmbeddedList;
pub use error::{Result, SchemaError};
pub use errors::{humanize, Errors};
pub use value::Value;

/// Everything needed to declare and use schemas in code
pub mod prelude {
    pub use crate::document::{Document, Schema};
    pub use crate::errors::Errors;
    pub use crate::field::{
        ArrayField, BaseField, BooleanField, DateTimeField, EmbeddedField, Field, FieldBuilder,
        FloatField, IntegerField, ListField, ObjectIdField, StringField,
    };
    pub use crate::value::Value;
}
