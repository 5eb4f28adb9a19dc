//! Ordered container of embedded documents
//!
//! A [`ListField`](crate::field::ListField) slot holds one `EmbeddedList`. The list is
//! scoped to a single embedded schema and rejects documents of any other type on
//! insertion.

use std::sync::Arc;

use crate::document::{Document, Schema};
use crate::error::{Result, SchemaError};

/// A homogeneous list of embedded documents
#[derive(Debug, Clone)]
pub struct EmbeddedList {
    name: String,
    schema: Arc<Schema>,
    items: Vec<Document>,
}

impl EmbeddedList {
    /// Create an empty list for the field `name`, accepting documents of `schema`
    pub fn new(name: impl Into<String>, schema: Arc<Schema>) -> Self {
        Self {
            name: name.into(),
            schema,
            items: Vec::new(),
        }
    }

    /// Name of the owning field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema every item must belong to
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Create a fresh, empty document of the list's type without inserting it
    pub fn new_item(&self) -> Document {
        Document::new(Arc::clone(&self.schema))
    }

    fn check(&self, doc: &Document) -> Result<()> {
        if !Arc::ptr_eq(doc.schema(), &self.schema) {
            return Err(SchemaError::WrongDocumentType {
                expected: self.schema.name().to_string(),
                actual: doc.schema().name().to_string(),
            });
        }
        Ok(())
    }

    pub fn push(&mut self, doc: Document) -> Result<()> {
        self.check(&doc)?;
        self.items.push(doc);
        Ok(())
    }

    /// Insert at `index`, shifting later items. Fails when `index > len`.
    pub fn insert(&mut self, index: usize, doc: Document) -> Result<()> {
        self.check(&doc)?;
        if index > self.items.len() {
            return Err(SchemaError::IndexOutOfBounds {
                field: self.name.clone(),
                index,
                len: self.items.len(),
            });
        }
        self.items.insert(index, doc);
        Ok(())
    }

    /// Append every document, stopping at the first one of the wrong type.
    /// Documents before the rejected one stay inserted.
    pub fn extend(&mut self, docs: impl IntoIterator<Item = Document>) -> Result<()> {
        for doc in docs {
            self.push(doc)?;
        }
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Document> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn pop(&mut self) -> Option<Document> {
        self.items.pop()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Document> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Document> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for EmbeddedList {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.schema.name() == other.schema.name()
            && self.items == other.items
    }
}

impl<'a> IntoIterator for &'a EmbeddedList {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
