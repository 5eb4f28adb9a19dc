//! Validation error collection
//!
//! Every [`crate::Document`] owns one `Errors`. A validation pass resets it and each
//! field appends message fragments under its own name. Messages are rendered for end
//! users as `"<Label> <message>"`, where the label is the humanized field name.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Accumulated validation failures, grouped by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Errors {
    messages: IndexMap<String, Vec<String>>,
}

impl Errors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message for a field, creating the field's list if absent
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Remove all messages recorded for one field
    pub fn clear(&mut self, field: &str) {
        self.messages.shift_remove(field);
    }

    /// Remove every message
    pub fn clear_all(&mut self) {
        self.messages.clear();
    }

    /// Messages recorded for a field, without labels
    pub fn get(&self, field: &str) -> &[String] {
        self.messages.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of messages across all fields
    pub fn count(&self) -> usize {
        self.messages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Names of fields that have at least one message
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(field, _)| field.as_str())
    }

    /// Iterate `(field, message)` pairs in recorded order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.messages.iter().flat_map(|(field, messages)| {
            messages.iter().map(move |m| (field.as_str(), m.as_str()))
        })
    }

    /// Render every message as `"<Label> <message>"`
    pub fn full_messages(&self) -> Vec<String> {
        self.iter()
            .map(|(field, message)| format!("{} {}", humanize(field), message))
            .collect()
    }

    /// Reorder fields to match `order`; fields not listed keep their relative order
    /// after the listed ones.
    pub(crate) fn sort_by_declaration(&mut self, order: &[&str]) {
        let rank = |field: &str| order.iter().position(|n| *n == field).unwrap_or(usize::MAX);
        self.messages.sort_by(|a, _, b, _| rank(a).cmp(&rank(b)));
    }
}

/// Humanize a field name: underscores become spaces and each word is capitalized.
///
/// `"created_at"` becomes `"Created At"`. A letter starts a new word unless it
/// directly follows another letter.
pub fn humanize(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut prev_alpha = false;

    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_alpha {
                label.extend(c.to_lowercase());
            } else {
                label.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            label.push(c);
            prev_alpha = false;
        }
    }

    label
}
