//! Checksums for schema definition fingerprints

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA256 checksum of a schema definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Compute checksum from a string
    pub fn of_str(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Compute checksum from a JSON value.
    ///
    /// Object keys serialize sorted, so two definitions that differ only in key
    /// order or formatting share a checksum.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let canonical = serde_json::to_string(&canonicalize(value)).unwrap_or_default();
        Self::of_str(&canonical)
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for display
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }

    pub fn verify(&self, content: &str) -> bool {
        self.0 == Self::of_str(content).0
    }

    pub fn verify_json(&self, value: &serde_json::Value) -> bool {
        self.0 == Self::from_json(value).0
    }
}

/// Rebuild objects with their keys inserted in sorted order
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Checksum {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Checksum {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checksum_consistency() {
        let content = r#"{"name": "shop", "version": "1.0.0"}"#;
        assert_eq!(Checksum::of_str(content), Checksum::of_str(content));
        assert_eq!(Checksum::of_str(content).as_str().len(), 64);
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(
            Checksum::of_str(r#"{"name": "a"}"#),
            Checksum::of_str(r#"{"name": "b"}"#)
        );
    }

    #[test]
    fn test_json_checksum_ignores_key_order() {
        let a: serde_json::Value = serde_json::from_str(r#"{"a": 1, "b": [1, 2]}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{ "b": [1, 2],  "a": 1 }"#).unwrap();
        assert_eq!(Checksum::from_json(&a), Checksum::from_json(&b));
        assert!(Checksum::from_json(&a).verify_json(&b));
        assert!(!Checksum::from_json(&a).verify_json(&json!({ "a": 2 })));
    }

    #[test]
    fn test_checksum_verification() {
        let checksum = Checksum::of_str("content");
        assert!(checksum.verify("content"));
        assert!(!checksum.verify("different content"));
        assert_eq!(checksum.short().len(), 12);
    }
}
