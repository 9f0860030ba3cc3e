//! Deduplicating table of style values shared across nodes.

use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};

use super::node::StyleValue;

#[derive(Debug, Default)]
pub struct StyleTable {
    styles: BTreeMap<String, StyleValue>,
    /// Canonical JSON of each stored value to its id.
    ids: HashMap<String, String>,
}

impl StyleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` and return its id. Equal values always map to the same id.
    pub fn intern(&mut self, prefix: &str, value: StyleValue) -> String {
        let canonical = canonical_json(&value);
        if let Some(id) = self.ids.get(&canonical) {
            return id.clone();
        }
        let id = format!("{prefix}_{}", short_hash(&canonical));
        self.ids.insert(canonical, id.clone());
        self.styles.insert(id.clone(), value);
        id
    }

    /// Store `value` under a document style name. A value already in the
    /// table keeps its existing id, and a name bound to a different value
    /// falls back to a hashed id, so each value is stored once.
    pub fn intern_named(&mut self, name: &str, prefix: &str, value: StyleValue) -> String {
        let canonical = canonical_json(&value);
        if let Some(id) = self.ids.get(&canonical) {
            return id.clone();
        }
        if self.styles.contains_key(name) {
            return self.intern(prefix, value);
        }
        self.ids.insert(canonical, name.to_string());
        self.styles.insert(name.to_string(), value);
        name.to_string()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn into_styles(self) -> BTreeMap<String, StyleValue> {
        self.styles
    }
}

fn canonical_json(value: &StyleValue) -> String {
    // Struct fields serialize in declaration order, so equal values yield equal text.
    serde_json::to_string(value).unwrap_or_default()
}

/// First six upper-case hex digits of the SHA-256 of `input`.
pub(crate) fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest
        .iter()
        .take(3)
        .map(|b| format!("{b:02X}"))
        .collect()
}
