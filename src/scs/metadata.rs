//! Ordered key/value metadata attached to a construction node.
//!
//! Entry order is the authoring order and is preserved for display. Lookups
//! are linear; nodes rarely carry more than a handful of entries.

use serde::{Deserialize, Serialize};

use crate::core::error::{ConstructError, Result};

/// One metadata key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// Metadata entries, unique on key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataStore {
    entries: Vec<MetadataEntry>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the value for `key`
    pub fn set_meta_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.find_index_for_key(&key) {
            Some(index) => self.entries[index].value = value,
            None => self.entries.push(MetadataEntry { key, value }),
        }
    }

    /// Value for `key`
    ///
    /// Absence is a caller error; check with `find_index_for_key` first when
    /// a missing key is expected.
    pub fn get_meta_data(&self, key: &str) -> Result<&str> {
        self.find_index_for_key(key)
            .map(|index| self.entries[index].value.as_str())
            .ok_or_else(|| ConstructError::KeyNotFound(key.to_string()))
    }

    /// Remove `key` if present
    pub fn remove_meta_data(&mut self, key: &str) {
        if let Some(index) = self.find_index_for_key(key) {
            self.entries.remove(index);
        }
    }

    /// Position of `key` in the entry list
    pub fn find_index_for_key(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key == key)
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that appear more than once (only possible in hand-edited data)
    pub(crate) fn duplicate_keys(&self) -> Vec<&str> {
        let mut duplicates = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let seen_before = self.entries[..index].iter().any(|e| e.key == entry.key);
            if seen_before && !duplicates.contains(&entry.key.as_str()) {
                duplicates.push(entry.key.as_str());
            }
        }
        duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_is_upsert() {
        let mut store = MetadataStore::new();
        store.set_meta_data("tooltip", "Front door");
        store.set_meta_data("category", "Doors");
        store.set_meta_data("tooltip", "Main door");

        assert_eq!(store.len(), 2);
        assert_eq!(store.get_meta_data("tooltip").unwrap(), "Main door");
        // Overwrite keeps the original position
        assert_eq!(store.find_index_for_key("tooltip"), Some(0));
    }

    #[test]
    fn test_set_then_remove_reports_missing() {
        let mut store = MetadataStore::new();
        store.set_meta_data("tooltip", "Front door");
        store.remove_meta_data("tooltip");

        assert_eq!(store.find_index_for_key("tooltip"), None);
        assert!(matches!(
            store.get_meta_data("tooltip"),
            Err(ConstructError::KeyNotFound(key)) if key == "tooltip"
        ));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = MetadataStore::new();
        store.set_meta_data("a", "1");
        store.remove_meta_data("b");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_keys_from_raw_data() {
        let store: MetadataStore = serde_json::from_str(
            r#"[{"key":"a","value":"1"},{"key":"b","value":"2"},{"key":"a","value":"3"}]"#,
        )
        .unwrap();
        assert_eq!(store.duplicate_keys(), vec!["a"]);
    }
}
