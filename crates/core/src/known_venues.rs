//! Read-only table of known scrape-target venues.
//!
//! Maps a calendar's `source_venue_key` to the venue's canonical name and
//! location. Loaded once at startup and passed by reference through the
//! import context; tests build their own synthetic tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One scrape target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownVenue {
    pub key: String,
    pub name: String,
    pub city: String,
    pub state: String,
}

/// Immutable lookup keyed by lowercase source key.
#[derive(Debug, Clone, Default)]
pub struct KnownVenues {
    by_key: HashMap<String, KnownVenue>,
}

impl KnownVenues {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from entries. Later entries with the same key replace earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = KnownVenue>) -> Self {
        let by_key = entries
            .into_iter()
            .map(|entry| (lookup_key(&entry.key), entry))
            .collect();
        Self { by_key }
    }

    /// Parse a JSON array of `{key, name, city, state}` objects.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let entries: Vec<KnownVenue> = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid known-venue table: {e}")))?;
        for entry in &entries {
            if entry.key.trim().is_empty() || entry.name.trim().is_empty() {
                return Err(CoreError::Validation(
                    "Known-venue entries need a non-empty key and name".to_string(),
                ));
            }
        }
        Ok(Self::from_entries(entries))
    }

    pub fn get(&self, source_venue_key: &str) -> Option<&KnownVenue> {
        self.by_key.get(&lookup_key(source_venue_key))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

fn lookup_key(key: &str) -> String {
    key.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        {"key": "valley-bar", "name": "Valley Bar", "city": "Phoenix", "state": "AZ"},
        {"key": "crescent", "name": "Crescent Ballroom", "city": "Phoenix", "state": "AZ"}
    ]"#;

    #[test]
    fn loads_json_table() {
        let table = KnownVenues::from_json(TABLE).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("crescent").unwrap().name, "Crescent Ballroom");
    }

    #[test]
    fn key_lookup_is_case_insensitive() {
        let table = KnownVenues::from_json(TABLE).unwrap();
        assert!(table.get(" Valley-Bar ").is_some());
        assert!(table.get("rebel-lounge").is_none());
    }

    #[test]
    fn rejects_blank_keys() {
        let err = KnownVenues::from_json(r#"[{"key": "", "name": "X", "city": "", "state": ""}]"#)
            .unwrap_err();
        assert!(err.to_string().contains("non-empty key"));
    }

    #[test]
    fn empty_table() {
        assert!(KnownVenues::empty().is_empty());
    }
}
