use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Roll percentages keyed by identification, in the order they were recorded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RollRecord {
    entries: Vec<(String, f64)>,
}

impl RollRecord {
    pub fn new() -> Self {
        RollRecord { entries: Vec::new() }
    }

    /// Set a roll, keeping the original position if the key already exists
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f64)> for RollRecord {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut record = RollRecord::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl Serialize for RollRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct RollRecordVisitor;

impl<'de> Visitor<'de> for RollRecordVisitor {
    type Value = RollRecord;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of identification keys to roll percentages")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut record = RollRecord::new();
        while let Some((key, value)) = access.next_entry::<String, f64>()? {
            record.insert(key, value);
        }
        Ok(record)
    }
}

impl<'de> Deserialize<'de> for RollRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RollRecordVisitor)
    }
}

/// A shiny tracker attached to a rolled item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShinyStat {
    pub key: String,
    pub display_name: String,
    pub value: i64,
    #[serde(default)]
    pub reroll_count: u32,
}

/// A specific rolled instance of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RolledItem {
    pub item_name: String,
    /// Roll percentage per identification
    pub identifications: RollRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powder_slots: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shiny_stat: Option<ShinyStat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reroll_count: Option<u32>,
}

impl RolledItem {
    pub fn new(item_name: impl Into<String>, identifications: RollRecord) -> Self {
        RolledItem {
            item_name: item_name.into(),
            identifications,
            powder_slots: None,
            shiny_stat: None,
            reroll_count: None,
        }
    }

    /// Export to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error in '{}': {source}", .path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("Invalid rolled item data in '{}': {source}", .path.display())]
    Json {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },
}

/// Collection of rolled items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolledItemCollection {
    pub items: Vec<RolledItem>,
}

impl RolledItemCollection {
    pub fn new() -> Self {
        RolledItemCollection { items: Vec::new() }
    }

    pub fn add(&mut self, item: RolledItem) {
        self.items.push(item);
    }

    /// Rolls recorded for one item
    pub fn for_item<'a>(&'a self, item_name: &'a str) -> impl Iterator<Item = &'a RolledItem> {
        self.items.iter().filter(move |r| r.item_name == item_name)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| StorageError::Json {
            source: e,
            path: path.to_path_buf(),
        })?;
        std::fs::write(path, json).map_err(|e| StorageError::Io {
            source: e,
            path: path.to_path_buf(),
        })?;
        log::debug!("saved {} rolled items to {}", self.items.len(), path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, StorageError> {
        let json = std::fs::read_to_string(path).map_err(|e| StorageError::Io {
            source: e,
            path: path.to_path_buf(),
        })?;
        serde_json::from_str(&json).map_err(|e| StorageError::Json {
            source: e,
            path: path.to_path_buf(),
        })
    }

    /// Load a collection, treating a missing file as empty
    pub fn load_or_default(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        Self::load_from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_insertion_order() {
        let json = r#"{"walkSpeed": 101.5, "rawAirDamage": 88.0, "1stSpellCost": 72.0}"#;
        let record: RollRecord = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["walkSpeed", "rawAirDamage", "1stSpellCost"]);

        let out = serde_json::to_string(&record).unwrap();
        assert_eq!(out, r#"{"walkSpeed":101.5,"rawAirDamage":88.0,"1stSpellCost":72.0}"#);
    }

    #[test]
    fn test_record_insert_overwrites_in_place() {
        let mut record = RollRecord::new();
        record.insert("a", 1.0);
        record.insert("b", 2.0);
        record.insert("a", 3.0);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(3.0));
        assert_eq!(record.iter().next(), Some(("a", 3.0)));
    }

    #[test]
    fn test_rolled_item_json() {
        let json = r#"{
            "item_name": "Breezer",
            "identifications": {"rawAirDamage": 112.0},
            "reroll_count": 4
        }"#;
        let rolled = RolledItem::from_json(json).unwrap();
        assert_eq!(rolled.item_name, "Breezer");
        assert_eq!(rolled.reroll_count, Some(4));
        assert!(rolled.shiny_stat.is_none());

        let back = RolledItem::from_json(&rolled.to_json().unwrap()).unwrap();
        assert_eq!(back, rolled);
    }

    #[test]
    fn test_collection_file_io() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolls.json");

        let mut record = RollRecord::new();
        record.insert("rawHealth", 99.0);
        let mut collection = RolledItemCollection::new();
        collection.add(RolledItem::new("Gaia", record.clone()));
        collection.add(RolledItem::new("Breezer", record));
        collection.save_to_file(&path).unwrap();

        let loaded = RolledItemCollection::load_from_file(&path).unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.for_item("Gaia").count(), 1);
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = RolledItemCollection::load_or_default(&dir.path().join("none.json")).unwrap();
        assert!(loaded.items.is_empty());

        let err = RolledItemCollection::load_from_file(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = RolledItemCollection::load_from_file(&path).unwrap_err();
        assert!(matches!(err, StorageError::Json { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
