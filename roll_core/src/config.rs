use crate::identification::is_known_identification;
use crate::item::Item;
use crate::ranking::Weight;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Item definitions and scoring weights loaded from TOML files
#[derive(Debug, Clone, Default)]
pub struct ItemDatabase {
    pub items: HashMap<String, Item>,
    /// Weights grouped by item name
    pub weights: HashMap<String, Vec<Weight>>,
}

impl ItemDatabase {
    /// Load the database from a directory
    /// Expected structure:
    ///   config/
    ///     items/    - .toml files containing [[items]] arrays
    ///     weights/  - .toml files containing [[weights]] arrays
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let mut db = ItemDatabase::default();

        for path in Self::toml_files(&dir.join("items"))? {
            let content = Self::read_file_with_context(&path)?;
            let wrapper: ItemsWrapper = Self::parse_toml_with_context(&content, &path)?;
            db.insert_items(wrapper.items, &path)?;
        }

        for path in Self::toml_files(&dir.join("weights"))? {
            let content = Self::read_file_with_context(&path)?;
            let wrapper: WeightsWrapper = Self::parse_toml_with_context(&content, &path)?;
            db.insert_weights(wrapper.weights);
        }

        log::info!(
            "loaded {} items and {} weight sets from {}",
            db.items.len(),
            db.weights.values().map(Vec::len).sum::<usize>(),
            dir.display()
        );

        Ok(db)
    }

    /// Parse a single document holding `[[items]]` and `[[weights]]` arrays
    pub fn load_from_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let wrapper: DocumentWrapper = Self::parse_toml_with_context(content, origin)?;
        let mut db = ItemDatabase::default();
        db.insert_items(wrapper.items, origin)?;
        db.insert_weights(wrapper.weights);
        Ok(db)
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    /// All item names, sorted
    pub fn item_names(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.items.keys().collect();
        names.sort();
        names
    }

    pub fn weights_for(&self, item_name: &str) -> &[Weight] {
        self.weights.get(item_name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn insert_items(&mut self, items: Vec<Item>, path: &Path) -> Result<(), ConfigError> {
        for item in items {
            for key in item.identifications.keys() {
                if !is_known_identification(key) {
                    log::warn!("{}: unknown identification '{}' on {}", path.display(), key, item.name);
                }
            }

            if self.items.contains_key(&item.name) {
                return Err(ConfigError::DuplicateItem {
                    name: item.name,
                    path: path.to_path_buf(),
                });
            }
            self.items.insert(item.name.clone(), item);
        }
        Ok(())
    }

    fn insert_weights(&mut self, weights: Vec<Weight>) {
        for weight in weights {
            self.weights.entry(weight.item_name.clone()).or_default().push(weight);
        }
    }

    /// `.toml` files in a directory, sorted so load order is stable
    fn toml_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in Self::read_dir_with_context(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == "toml") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    // Helper functions for error context

    fn read_dir_with_context(dir: &Path) -> Result<std::fs::ReadDir, ConfigError> {
        std::fs::read_dir(dir).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(dir.to_path_buf()),
        })
    }

    fn read_file_with_context(path: &Path) -> Result<String, ConfigError> {
        std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(path.to_path_buf()),
        })
    }

    fn parse_toml_with_context<T: serde::de::DeserializeOwned>(
        content: &str,
        path: &Path,
    ) -> Result<T, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            error: e,
            path: path.to_path_buf(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error with optional file path
    #[error("IO error{}: {error}", .path.as_ref().map(|p| format!(" in '{}'", p.display())).unwrap_or_default())]
    Io {
        #[source]
        error: std::io::Error,
        path: Option<PathBuf>,
    },
    /// TOML parse error with file path and location details
    #[error("Parse error in '{}': {error}", .path.display())]
    Parse {
        #[source]
        error: toml::de::Error,
        path: PathBuf,
    },
    /// The same item name appears twice
    #[error("Duplicate item '{name}' in '{}'", .path.display())]
    DuplicateItem { name: String, path: PathBuf },
}

impl ConfigError {
    /// Get the file path associated with this error, if any
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => path.as_deref(),
            ConfigError::Parse { path, .. } => Some(path),
            ConfigError::DuplicateItem { path, .. } => Some(path),
        }
    }

    /// Get a user-friendly description of where the error occurred
    pub fn location_description(&self) -> String {
        match self {
            ConfigError::Io { path: None, .. } => "Unknown location".to_string(),
            ConfigError::Parse { error, path } => {
                let mut desc = format!("File: {}", path.display());
                if let Some(span) = error.span() {
                    desc.push_str(&format!("\nPosition: bytes {}..{}", span.start, span.end));
                }
                desc
            }
            _ => match self.file_path() {
                Some(p) => format!("File: {}", p.display()),
                None => "Unknown location".to_string(),
            },
        }
    }

    /// Get the underlying error message
    pub fn error_message(&self) -> String {
        match self {
            ConfigError::Io { error, .. } => error.to_string(),
            // The span is shown separately
            ConfigError::Parse { error, .. } => {
                let message = error.message().trim();
                if message.is_empty() {
                    let full = error.to_string();
                    full.lines()
                        .map(str::trim)
                        .find(|line| !line.is_empty())
                        .unwrap_or("invalid TOML")
                        .to_string()
                } else {
                    message.to_string()
                }
            }
            ConfigError::DuplicateItem { name, .. } => format!("Item '{}' is defined twice", name),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io {
            error: e,
            path: None,
        }
    }
}

// Wrapper types for TOML parsing

#[derive(Deserialize)]
struct ItemsWrapper {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Deserialize)]
struct WeightsWrapper {
    #[serde(default)]
    weights: Vec<Weight>,
}

#[derive(Deserialize)]
struct DocumentWrapper {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    weights: Vec<Weight>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Rarity, StatRange};

    const ITEMS: &str = r#"
[[items]]
name = "Breezer"
rarity = "legendary"
level = 95

[items.identifications]
rawAirDamage = { min = 50, max = 150, raw = 150 }
"1stSpellCost" = { min = -6, max = -3, raw = -5 }
rawAgility = 7

[[items]]
name = "Gaia"
rarity = "mythic"
level = 97

[items.identifications]
rawHealth = { min = 750, max = 3250, raw = 2500 }
"#;

    const WEIGHTS: &str = r#"
[[weights]]
weight_id = "w1"
weight_name = "Spellcaster"
item_name = "Breezer"

[weights.identifications]
rawAirDamage = 0.6
"1stSpellCost" = -0.4
"#;

    #[test]
    fn test_load_from_str() {
        let db = ItemDatabase::load_from_str(ITEMS, Path::new("inline.toml")).unwrap();
        assert_eq!(db.item_names(), vec!["Breezer", "Gaia"]);

        let breezer = db.get("Breezer").unwrap();
        assert_eq!(breezer.rarity, Rarity::Legendary);
        assert_eq!(breezer.ranges()["rawAirDamage"], StatRange::new(50, 150, 150));
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("items")).unwrap();
        std::fs::create_dir(dir.path().join("weights")).unwrap();
        std::fs::write(dir.path().join("items/legendary.toml"), ITEMS).unwrap();
        std::fs::write(dir.path().join("items/notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("weights/breezer.toml"), WEIGHTS).unwrap();

        let db = ItemDatabase::load_from_dir(dir.path()).unwrap();
        assert_eq!(db.items.len(), 2);
        assert_eq!(db.weights_for("Breezer").len(), 1);
        assert!(db.weights_for("Gaia").is_empty());
    }

    #[test]
    fn test_bundled_config_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config");
        let db = ItemDatabase::load_from_dir(&dir).unwrap();
        assert_eq!(db.item_names(), vec!["Breezer", "Cinderchain", "Gaia", "Nirvana"]);
        assert_eq!(db.weights_for("Nirvana").len(), 1);

        for item in db.items.values() {
            for key in item.identifications.keys() {
                assert!(is_known_identification(key), "{} on {}", key, item.name);
            }
        }
    }

    #[test]
    fn test_missing_dirs_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = ItemDatabase::load_from_dir(dir.path()).unwrap();
        assert!(db.items.is_empty());
        assert!(db.weights.is_empty());
    }

    #[test]
    fn test_parse_error_has_location() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("items")).unwrap();
        std::fs::write(dir.path().join("items/broken.toml"), "[[items]]\nname = ").unwrap();

        let err = ItemDatabase::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.file_path().unwrap().ends_with("broken.toml"));
        assert!(err.location_description().contains("broken.toml"));
        assert!(!err.error_message().is_empty());
    }

    #[test]
    fn test_syntax_and_type_errors_have_messages() {
        let syntax = ItemDatabase::load_from_str("[[items]]\nname = ", Path::new("broken.toml")).unwrap_err();
        assert!(!syntax.error_message().trim().is_empty());
        assert!(syntax.location_description().contains("Position: bytes"));

        let typed = ItemDatabase::load_from_str("[[items]]\nname = \"A\"\nlevel = \"x\"\n", Path::new("typed.toml"))
            .unwrap_err();
        assert!(typed.error_message().contains("invalid type"));
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let doubled = format!("{}\n{}", ITEMS, "[[items]]\nname = \"Gaia\"\n");
        let err = ItemDatabase::load_from_str(&doubled, Path::new("dup.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateItem { ref name, .. } if name == "Gaia"));
        assert_eq!(err.to_string(), "Duplicate item 'Gaia' in 'dup.toml'");
    }
}
