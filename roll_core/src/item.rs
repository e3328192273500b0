use crate::identification::identification_cost;
use crate::roll::{overall_percentage, process_identifications, IdentificationStat};
use crate::storage::RolledItem;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An item definition from the item database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    /// Display name, also the database key
    pub name: String,
    /// Name the game uses internally (defaults to `name`)
    #[serde(default)]
    pub internal_name: String,
    #[serde(default)]
    pub rarity: Rarity,
    /// Combat level requirement
    #[serde(default)]
    pub level: u32,
    /// Weapon or armour type (e.g. "spear", "helmet")
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub attack_speed: Option<String>,
    /// Identifications keyed by stat key
    #[serde(default)]
    pub identifications: BTreeMap<String, IdentificationValue>,
}

/// An identification is either fixed or rolls inside a range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdentificationValue {
    Fixed(i32),
    Ranged(StatRange),
}

impl IdentificationValue {
    pub fn range(&self) -> Option<&StatRange> {
        match self {
            IdentificationValue::Ranged(range) => Some(range),
            IdentificationValue::Fixed(_) => None,
        }
    }
}

impl Item {
    /// Name the game uses, falling back to the display name
    pub fn internal_name(&self) -> &str {
        if self.internal_name.is_empty() {
            &self.name
        } else {
            &self.internal_name
        }
    }

    /// Identifications that roll, in key order
    pub fn ranged_identifications(&self) -> impl Iterator<Item = (&str, &StatRange)> {
        self.identifications
            .iter()
            .filter_map(|(key, value)| value.range().map(|range| (key.as_str(), range)))
    }

    /// Identifications with a fixed value
    pub fn fixed_identifications(&self) -> impl Iterator<Item = (&str, i32)> {
        self.identifications.iter().filter_map(|(key, value)| match value {
            IdentificationValue::Fixed(v) => Some((key.as_str(), *v)),
            IdentificationValue::Ranged(_) => None,
        })
    }

    /// Rollable ranges keyed by identification
    pub fn ranges(&self) -> HashMap<String, StatRange> {
        self.ranged_identifications()
            .map(|(key, range)| (key.to_string(), *range))
            .collect()
    }

    /// Emerald cost of identifying this item
    pub fn identification_cost(&self) -> u32 {
        identification_cost(self.rarity, self.level)
    }

    /// Export item to markdown format
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n", self.name));
        md.push_str(&format!("**{} Item** (Lv. {})\n\n", self.rarity.name(), self.level));

        let fixed: Vec<_> = self.fixed_identifications().collect();
        if !fixed.is_empty() {
            md.push_str("### Fixed\n");
            for (key, value) in fixed {
                md.push_str(&format!("- {}: {}\n", key, value));
            }
            md.push('\n');
        }

        let ranged: Vec<_> = self.ranged_identifications().collect();
        if !ranged.is_empty() {
            md.push_str("### Identifications\n");
            for (key, range) in ranged {
                md.push_str(&format!("- {}: {} to {}\n", key, range.min, range.max));
            }
            md.push('\n');
        }

        md
    }
}

/// A rolled item evaluated against its definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedItem {
    pub item_name: String,
    pub stats: Vec<IdentificationStat>,
    /// Mean roll percentage
    pub overall: f64,
}

/// Evaluate a stored roll against the item it was rolled on
pub fn analyze(item: &Item, rolled: &RolledItem) -> AnalyzedItem {
    let ranges = item.ranges();
    let stats = process_identifications(rolled.identifications.iter(), &ranges);
    let overall = overall_percentage(&stats);

    AnalyzedItem {
        item_name: item.name.clone(),
        stats,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RollRecord;

    fn sample_item() -> Item {
        let mut identifications = BTreeMap::new();
        identifications.insert(
            "rawAirDamage".to_string(),
            IdentificationValue::Ranged(StatRange::new(50, 150, 150)),
        );
        identifications.insert(
            "1stSpellCost".to_string(),
            IdentificationValue::Ranged(StatRange::new(-6, -3, -5)),
        );
        identifications.insert("rawAgility".to_string(), IdentificationValue::Fixed(7));

        Item {
            name: "Breezer".to_string(),
            internal_name: String::new(),
            rarity: Rarity::Legendary,
            level: 95,
            item_type: Some("spear".to_string()),
            attack_speed: Some("fast".to_string()),
            identifications,
        }
    }

    #[test]
    fn test_ranged_and_fixed_split() {
        let item = sample_item();
        let ranged: Vec<&str> = item.ranged_identifications().map(|(k, _)| k).collect();
        assert_eq!(ranged, vec!["1stSpellCost", "rawAirDamage"]);
        let fixed: Vec<_> = item.fixed_identifications().collect();
        assert_eq!(fixed, vec![("rawAgility", 7)]);
        assert_eq!(item.internal_name(), "Breezer");
    }

    #[test]
    fn test_untagged_identification_values() {
        let item: Item = toml::from_str(
            r#"
            name = "Test"
            rarity = "rare"
            level = 10
            [identifications]
            rawHealth = 120
            walkSpeed = { min = 3, max = 13, raw = 10 }
            "#,
        )
        .unwrap();
        assert_eq!(item.identifications["rawHealth"], IdentificationValue::Fixed(120));
        assert_eq!(
            item.identifications["walkSpeed"],
            IdentificationValue::Ranged(StatRange::new(3, 13, 10))
        );
        assert_eq!(item.rarity, Rarity::Rare);
    }

    #[test]
    fn test_analyze_follows_roll_order() {
        let item = sample_item();
        let mut record = RollRecord::new();
        record.insert("rawAirDamage", 100.0);
        record.insert("rawAgility", 100.0);
        record.insert("1stSpellCost", 100.0);

        let rolled = RolledItem::new("Breezer", record);
        let analyzed = analyze(&item, &rolled);

        let names: Vec<&str> = analyzed.stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["rawAirDamage", "1stSpellCost"]);
        assert_eq!(analyzed.stats[1].display_value, -5);
        let expected = (200.0 / 3.0 - 20.0) / 2.0;
        assert!((analyzed.overall - expected).abs() < 1e-9);
    }

    #[test]
    fn test_markdown_export() {
        let md = sample_item().to_markdown();
        assert!(md.starts_with("## Breezer\n"));
        assert!(md.contains("**Legendary Item** (Lv. 95)"));
        assert!(md.contains("- rawAirDamage: 50 to 150"));
        assert!(md.contains("- rawAgility: 7"));
    }

    #[test]
    fn test_item_identification_cost() {
        assert_eq!(sample_item().identification_cost(), 439);
    }
}
