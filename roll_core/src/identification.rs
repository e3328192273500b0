//! Static identification table and display formatting

use crate::roll::IdentificationStat;
use crate::types::{Polarity, Rarity, StatKind};

/// Display metadata for one identification key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentificationInfo {
    pub display_name: &'static str,
    pub detailed_name: Option<&'static str>,
    /// Unit suffix such as `%` or `/5s`; empty for plain numbers
    pub unit: &'static str,
    /// Font glyph shown before base stats
    pub symbol: Option<&'static str>,
}

impl IdentificationInfo {
    const fn detailed(self, detailed_name: &'static str) -> Self {
        IdentificationInfo {
            detailed_name: Some(detailed_name),
            ..self
        }
    }

    const fn with_symbol(self, symbol: &'static str) -> Self {
        IdentificationInfo {
            symbol: Some(symbol),
            ..self
        }
    }

    /// The detailed name when there is one, otherwise the display name
    pub fn label(&self) -> &'static str {
        self.detailed_name.unwrap_or(self.display_name)
    }
}

const fn info(display_name: &'static str, unit: &'static str) -> IdentificationInfo {
    IdentificationInfo {
        display_name,
        detailed_name: None,
        unit,
        symbol: None,
    }
}

static IDENTIFICATIONS: phf::Map<&'static str, IdentificationInfo> = phf::phf_map! {
    // Base stats
    "baseHealth" => info("Health", "").detailed("Base Health").with_symbol("\u{E01B}"),
    "baseDamage" => info("Neutral Damage", "").detailed("Base Damage").with_symbol("\u{E005}"),
    "baseEarthDamage" => info("Earth Damage", "").detailed("Base Earth Damage").with_symbol("\u{E001}"),
    "baseEarthDefence" => info("Earth Defence", "").detailed("Base Earth Defence").with_symbol("\u{E001}"),
    "baseThunderDamage" => info("Thunder Damage", "").detailed("Base Thunder Damage").with_symbol("\u{E003}"),
    "baseThunderDefence" => info("Thunder Defence", "").detailed("Base Thunder Defence").with_symbol("\u{E003}"),
    "baseWaterDamage" => info("Water Damage", "").detailed("Base Water Damage").with_symbol("\u{E004}"),
    "baseWaterDefence" => info("Water Defence", "").detailed("Base Water Defence").with_symbol("\u{E004}"),
    "baseFireDamage" => info("Fire Damage", "").detailed("Base Fire Damage").with_symbol("\u{E002}"),
    "baseFireDefence" => info("Fire Defence", "").detailed("Base Fire Defence").with_symbol("\u{E002}"),
    "baseAirDamage" => info("Air Damage", "").detailed("Base Air Damage").with_symbol("\u{E000}"),
    "baseAirDefence" => info("Air Defence", "").detailed("Base Air Defence").with_symbol("\u{E000}"),

    // Required Stats
    "strength" => info("Strength Min", "").detailed("Required Strength"),
    "dexterity" => info("Dexterity Min", "").detailed("Required Dexterity"),
    "intelligence" => info("Intelligence Min", "").detailed("Required Intelligence"),
    "defence" => info("Defence Min", "").detailed("Required Defence"),
    "agility" => info("Agility Min", "").detailed("Required Agility"),
    "level" => info("Combat Level", "").detailed("Required Combat Level"),
    "classRequirement" => info("Class Req", "").detailed("Required Class"),
    "quest" => info("Quest Req", "").detailed("Required Quest"),

    // Main Attack Stats
    "mainAttackDamage" => info("Main Attack Damage", "%").detailed("Main Attack Damage %"),
    "mainAttackElementalDamage" => info("Main Attack Elemental Damage", "%").detailed("Main Attack Elemental Damage %"),
    "mainAttackNeutraDamageBonus" => info("Main Attack Neutral Damage Bonus", "%").detailed("Main Attack Neutral Damage Bonus %"),
    "elementalMainAttackDamage" => info("Elemental Main Attack Damage", "%").detailed("Elemental Main Attack Damage %"),
    "neutralMainAttackDamage" => info("Neutral Main Attack Damage", "%").detailed("Neutral Main Attack Damage %"),
    "earthMainAttackDamage" => info("Earth Main Attack Damage", "%").detailed("Earth Main Attack Damage %"),
    "thunderMainAttackDamage" => info("Thunder Main Attack Damage", "%").detailed("Thunder Main Attack Damage %"),
    "waterMainAttackDamage" => info("Water Main Attack Damage", "%").detailed("Water Main Attack Damage %"),
    "fireMainAttackDamage" => info("Fire Main Attack Damage", "%").detailed("Fire Main Attack Damage %"),
    "airMainAttackDamage" => info("Air Main Attack Damage", "%").detailed("Air Main Attack Damage %"),
    "rawMainAttackDamage" => info("Main Attack Damage", "").detailed("Raw Main Attack Damage"),
    "rawElementalMainAttackDamage" => info("Elemental Main Attack Damage", "").detailed("Raw Elemental Main Attack Damage"),
    "rawNeutralMainAttackDamage" => info("Neutral Main Attack Damage", "").detailed("Raw Neutral Main Attack Damage"),
    "rawEarthMainAttackDamage" => info("Earth Main Attack Damage", "").detailed("Raw Earth Main Attack Damage"),
    "rawThunderMainAttackDamage" => info("Thunder Main Attack Damage", "").detailed("Raw Thunder Main Attack Damage"),
    "rawWaterMainAttackDamage" => info("Water Main Attack Damage", "").detailed("Raw Water Main Attack Damage"),
    "rawFireMainAttackDamage" => info("Fire Main Attack Damage", "").detailed("Raw Fire Main Attack Damage"),
    "rawAirMainAttackDamage" => info("Air Main Attack Damage", "").detailed("Raw Air Main Attack Damage"),

    // Additional Stats
    "damage" => info("Damage", "%").detailed("Damage %"),
    "neutralDamage" => info("Neutral Damage", "%").detailed("Neutral Damage %"),
    "spellDamage" => info("Spell Damage", "%").detailed("Spell Damage %"),
    "elementalDamage" => info("Elemental Damage", "%").detailed("Elemental Damage %"),
    "criticalDamageBonus" => info("Critical Damage Bonus", "%").detailed("Critical Damage Bonus %"),
    "earthDamage" => info("Earth Damage", "%").detailed("Earth Damage %"),
    "thunderDamage" => info("Thunder Damage", "%").detailed("Thunder Damage %"),
    "waterDamage" => info("Water Damage", "%").detailed("Water Damage %"),
    "fireDamage" => info("Fire Damage", "%").detailed("Fire Damage %"),
    "airDamage" => info("Air Damage", "%").detailed("Air Damage %"),
    "rawDamage" => info("Damage", ""),
    "rawNeutralDamage" => info("Neutral Damage", ""),
    "rawSpellDamage" => info("Spell Damage", "").detailed("Raw Spell Damage"),
    "rawElementalDamage" => info("Elemental Damage", ""),
    "rawEarthDamage" => info("Earth Damage", ""),
    "rawThunderDamage" => info("Thunder Damage", ""),
    "rawWaterDamage" => info("Water Damage", ""),
    "rawFireDamage" => info("Fire Damage", ""),
    "rawAirDamage" => info("Air Damage", ""),
    "elementalSpellDamage" => info("Elemental Spell Damage", "%").detailed("Elemental Spell Damage %"),
    "neutralSpellDamage" => info("Neutral Spell Damage", "%").detailed("Neutral Spell Damage %"),
    "earthSpellDamage" => info("Earth Spell Damage", "%").detailed("Earth Spell Damage %"),
    "thunderSpellDamage" => info("Thunder Spell Damage", "%").detailed("Thunder Spell Damage %"),
    "waterSpellDamage" => info("Water Spell Damage", "%").detailed("Water Spell Damage %"),
    "fireSpellDamage" => info("Fire Spell Damage", "%").detailed("Fire Spell Damage %"),
    "airSpellDamage" => info("Air Spell Damage", "%").detailed("Air Spell Damage %"),
    "rawElementalSpellDamage" => info("Elemental Spell Damage", "").detailed("Raw Elemental Spell Damage"),
    "rawEarthSpellDamage" => info("Earth Spell Damage", "").detailed("Raw Earth Spell Damage"),
    "rawNeutralSpellDamage" => info("Neutral Spell Damage", "").detailed("Raw Neutral Spell Damage"),
    "rawThunderSpellDamage" => info("Thunder Spell Damage", "").detailed("Raw Thunder Spell Damage"),
    "rawWaterSpellDamage" => info("Water Spell Damage", "").detailed("Raw Water Spell Damage"),
    "rawFireSpellDamage" => info("Fire Spell Damage", "").detailed("Raw Fire Spell Damage"),
    "rawAirSpellDamage" => info("Air Spell Damage", "").detailed("Raw Air Spell Damage"),

    // Survivability
    "rawHealth" => info("Health Bonus", ""),
    "healthRegenRaw" => info("Health Regen Raw", ""),
    "healthRegen" => info("Health Regen", "%"),
    "thorns" => info("Thorns", "%"),
    "elementalDefence" => info("Elemental Defence", "%").detailed("Elemental Defence %"),
    "earthDefence" => info("Earth Defence", "%").detailed("Earth Defence %"),
    "thunderDefence" => info("Thunder Defence", "%").detailed("Thunder Defence %"),
    "waterDefence" => info("Water Defence", "%").detailed("Water Defence %"),
    "fireDefence" => info("Fire Defence", "%").detailed("Fire Defence %"),
    "airDefence" => info("Air Defence", "%").detailed("Air Defence %"),

    // Skill points
    "rawStrength" => info("Strength", ""),
    "rawDexterity" => info("Dexterity", ""),
    "rawIntelligence" => info("Intelligence", ""),
    "rawDefence" => info("Defence", ""),
    "rawAgility" => info("Agility", ""),

    // Utility
    "manaRegen" => info("Mana Regen", "/5s"),
    "manaSteal" => info("Mana Steal", "/3s"),
    "walkSpeed" => info("Walk Speed", "%"),
    "xpBonus" => info("Xp Bonus", "%"),
    "exploding" => info("Exploding", "%"),
    "lifeSteal" => info("Life Steal", "/3s"),
    "reflection" => info("Reflection", "%"),
    "lootBonus" => info("Loot Bonus", "%"),
    "poison" => info("Poison", "/3s"),
    "healingEfficiency" => info("Healing Efficiency", "%"),
    "stealing" => info("Stealing", "%"),
    "jumpHeight" => info("Jump Height", ""),
    "knockback" => info("Knockback", "%"),
    "slowEnemy" => info("Slow Enemy", "%"),
    "weakenEnemy" => info("Weaken Enemy", "%"),
    "leveledXpBonus" => info("Leveled XP Bonus", ""),
    "damageFromMobs" => info("Damage From Mobs", ""),
    "leveledLootBonus" => info("Leveled Loot Bonus", ""),
    "gatherXpBonus" => info("Gather XP Bonus", "%"),
    "gatherSpeed" => info("Gather Speed", "%"),
    "lootQuality" => info("Loot Quality", "%"),
    "rawMaxMana" => info("Max Mana", ""),
    "sprintRegen" => info("Sprint Regen", "%"),
    "sprint" => info("Sprint", "%"),
    "mainAttackRange" => info("Main Attack Range", "%"),
    "rawAttackSpeed" => info("Attack Speed", ""),

    // Spell costs
    "1stSpellCost" => info("1st Spell Cost", "%").detailed("1st Spell Cost %"),
    "2ndSpellCost" => info("2nd Spell Cost", "%").detailed("2nd Spell Cost %"),
    "3rdSpellCost" => info("3rd Spell Cost", "%").detailed("3rd Spell Cost %"),
    "4thSpellCost" => info("4th Spell Cost", "%").detailed("4th Spell Cost %"),
    "raw1stSpellCost" => info("1st Spell Cost", "").detailed("Raw 1st Spell Cost"),
    "raw2ndSpellCost" => info("2nd Spell Cost", "").detailed("Raw 2nd Spell Cost"),
    "raw3rdSpellCost" => info("3rd Spell Cost", "").detailed("Raw 3rd Spell Cost"),
    "raw4thSpellCost" => info("4th Spell Cost", "").detailed("Raw 4th spell cost"),

    // Ingredient effectiveness
    "left" => info("To ingredients to the left of this one", "%"),
    "right" => info("To ingredients to the right of this one", "%"),
    "above" => info("To ingredients above this one", "%"),
    "under" => info("To ingredients under this one", "%"),
    "touching" => info("To ingredients touching this one", "%"),
    "notTouching" => info("To ingredients not touching this one", "%"),
};

/// Look up display metadata for an identification key
pub fn identification_info(key: &str) -> Option<&'static IdentificationInfo> {
    IDENTIFICATIONS.get(key)
}

/// Whether the key is present in the identification table
pub fn is_known_identification(key: &str) -> bool {
    IDENTIFICATIONS.contains_key(key)
}

/// Emerald cost of identifying an unidentified item
pub fn identification_cost(rarity: Rarity, level: u32) -> u32 {
    let level = f64::from(level);
    let cost = match rarity {
        Rarity::Mythic => 90.0 + level * 18.0,
        Rarity::Fabled => 16.0 + level * 8.0,
        Rarity::Legendary => 12.0 + level * 4.5,
        Rarity::Rare => 8.0 + level * 1.2,
        Rarity::Unique => 3.0 + level * 0.5,
        Rarity::Set => 8.0 + level * 1.5,
        Rarity::Common => 0.0,
    };
    cost.floor() as u32
}

/// Render a roll percentage truncated (not rounded) to two decimals
pub fn roll_percentage_string(percentage: f64) -> String {
    let truncated = (percentage * 100.0).trunc() / 100.0;
    format!("{:.2}%", truncated)
}

/// Signed rendering of an identification value
pub fn formatted_id_number(value: i32) -> String {
    if value > 0 {
        format!("+{}", value)
    } else {
        value.to_string()
    }
}

/// Whether a value helps its wearer; cost stats read lower as better
pub fn polarity(value: i32, key: &str) -> Polarity {
    let value = if StatKind::from_key(key).is_cost() { -value } else { value };
    match value.signum() {
        1 => Polarity::Beneficial,
        -1 => Polarity::Detrimental,
        _ => Polarity::Neutral,
    }
}

/// `"very_fast"` -> `"Very Fast Attack Speed"`
pub fn format_attack_speed(attack_speed: &str) -> String {
    let words: Vec<String> = attack_speed
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    format!("{} Attack Speed", words.join(" "))
}

/// One line per evaluated identification, e.g. `+120*** Air Damage [87.50%]`
pub fn display_line(stat: &IdentificationStat) -> String {
    let (name, unit) = match identification_info(&stat.name) {
        Some(info) => (info.display_name, info.unit),
        None => (stat.name.as_str(), ""),
    };
    format!(
        "{}{}{} {} [{}]",
        formatted_id_number(stat.display_value),
        unit,
        stat.stars.as_text(),
        name,
        roll_percentage_string(stat.percentage)
    )
}
