use serde::{Deserialize, Serialize};

/// Designed roll envelope for one identification on one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatRange {
    /// Lowest value the identification can roll to
    pub min: i32,
    /// Highest value the identification can roll to
    pub max: i32,
    /// Base value at a 100% roll; its sign decides the roll direction
    pub raw: i32,
}

impl StatRange {
    pub fn new(min: i32, max: i32, raw: i32) -> Self {
        StatRange { min, max, raw }
    }

    /// Flip every bound, used when a cost stat is evaluated as "higher is better"
    pub fn inverted(&self) -> Self {
        StatRange {
            min: self.min.saturating_neg(),
            max: self.max.saturating_neg(),
            raw: self.raw.saturating_neg(),
        }
    }
}

/// How an identification should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    /// A larger value is better
    #[default]
    Standard,
    /// Lower is better (spell costs)
    Cost,
}

impl StatKind {
    /// Resolve the kind from the identification key naming convention
    pub fn from_key(key: &str) -> Self {
        if key.to_ascii_lowercase().contains("cost") {
            StatKind::Cost
        } else {
            StatKind::Standard
        }
    }

    pub fn is_cost(&self) -> bool {
        matches!(self, StatKind::Cost)
    }
}

/// Star rating shown next to a rolled identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Stars {
    #[default]
    Zero,
    One,
    Two,
    Three,
}

impl Stars {
    pub fn count(&self) -> u8 {
        match self {
            Stars::Zero => 0,
            Stars::One => 1,
            Stars::Two => 2,
            Stars::Three => 3,
        }
    }

    /// One `*` per star
    pub fn as_text(&self) -> &'static str {
        match self {
            Stars::Zero => "",
            Stars::One => "*",
            Stars::Two => "**",
            Stars::Three => "***",
        }
    }
}

/// Colour bucket for a roll percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollTier {
    Perfect,
    High,
    Mid,
    Low,
}

impl RollTier {
    /// Bucket a percentage; `inverted` reads it as "lower is better"
    pub fn classify(percentage: f64, inverted: bool) -> Self {
        let percentage = if inverted { 100.0 - percentage } else { percentage };
        if percentage >= 95.0 {
            RollTier::Perfect
        } else if percentage >= 80.0 {
            RollTier::High
        } else if percentage >= 30.0 {
            RollTier::Mid
        } else {
            RollTier::Low
        }
    }
}

/// Item rarity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Set,
    Unique,
    Rare,
    Legendary,
    Fabled,
    Mythic,
}

impl Rarity {
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Set => "Set",
            Rarity::Unique => "Unique",
            Rarity::Rare => "Rare",
            Rarity::Legendary => "Legendary",
            Rarity::Fabled => "Fabled",
            Rarity::Mythic => "Mythic",
        }
    }
}

/// Direction of a requirement bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    #[default]
    AtLeast,
    AtMost,
}

impl Comparison {
    pub fn holds(&self, actual: f64, bound: f64) -> bool {
        match self {
            Comparison::AtLeast => actual >= bound,
            Comparison::AtMost => actual <= bound,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Comparison::AtLeast => Comparison::AtMost,
            Comparison::AtMost => Comparison::AtLeast,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::AtLeast => ">=",
            Comparison::AtMost => "<=",
        }
    }
}

/// Whether a rolled value helps or hurts its wearer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Beneficial,
    Detrimental,
    Neutral,
}
