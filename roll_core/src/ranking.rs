//! Weighted scoring of rolled items
//!
//! A weight assigns a factor to each identification. Positive factors reward
//! high rolls, negative factors reward low rolls. Without a weight an item is
//! scored by its mean roll.

use crate::roll::calculate_identification_roll;
use crate::storage::{RollRecord, RolledItem};
use crate::types::StatRange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named scoring weight for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weight {
    pub weight_id: String,
    pub weight_name: String,
    pub item_name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    /// Factor per identification key
    #[serde(default)]
    pub identifications: HashMap<String, f64>,
}

/// A rolled item with its computed score
#[derive(Debug, Clone)]
pub struct RankedEntry<'a> {
    pub rolled: &'a RolledItem,
    pub score: f64,
}

/// Score one roll.
///
/// Unweighted scores are a fraction in `0..=1` (for nominal rolls) truncated
/// to four decimals; weighted scores are the sum of weighted roll fractions.
pub fn score(ranges: &HashMap<String, StatRange>, rolls: &RollRecord, weight: Option<&Weight>) -> f64 {
    let percentages: Vec<(&str, f64)> = rolls
        .iter()
        .filter_map(|(key, value)| {
            ranges
                .get(key)
                .map(|range| (key, calculate_identification_roll(key, range, value).roll_percentage))
        })
        .collect();

    if percentages.is_empty() {
        return 0.0;
    }

    let Some(weight) = weight else {
        let sum: f64 = percentages.iter().map(|(_, pct)| pct).sum();
        let mean = sum / percentages.len() as f64;
        return (mean * 100.0).trunc() / 10000.0;
    };

    percentages
        .iter()
        .map(|(key, pct)| {
            let factor = weight.identifications.get(*key).copied().unwrap_or(0.0);
            if factor < 0.0 {
                ((100.0 - pct) / 100.0 * factor).abs()
            } else {
                pct / 100.0 * factor
            }
        })
        .sum()
}

/// Score and sort rolls, best first. Ties keep their input order.
pub fn rank<'a>(
    ranges: &HashMap<String, StatRange>,
    rolls: impl IntoIterator<Item = &'a RolledItem>,
    weight: Option<&Weight>,
) -> Vec<RankedEntry<'a>> {
    let mut entries: Vec<RankedEntry<'a>> = rolls
        .into_iter()
        .map(|rolled| RankedEntry {
            rolled,
            score: score(ranges, &rolled.identifications, weight),
        })
        .collect();

    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries
}
