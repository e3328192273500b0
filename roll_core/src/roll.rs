//! Identification roll evaluation
//!
//! Turns the hidden roll percentage of an identification into the value the
//! game shows, a roll-quality percentage for the quality bar, and a star
//! rating.

use crate::types::{StatKind, StatRange, Stars};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Percentage reported when a range has collapsed to a single value
pub const COLLAPSED_RANGE_PERCENTAGE: f64 = 100.0;

/// Outcome of evaluating one rolled identification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollResult {
    /// In-game value, in the stat's natural sign
    pub actual_value: i32,
    /// Position of the value inside its range, not clamped
    pub roll_percentage: f64,
    pub stars: Stars,
}

/// One evaluated entry of a rolled item, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationStat {
    /// Identification key
    pub name: String,
    /// Input roll percentage as supplied
    pub value: f64,
    pub stars: Stars,
    /// Roll-quality percentage
    pub percentage: f64,
    /// In-game value
    pub display_value: i32,
}

/// Round half towards positive infinity, so `-2.5` becomes `-2`.
pub(crate) fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Star rating from the raw input roll.
///
/// `negative` selects the thresholds for stats whose perfect roll is the
/// lowest one.
pub fn stars_from_roll_value(value: f64, negative: bool) -> Stars {
    if negative {
        if value <= 70.0 {
            return Stars::Three;
        }
        if value <= 73.0 {
            return Stars::Two;
        }
        if value <= 88.0 {
            return Stars::One;
        }
    } else {
        if value >= 130.0 {
            return Stars::Three;
        }
        if value >= 125.0 {
            return Stars::Two;
        }
        if value >= 101.0 {
            return Stars::One;
        }
    }
    Stars::Zero
}

/// Evaluate a roll, resolving the stat kind from its key
pub fn calculate_identification_roll(key: &str, original: &StatRange, input: f64) -> RollResult {
    evaluate(StatKind::from_key(key), original, input)
}

/// Evaluate a roll for an explicitly tagged stat
pub fn evaluate(kind: StatKind, original: &StatRange, input: f64) -> RollResult {
    let is_cost = kind.is_cost();
    let range = if is_cost { original.inverted() } else { *original };

    let min = f64::from(range.min);
    let max = f64::from(range.max);
    let raw = f64::from(range.raw);

    let mut actual;
    let roll_percentage;

    if raw >= 0.0 {
        actual = if is_cost {
            -round_half_up(-(input * raw) / 100.0)
        } else {
            round_half_up(input * raw / 100.0)
        };

        roll_percentage = if raw == 0.0 {
            log::debug!("zero raw value, reporting collapsed range");
            COLLAPSED_RANGE_PERCENTAGE
        } else {
            (actual - min) / raw * 100.0
        };
    } else {
        actual = if is_cost {
            -round_half_up(input * raw.abs() / 100.0)
        } else {
            round_half_up(input * raw / 100.0)
        };

        roll_percentage = if max == min {
            log::debug!("collapsed range {}..{}, reporting collapsed range", min, max);
            COLLAPSED_RANGE_PERCENTAGE
        } else {
            (1.0 - (max - actual) / (max - min)) * 100.0
        };
    }

    if is_cost {
        actual = -actual;
    }

    RollResult {
        actual_value: actual as i32,
        roll_percentage,
        stars: stars_from_roll_value(input, raw <= 0.0),
    }
}

/// Evaluate every rolled identification that has a known range.
///
/// Output follows the order of `rolls`; keys missing from `ranges` are skipped.
pub fn process_identifications<'a, I>(rolls: I, ranges: &HashMap<String, StatRange>) -> Vec<IdentificationStat>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    rolls
        .into_iter()
        .filter_map(|(key, value)| {
            let Some(range) = ranges.get(key) else {
                log::debug!("no range for '{}', skipping", key);
                return None;
            };

            let result = calculate_identification_roll(key, range, value);
            Some(IdentificationStat {
                name: key.to_string(),
                value,
                stars: result.stars,
                percentage: result.roll_percentage,
                display_value: result.actual_value,
            })
        })
        .collect()
}

/// Mean roll percentage of an evaluated item
pub fn overall_percentage(stats: &[IdentificationStat]) -> f64 {
    if stats.is_empty() {
        return 0.0;
    }
    let total: f64 = stats.iter().map(|s| s.percentage).sum();
    total / stats.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn air() -> StatRange {
        StatRange::new(50, 150, 150)
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(1.49), 1.0);
    }

    #[test]
    fn test_perfect_roll_returns_raw() {
        let result = calculate_identification_roll("rawAirDamage", &air(), 100.0);
        assert_eq!(result.actual_value, 150);
        assert!((result.roll_percentage - (150.0 - 50.0) / 150.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hundred_percent_roll_earns_no_stars() {
        let result = calculate_identification_roll("rawAirDamage", &air(), 100.0);
        assert_eq!(result.stars, Stars::Zero);
    }

    #[test]
    fn test_positive_star_thresholds() {
        assert_eq!(stars_from_roll_value(130.0, false), Stars::Three);
        assert_eq!(stars_from_roll_value(129.999, false), Stars::Two);
        assert_eq!(stars_from_roll_value(125.0, false), Stars::Two);
        assert_eq!(stars_from_roll_value(124.999, false), Stars::One);
        assert_eq!(stars_from_roll_value(101.0, false), Stars::One);
        assert_eq!(stars_from_roll_value(100.999, false), Stars::Zero);
    }

    #[test]
    fn test_negative_star_thresholds() {
        assert_eq!(stars_from_roll_value(70.0, true), Stars::Three);
        assert_eq!(stars_from_roll_value(70.001, true), Stars::Two);
        assert_eq!(stars_from_roll_value(73.0, true), Stars::Two);
        assert_eq!(stars_from_roll_value(88.0, true), Stars::One);
        assert_eq!(stars_from_roll_value(88.001, true), Stars::Zero);
    }

    #[test]
    fn test_negative_raw_uses_negative_thresholds() {
        let range = StatRange::new(-13, -7, -10);
        let result = calculate_identification_roll("walkSpeed", &range, 70.0);
        assert_eq!(result.actual_value, -7);
        assert_eq!(result.stars, Stars::Three);
        assert!((result.roll_percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cost_reduction_keeps_natural_sign() {
        let range = StatRange::new(-6, -3, -5);
        let result = calculate_identification_roll("1stSpellCost", &range, 100.0);
        assert_eq!(result.actual_value, -5);
        assert!((result.roll_percentage - (-20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_cost_bounds_do_not_overflow() {
        let range = StatRange::new(i32::MIN, -3, -5);
        let result = calculate_identification_roll("1stSpellCost", &range, 100.0);
        assert_eq!(result.actual_value, -5);
        assert!(result.roll_percentage.is_finite());
    }

    #[test]
    fn test_cost_increase_keeps_natural_sign() {
        let range = StatRange::new(2, 7, 5);
        let result = calculate_identification_roll("raw2ndSpellCost", &range, 100.0);
        assert_eq!(result.actual_value, 5);
        assert!((result.roll_percentage - 60.0).abs() < 1e-9);
        assert_eq!(result.stars, Stars::Zero);
    }

    #[test]
    fn test_half_values_round_towards_positive() {
        let standard = StatRange::new(2, 7, 5);
        assert_eq!(calculate_identification_roll("rawStrength", &standard, 50.0).actual_value, 3);

        let negative = StatRange::new(-7, -2, -5);
        assert_eq!(calculate_identification_roll("rawStrength", &negative, 50.0).actual_value, -2);

        // Cost reductions round the halfway case towards the smaller reduction
        let cost = StatRange::new(-7, -2, -5);
        assert_eq!(calculate_identification_roll("1stSpellCost", &cost, 50.0).actual_value, -2);
    }

    #[test]
    fn test_over_roll_is_not_clamped() {
        let result = calculate_identification_roll("rawAirDamage", &air(), 150.0);
        assert_eq!(result.actual_value, 225);
        assert!(result.roll_percentage > 100.0);
        assert_eq!(result.stars, Stars::Three);
    }

    #[test]
    fn test_collapsed_negative_range() {
        let range = StatRange::new(-1, -1, -1);
        let result = calculate_identification_roll("rawDefence", &range, 100.0);
        assert_eq!(result.actual_value, -1);
        assert_eq!(result.roll_percentage, COLLAPSED_RANGE_PERCENTAGE);
    }

    #[test]
    fn test_zero_raw() {
        let range = StatRange::new(0, 0, 0);
        let result = calculate_identification_roll("rawHealth", &range, 100.0);
        assert_eq!(result.actual_value, 0);
        assert_eq!(result.roll_percentage, COLLAPSED_RANGE_PERCENTAGE);
    }

    #[test]
    fn test_explicit_kind_overrides_key() {
        let range = StatRange::new(-6, -3, -5);
        let tagged = evaluate(StatKind::Cost, &range, 100.0);
        let keyed = calculate_identification_roll("1stSpellCost", &range, 100.0);
        assert_eq!(tagged, keyed);
        assert_ne!(evaluate(StatKind::Standard, &range, 100.0), keyed);
    }

    #[test]
    fn test_process_skips_unknown_keys() {
        let mut ranges = HashMap::new();
        ranges.insert("rawAirDamage".to_string(), air());
        ranges.insert("walkSpeed".to_string(), StatRange::new(6, 26, 20));

        let rolls = vec![("walkSpeed", 110.0), ("lootBonus", 80.0), ("rawAirDamage", 100.0)];
        let stats = process_identifications(rolls, &ranges);

        let names: Vec<&str> = stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["walkSpeed", "rawAirDamage"]);
        assert_eq!(stats[0].display_value, 22);
        assert_eq!(stats[0].stars, Stars::One);
    }

    #[test]
    fn test_process_empty() {
        let stats = process_identifications(Vec::<(&str, f64)>::new(), &HashMap::new());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_overall_percentage() {
        assert_eq!(overall_percentage(&[]), 0.0);

        let mut ranges = HashMap::new();
        ranges.insert("a".to_string(), StatRange::new(0, 100, 100));
        ranges.insert("b".to_string(), StatRange::new(0, 100, 100));
        let stats = process_identifications(vec![("a", 50.0), ("b", 100.0)], &ranges);
        assert!((overall_percentage(&stats) - 75.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_evaluation_is_deterministic(
            min in -500i32..500,
            span in 0i32..500,
            raw in -500i32..500,
            input in 0.0f64..200.0,
        ) {
            let range = StatRange::new(min, min + span, raw);
            let first = calculate_identification_roll("rawSpellDamage", &range, input);
            let second = calculate_identification_roll("rawSpellDamage", &range, input);
            prop_assert_eq!(first.actual_value, second.actual_value);
            prop_assert_eq!(first.roll_percentage.to_bits(), second.roll_percentage.to_bits());
            prop_assert_eq!(first.stars, second.stars);
        }

        #[test]
        fn prop_value_never_opposes_raw_sign(
            raw in -500i32..500,
            input in 0.0f64..200.0,
            cost in any::<bool>(),
        ) {
            let key = if cost { "3rdSpellCost" } else { "rawHealth" };
            let range = StatRange::new(raw.min(0), raw.max(0), raw);
            let result = calculate_identification_roll(key, &range, input);
            prop_assert!(i64::from(result.actual_value) * i64::from(raw) >= 0);
        }

        #[test]
        fn prop_positive_stars_are_monotonic(a in 0.0f64..200.0, b in 0.0f64..200.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(stars_from_roll_value(low, false) <= stars_from_roll_value(high, false));
            prop_assert!(stars_from_roll_value(low, true) >= stars_from_roll_value(high, true));
        }
    }
}
