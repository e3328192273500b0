//! Reroll simulator
//!
//! Simulates rerolling an item's identifications the way the game does,
//! including Corkian amplifiers and augments, and can keep rerolling until a
//! set of requirements is met.

use crate::item::Item;
use crate::roll::round_half_up;
use crate::storage::{RollRecord, RolledItem};
use crate::types::{Comparison, StatRange, Stars};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Highest Corkian amplifier tier
pub const MAX_AMP_TIER: u8 = 10;

/// Augment applied while rerolling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Augment {
    #[default]
    None,
    /// The locked identification keeps its roll
    CorkianInsulator,
    /// Only the locked identification is rerolled
    CorkianIsolator,
    /// Rerolls are free and do not count
    CorkianSimulator,
}

impl Augment {
    pub const ALL: [Augment; 4] = [
        Augment::None,
        Augment::CorkianInsulator,
        Augment::CorkianIsolator,
        Augment::CorkianSimulator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Augment::None => "None",
            Augment::CorkianInsulator => "Corkian Insulator",
            Augment::CorkianIsolator => "Corkian Isolator",
            Augment::CorkianSimulator => "Corkian Simulator",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|a| a == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn needs_lock(&self) -> bool {
        matches!(self, Augment::CorkianInsulator | Augment::CorkianIsolator)
    }
}

/// Reroll settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Corkian amplifier tier, `0..=MAX_AMP_TIER`
    pub amp_tier: u8,
    pub augment: Augment,
    /// Identification targeted by the insulator or isolator
    pub locked: Option<String>,
}

impl SimulatorConfig {
    /// Check the settings against the item they will reroll
    pub fn validate(&self, item: &Item) -> Result<(), SimulatorError> {
        if self.amp_tier > MAX_AMP_TIER {
            return Err(SimulatorError::InvalidAmpTier(self.amp_tier));
        }

        if let Some(ref key) = self.locked {
            if !item.ranged_identifications().any(|(k, _)| k == key) {
                return Err(SimulatorError::UnknownLockedIdentification(key.clone()));
            }
        } else if self.augment.needs_lock() {
            return Err(SimulatorError::MissingLock(self.augment));
        }

        Ok(())
    }

    fn amp_multiplier(&self) -> f64 {
        0.05 * f64::from(self.amp_tier)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulatorError {
    #[error("Amplifier tier {0} is out of range (0-10)")]
    InvalidAmpTier(u8),

    #[error("Locked identification '{0}' does not roll on this item")]
    UnknownLockedIdentification(String),

    #[error("{} needs a locked identification", .0.name())]
    MissingLock(Augment),
}

/// One simulated identification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatedId {
    /// Rolled in-game value
    pub value: i32,
    /// Roll quality, rounded to one decimal
    pub percentage: f64,
    pub stars: Stars,
}

/// A full reroll of an item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulatedRoll {
    /// Rolled identifications in item key order
    pub identifications: Vec<(String, SimulatedId)>,
    /// Mean roll quality, rounded to two decimals
    pub overall: f64,
}

impl SimulatedRoll {
    pub fn get(&self, key: &str) -> Option<&SimulatedId> {
        self.identifications
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, id)| id)
    }
}

/// A bound on one roll percentage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub value: f64,
    #[serde(default)]
    pub comparison: Comparison,
}

impl Requirement {
    pub fn at_least(value: f64) -> Self {
        Requirement {
            value,
            comparison: Comparison::AtLeast,
        }
    }

    pub fn at_most(value: f64) -> Self {
        Requirement {
            value,
            comparison: Comparison::AtMost,
        }
    }

    pub fn holds(&self, percentage: f64) -> bool {
        self.comparison.holds(percentage, self.value)
    }
}

/// Conditions an auto-roll stops on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollRequirements {
    #[serde(default)]
    pub overall: Option<Requirement>,
    #[serde(default)]
    pub per_stat: BTreeMap<String, Requirement>,
}

impl RollRequirements {
    pub fn is_empty(&self) -> bool {
        self.overall.is_none() && self.per_stat.is_empty()
    }

    /// Flip the comparison of `key`'s requirement, or of the overall one when
    /// `key` has none. Returns the new comparison.
    pub fn toggle_direction(&mut self, key: Option<&str>) -> Option<Comparison> {
        let target = match key.and_then(|k| self.per_stat.get_mut(k)) {
            Some(req) => req,
            None => self.overall.as_mut()?,
        };
        target.comparison = target.comparison.toggled();
        Some(target.comparison)
    }

    /// Whether a roll satisfies every requirement; a required id that did
    /// not roll fails
    pub fn is_met(&self, roll: &SimulatedRoll) -> bool {
        if let Some(ref overall) = self.overall {
            if !overall.holds(roll.overall) {
                return false;
            }
        }

        self.per_stat.iter().all(|(key, req)| match roll.get(key) {
            Some(id) => req.holds(id.percentage),
            None => false,
        })
    }
}

/// Result of rolling until requirements are met
#[derive(Debug, Clone, PartialEq)]
pub enum AutoRollOutcome {
    Met { attempts: u64, roll: SimulatedRoll },
    Exhausted { attempts: u64, last: SimulatedRoll },
}

impl AutoRollOutcome {
    pub fn attempts(&self) -> u64 {
        match self {
            AutoRollOutcome::Met { attempts, .. } | AutoRollOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn roll(&self) -> &SimulatedRoll {
        match self {
            AutoRollOutcome::Met { roll, .. } => roll,
            AutoRollOutcome::Exhausted { last, .. } => last,
        }
    }

    pub fn is_met(&self) -> bool {
        matches!(self, AutoRollOutcome::Met { .. })
    }
}

/// Seeded reroll simulator for one item
#[derive(Debug, Clone)]
pub struct RollSimulator {
    item_name: String,
    ranges: Vec<(String, StatRange)>,
    config: SimulatorConfig,
    rng: ChaCha8Rng,
    current: SimulatedRoll,
    reroll_count: u64,
}

impl RollSimulator {
    /// Create a simulator and perform the initial roll, which is not counted
    pub fn new(item: &Item, config: SimulatorConfig, seed: u64) -> Result<Self, SimulatorError> {
        config.validate(item)?;

        let mut sim = RollSimulator {
            item_name: item.name.clone(),
            ranges: item
                .ranged_identifications()
                .map(|(key, range)| (key.to_string(), *range))
                .collect(),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            current: SimulatedRoll::default(),
            reroll_count: 0,
        };
        sim.current = sim.simulate();
        Ok(sim)
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn current(&self) -> &SimulatedRoll {
        &self.current
    }

    pub fn reroll_count(&self) -> u64 {
        self.reroll_count
    }

    /// Change settings; the current roll is kept
    pub fn set_config(&mut self, item: &Item, config: SimulatorConfig) -> Result<(), SimulatorError> {
        config.validate(item)?;
        self.config = config;
        Ok(())
    }

    /// Reroll once
    pub fn roll(&mut self) -> &SimulatedRoll {
        self.current = self.simulate();
        if self.config.augment != Augment::CorkianSimulator {
            self.reroll_count += 1;
        }
        &self.current
    }

    /// Reroll until `requirements` are met or `max_attempts` rerolls were made
    pub fn auto_roll(&mut self, requirements: &RollRequirements, max_attempts: u64) -> AutoRollOutcome {
        for attempt in 1..=max_attempts {
            self.roll();
            if requirements.is_met(&self.current) {
                log::debug!("{}: requirements met after {} rolls", self.item_name, attempt);
                return AutoRollOutcome::Met {
                    attempts: attempt,
                    roll: self.current.clone(),
                };
            }
        }

        AutoRollOutcome::Exhausted {
            attempts: max_attempts,
            last: self.current.clone(),
        }
    }

    /// Like [`auto_roll`](Self::auto_roll) but spread over `workers` threads,
    /// each with its own seed and up to `max_attempts` rerolls. All workers
    /// stop once one of them succeeds.
    pub fn auto_roll_parallel(
        &mut self,
        requirements: &RollRequirements,
        workers: usize,
        max_attempts: u64,
    ) -> AutoRollOutcome {
        let workers = workers.max(1);
        let seeds: Vec<u64> = (0..workers).map(|_| self.rng.gen()).collect();
        let found = AtomicBool::new(false);
        let template = &*self;

        let results: Vec<(u64, bool, SimulatedRoll)> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut worker = template.clone();
                worker.rng = ChaCha8Rng::seed_from_u64(seed);

                let mut attempts = 0;
                while attempts < max_attempts && !found.load(Ordering::Relaxed) {
                    attempts += 1;
                    worker.current = worker.simulate();
                    if requirements.is_met(&worker.current) {
                        found.store(true, Ordering::Relaxed);
                        return (attempts, true, worker.current);
                    }
                }
                (attempts, false, worker.current)
            })
            .collect();

        let total: u64 = results.iter().map(|(attempts, _, _)| attempts).sum();
        if self.config.augment != Augment::CorkianSimulator {
            self.reroll_count += total;
        }
        log::debug!("{}: {} parallel rolls over {} workers", self.item_name, total, workers);

        let winner = results.iter().position(|(_, met, _)| *met);
        let met = winner.is_some();
        let idx = winner.unwrap_or(results.len() - 1);
        let (_, _, roll) = results.into_iter().nth(idx).unwrap_or_default();
        self.current = roll.clone();

        if met {
            AutoRollOutcome::Met { attempts: total, roll }
        } else {
            AutoRollOutcome::Exhausted { attempts: total, last: roll }
        }
    }

    /// Convert the current roll into a stored item. Each value is recorded as
    /// a percentage of its base value, the input the evaluator expects.
    pub fn to_rolled_item(&self) -> RolledItem {
        let record: RollRecord = self
            .ranges
            .iter()
            .filter_map(|(key, range)| {
                let id = self.current.get(key)?;
                let input = if range.raw == 0 {
                    100.0
                } else {
                    round_to(f64::from(id.value) / f64::from(range.raw) * 100.0, 2)
                };
                Some((key.clone(), input))
            })
            .collect();

        let mut rolled = RolledItem::new(self.item_name.clone(), record);
        rolled.reroll_count = u32::try_from(self.reroll_count).ok();
        rolled
    }

    fn simulate(&mut self) -> SimulatedRoll {
        let amp_multiplier = self.config.amp_multiplier();
        let mut identifications = Vec::with_capacity(self.ranges.len());
        let mut sum = 0.0;

        for (key, range) in &self.ranges {
            if let Some(kept) = self.kept_roll(key) {
                sum += kept.percentage;
                identifications.push((key.clone(), kept));
                continue;
            }

            let (id, exact_percentage) = roll_identification(key, range.raw, amp_multiplier, &mut self.rng);
            sum += exact_percentage;
            identifications.push((key.clone(), id));
        }

        let overall = if identifications.is_empty() {
            0.0
        } else {
            round_to(sum / identifications.len() as f64, 2)
        };

        SimulatedRoll {
            identifications,
            overall,
        }
    }

    /// The previous roll of `key` if the augment keeps it
    fn kept_roll(&self, key: &str) -> Option<SimulatedId> {
        let locked = self.config.locked.as_deref()?;
        let keep = match self.config.augment {
            Augment::CorkianInsulator => key == locked,
            Augment::CorkianIsolator => key != locked,
            Augment::None | Augment::CorkianSimulator => false,
        };
        if keep {
            self.current.get(key).copied()
        } else {
            None
        }
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Roll one identification. Returns the stored result and the unrounded percentage.
fn roll_identification(key: &str, raw: i32, amp_multiplier: f64, rng: &mut ChaCha8Rng) -> (SimulatedId, f64) {
    let raw = f64::from(raw);
    let standard_roll = f64::from(rng.gen_range(0..=100u32)) / 100.0 + 0.3;
    let negative_roll = f64::from(rng.gen_range(0..=60u32)) / 100.0 + 0.7;
    let amp_roll = round_to(standard_roll + (1.3 - standard_roll) * amp_multiplier, 2);

    let is_spell_cost = key.to_ascii_lowercase().contains("spellcost");
    let max_roll = round_half_up(raw * 1.3);

    // Positive spell costs and negative stats roll in the 70%..130% band,
    // where the smaller magnitude is better
    let rolls_low = if raw > 0.0 { is_spell_cost } else { !is_spell_cost };

    let (value, min_roll) = if rolls_low {
        (round_half_up(raw * negative_roll), round_half_up(raw * 0.7))
    } else {
        (round_half_up(raw * amp_roll), round_half_up(raw * 0.3))
    };

    let percentage = if min_roll == max_roll {
        100.0
    } else if rolls_low {
        (max_roll - value) / (max_roll - min_roll) * 100.0
    } else {
        (value - min_roll) / (max_roll - min_roll) * 100.0
    };

    let stars = if raw > 0.0 && !is_spell_cost {
        if amp_roll >= 1.3 {
            Stars::Three
        } else if amp_roll >= 1.25 {
            Stars::Two
        } else if amp_roll >= 1.0 {
            Stars::One
        } else {
            Stars::Zero
        }
    } else {
        Stars::Zero
    };

    let id = SimulatedId {
        value: value as i32,
        percentage: round_to(percentage, 1),
        stars,
    };
    (id, percentage)
}
