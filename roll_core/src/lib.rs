pub mod config;
pub mod identification;
pub mod item;
pub mod ranking;
pub mod roll;
pub mod simulator;
pub mod storage;
pub mod types;

pub use config::ItemDatabase;
pub use item::Item;
pub use roll::{calculate_identification_roll, RollResult};
pub use simulator::RollSimulator;
pub use storage::RolledItem;
pub use types::*;
