//! Series records, lock-in rules and rule loading

mod data;
pub mod loader;

pub use data::{
    Series, SeriesStatus, SeriesLockInRule, LockInRules, SeriesAggregate, DEFAULT_LOCK_IN_MONTHS,
};
pub use loader::{load_lock_in_rules, load_lock_in_rules_from_reader};
