pub mod dates;
pub mod delta;
pub mod error;
pub mod fixtures;
pub mod rebalance;
pub mod reseed;

pub use dates::{parse_seed_date, shift_dates_deep, DateShifter, ShiftOutOfRange};
pub use delta::{resolve_delta_days, DEFAULT_ANCHOR_DAYS_AGO};
pub use error::SeedError;
pub use fixtures::FixtureSet;
pub use rebalance::{rebalance_project_dates, sample_without_replacement, ProjectStatus, DEFAULT_DONE_RATIO};
pub use reseed::{reseed, reseed_at};
