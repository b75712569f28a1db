pub mod fetch;
pub mod parse;
pub mod seed;

pub use fetch::{GhcnClient, GhcnSource};
pub use parse::{parse_daily_csv, parse_inventory, parse_stations};
pub use parse::{CoverageRange, DailyRecord, StationMeta};
pub use seed::seed_if_empty;
