pub mod cache;
pub mod config;
pub mod db;
pub mod ghcn;
pub mod routes;
pub mod startup;
pub mod temperatures;
pub mod utils;

pub use cache::{NoopCache, RedisCache, ResultCache};
pub use config::{find_config_file, load_config, ConfigSource};
pub use db::{Database, StationHit, StationRecord, StationSearch, WeatherStore};
pub use ghcn::{
    parse_daily_csv, parse_inventory, parse_stations, seed_if_empty, CoverageRange, DailyRecord,
    GhcnClient, GhcnSource, StationMeta,
};
pub use routes::{get_stations, get_temperatures, health, StationOut};
pub use startup::{app, build_app_state, connect_database, AppState};
pub use temperatures::{aggregate_monthly, ensure_daily_data, get_monthly, MonthlyTemperature};
pub use utils::{get_config_info, get_log_level, setup_logger, Cli};
