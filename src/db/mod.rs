pub mod postgres;

use async_trait::async_trait;
use time::Date;

use crate::ghcn::DailyRecord;

pub use postgres::Database;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// One station row as written by the seed pass.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub data_start: Date,
    pub data_end: Date,
}

/// Parameters for a nearest-stations query. `from`/`to` restrict results to
/// stations whose known coverage overlaps the requested window.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSearch {
    pub lat: f64,
    pub lon: f64,
    pub radius_km: f64,
    pub limit: i64,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

/// A station matched by a spatial search, distance in kilometers.
#[derive(Debug, Clone, PartialEq)]
pub struct StationHit {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub distance_km: f64,
}

/// Durable storage for the station catalog and daily observations.
///
/// All writes are conflict-idempotent on their natural key, which is what
/// makes the racy lazy ingestion in [`crate::temperatures`] safe without any
/// locking.
#[async_trait]
pub trait WeatherStore: Send + Sync {
    async fn station_count(&self) -> Result<i64, Error>;
    /// Bulk-insert the seeded catalog in one transaction, ignoring id
    /// conflicts.
    async fn insert_stations(&self, records: &[StationRecord]) -> Result<(), Error>;
    /// Cheap existence probe, not a full read.
    async fn has_daily_data(&self, station_id: &str) -> Result<bool, Error>;
    /// Bulk-insert daily rows in one transaction, ignoring (station, date)
    /// conflicts.
    async fn insert_daily(&self, station_id: &str, rows: &[DailyRecord]) -> Result<(), Error>;
    async fn daily_rows(
        &self,
        station_id: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<DailyRecord>, Error>;
    /// Stations within the search radius, ordered by great-circle distance.
    async fn search_stations(&self, search: &StationSearch) -> Result<Vec<StationHit>, Error>;
}
