use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Row,
};
use time::Date;

use super::{Error, StationHit, StationRecord, StationSearch, WeatherStore};
use crate::ghcn::DailyRecord;

const SEED_BATCH: usize = 2000;
const DAILY_BATCH: usize = 5000;

pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        info!("PostgreSQL schema ready");
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Basic connectivity check.
    pub async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    /// Drain the connection pool before shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("database connection pool closed");
    }
}

#[async_trait]
impl WeatherStore for Database {
    async fn station_count(&self) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM stations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_stations(&self, records: &[StationRecord]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        for (batch_index, batch) in records.chunks(SEED_BATCH).enumerate() {
            let mut ids = Vec::with_capacity(batch.len());
            let mut names = Vec::with_capacity(batch.len());
            let mut lats = Vec::with_capacity(batch.len());
            let mut lons = Vec::with_capacity(batch.len());
            let mut elevations = Vec::with_capacity(batch.len());
            let mut starts = Vec::with_capacity(batch.len());
            let mut ends = Vec::with_capacity(batch.len());
            for record in batch {
                ids.push(record.id.clone());
                names.push(record.name.clone());
                lats.push(record.lat);
                lons.push(record.lon);
                elevations.push(record.elevation);
                starts.push(record.data_start);
                ends.push(record.data_end);
            }

            sqlx::query(
                r#"
                INSERT INTO stations (id, name, lat, lon, elevation, geom, data_start, data_end)
                SELECT id, name, lat, lon, elevation,
                       ST_SetSRID(ST_MakePoint(lon, lat), 4326)::geography,
                       data_start, data_end
                FROM UNNEST($1::text[], $2::text[], $3::float8[], $4::float8[],
                            $5::float8[], $6::date[], $7::date[])
                     AS t(id, name, lat, lon, elevation, data_start, data_end)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&ids)
            .bind(&names)
            .bind(&lats)
            .bind(&lons)
            .bind(&elevations)
            .bind(&starts)
            .bind(&ends)
            .execute(&mut *tx)
            .await?;

            if batch_index % 10 == 0 {
                debug!(
                    "seeded {} / {} stations",
                    (batch_index * SEED_BATCH + batch.len()).min(records.len()),
                    records.len()
                );
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn has_daily_data(&self, station_id: &str) -> Result<bool, Error> {
        let row = sqlx::query("SELECT 1 FROM daily_temperatures WHERE station_id = $1 LIMIT 1")
            .bind(station_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_daily(&self, station_id: &str, rows: &[DailyRecord]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        for batch in rows.chunks(DAILY_BATCH) {
            let mut dates = Vec::with_capacity(batch.len());
            let mut tmins = Vec::with_capacity(batch.len());
            let mut tavgs = Vec::with_capacity(batch.len());
            let mut tmaxs = Vec::with_capacity(batch.len());
            for row in batch {
                dates.push(row.date);
                tmins.push(row.tmin);
                tavgs.push(row.tavg);
                tmaxs.push(row.tmax);
            }

            sqlx::query(
                r#"
                INSERT INTO daily_temperatures (station_id, date, tmin, tavg, tmax)
                SELECT $1, date, tmin, tavg, tmax
                FROM UNNEST($2::date[], $3::float8[], $4::float8[], $5::float8[])
                     AS t(date, tmin, tavg, tmax)
                ON CONFLICT (station_id, date) DO NOTHING
                "#,
            )
            .bind(station_id)
            .bind(&dates)
            .bind(&tmins)
            .bind(&tavgs)
            .bind(&tmaxs)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn daily_rows(
        &self,
        station_id: &str,
        from: Date,
        to: Date,
    ) -> Result<Vec<DailyRecord>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT date, tmin, tavg, tmax
            FROM daily_temperatures
            WHERE station_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date
            "#,
        )
        .bind(station_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(DailyRecord {
                    date: row.try_get("date")?,
                    tmin: row.try_get("tmin")?,
                    tavg: row.try_get("tavg")?,
                    tmax: row.try_get("tmax")?,
                })
            })
            .collect()
    }

    async fn search_stations(&self, search: &StationSearch) -> Result<Vec<StationHit>, Error> {
        let radius_m = search.radius_km * 1000.0;
        let rows = sqlx::query(
            r#"
            SELECT id, name, lat, lon,
                   ST_Distance(
                       geom,
                       ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography
                   ) / 1000.0 AS distance_km
            FROM stations
            WHERE ST_DWithin(geom, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3)
              AND ($4::date IS NULL OR data_end >= $4::date)
              AND ($5::date IS NULL OR data_start <= $5::date)
            ORDER BY distance_km
            LIMIT $6
            "#,
        )
        .bind(search.lon)
        .bind(search.lat)
        .bind(radius_m)
        .bind(search.from)
        .bind(search.to)
        .bind(search.limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(StationHit {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    lat: row.try_get("lat")?,
                    lon: row.try_get("lon")?,
                    distance_km: row.try_get("distance_km")?,
                })
            })
            .collect()
    }
}
