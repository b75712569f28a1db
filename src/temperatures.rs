use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};
use time::Date;
use utoipa::ToSchema;

use crate::db::{self, WeatherStore};
use crate::ghcn::{fetch, DailyRecord, GhcnSource};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] db::Error),
    #[error(transparent)]
    Fetch(#[from] fetch::Error),
}

/// Monthly min/avg/max temperatures in °C, one decimal place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyTemperature {
    /// Month key, `YYYY-MM`.
    pub date: String,
    pub level: String,
    pub tmin: f64,
    pub tavg: f64,
    pub tmax: f64,
}

/// Make sure the station's daily series exists in durable storage, fetching
/// it from GHCN on first access.
///
/// Returns false when the archive has nothing usable for this station. May
/// run concurrently for the same station; the conflict-idempotent insert
/// makes the race harmless (duplicate download work at worst, never
/// duplicate rows).
pub async fn ensure_daily_data(
    store: &dyn WeatherStore,
    source: &dyn GhcnSource,
    station_id: &str,
) -> Result<bool, Error> {
    if store.has_daily_data(station_id).await? {
        return Ok(true);
    }

    info!("downloading GHCN daily series for {station_id}");
    let Some(series) = source.fetch_daily_series(station_id).await? else {
        return Ok(false);
    };

    let rows = normalize_daily(series);
    if rows.is_empty() {
        return Ok(false);
    }

    store.insert_daily(station_id, &rows).await?;
    info!("stored {} daily records for {station_id}", rows.len());
    Ok(true)
}

/// Monthly aggregates for a station over `[from, to]` inclusive. Empty when
/// the station is unknown or has no qualifying data.
pub async fn get_monthly(
    store: &dyn WeatherStore,
    source: &dyn GhcnSource,
    station_id: &str,
    from: Date,
    to: Date,
) -> Result<Vec<MonthlyTemperature>, Error> {
    if !ensure_daily_data(store, source, station_id).await? {
        return Ok(Vec::new());
    }
    let rows = store.daily_rows(station_id, from, to).await?;
    Ok(aggregate_monthly(&rows))
}

/// Round temperatures to the single decimal GHCN resolution, and drop days
/// carrying neither a minimum nor a maximum (a tavg-only day is useless for
/// the monthly qualification rule).
fn normalize_daily(series: Vec<DailyRecord>) -> Vec<DailyRecord> {
    series
        .into_iter()
        .filter_map(|record| {
            let tmin = record.tmin.map(round1);
            let tmax = record.tmax.map(round1);
            let tavg = record.tavg.map(round1);
            if tmin.is_none() && tmax.is_none() {
                return None;
            }
            Some(DailyRecord {
                date: record.date,
                tmin,
                tmax,
                tavg,
            })
        })
        .collect()
}

#[derive(Default)]
struct MonthAccumulator {
    tmin_sum: f64,
    tmin_count: u32,
    tmax_sum: f64,
    tmax_count: u32,
    tavg_sum: f64,
    tavg_count: u32,
    qualified: bool,
}

/// Group daily rows by calendar month and average each field over the days
/// where it is present. A day without an explicit tavg contributes the
/// tmin/tmax midpoint instead, when both exist. Months where no single day
/// has both tmin and tmax are omitted entirely.
pub fn aggregate_monthly(rows: &[DailyRecord]) -> Vec<MonthlyTemperature> {
    let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();

    for row in rows {
        let key = format!("{:04}-{:02}", row.date.year(), u8::from(row.date.month()));
        let acc = months.entry(key).or_default();

        if let Some(tmin) = row.tmin {
            acc.tmin_sum += tmin;
            acc.tmin_count += 1;
        }
        if let Some(tmax) = row.tmax {
            acc.tmax_sum += tmax;
            acc.tmax_count += 1;
        }
        let tavg = row.tavg.or(match (row.tmin, row.tmax) {
            (Some(tmin), Some(tmax)) => Some((tmin + tmax) / 2.0),
            _ => None,
        });
        if let Some(tavg) = tavg {
            acc.tavg_sum += tavg;
            acc.tavg_count += 1;
        }
        if row.tmin.is_some() && row.tmax.is_some() {
            acc.qualified = true;
        }
    }

    // BTreeMap iteration gives the ascending YYYY-MM order for free.
    months
        .into_iter()
        .filter(|(_, acc)| acc.qualified)
        .map(|(date, acc)| MonthlyTemperature {
            date,
            level: "month".to_owned(),
            tmin: round1(acc.tmin_sum / f64::from(acc.tmin_count)),
            tavg: round1(acc.tavg_sum / f64::from(acc.tavg_count)),
            tmax: round1(acc.tmax_sum / f64::from(acc.tmax_count)),
        })
        .collect()
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
