use futures::try_join;
use log::{error, info};
use time::{Date, Month};

use super::fetch::GhcnSource;
use super::parse::{parse_inventory, parse_stations};
use crate::db::{self, StationRecord, WeatherStore};

/// Populate the station catalog from the GHCN metadata files, once.
///
/// A non-empty catalog short-circuits without touching the network, so the
/// seed is idempotent across restarts. Download failures degrade to an empty
/// catalog and are not fatal; storage failures propagate so the transaction
/// rolls back.
pub async fn seed_if_empty(
    store: &dyn WeatherStore,
    source: &dyn GhcnSource,
) -> Result<(), db::Error> {
    if store.station_count().await? > 0 {
        info!("station catalog already populated, skipping GHCN import");
        return Ok(());
    }

    info!("station catalog empty, downloading GHCN metadata");
    let (stations_raw, inventory_raw) = match try_join!(
        source.fetch_stations_file(),
        source.fetch_inventory_file()
    ) {
        Ok(pair) => pair,
        Err(e) => {
            error!("failed to download GHCN metadata, starting with empty station catalog: {e}");
            return Ok(());
        }
    };

    let stations = parse_stations(&stations_raw);
    let inventory = parse_inventory(&inventory_raw);

    // Only stations with both metadata and temperature coverage survive the
    // join; inventory ids without a station record are dropped.
    let mut records = Vec::with_capacity(inventory.len());
    for (id, range) in inventory {
        let Some(meta) = stations.get(&id) else {
            continue;
        };
        let (Ok(data_start), Ok(data_end)) = (
            Date::from_calendar_date(range.start_year, Month::January, 1),
            Date::from_calendar_date(range.end_year, Month::December, 31),
        ) else {
            continue;
        };
        records.push(StationRecord {
            id,
            name: meta.name.clone(),
            lat: meta.lat,
            lon: meta.lon,
            elevation: meta.elevation,
            data_start,
            data_end,
        });
    }

    info!("inserting {} stations", records.len());
    store.insert_stations(&records).await?;
    info!("station import complete");
    Ok(())
}
