use std::sync::Arc;

use time::macros::date;
use wetterdaten::{seed_if_empty, WeatherStore};

use crate::helpers::{FakeStore, MockGhcnSource, MockWeatherStore};

fn station_line(id: &str, lat: &str, lon: &str, elev: &str, name: &str) -> String {
    format!("{id:<11} {lat:>8} {lon:>9} {elev:>6} BY {name:<30}")
}

#[tokio::test]
async fn populated_catalog_skips_the_download_entirely() {
    let mut store = MockWeatherStore::new();
    store.expect_station_count().times(1).returning(|| Ok(128_000));
    store.expect_insert_stations().never();

    let mut source = MockGhcnSource::new();
    source.expect_fetch_stations_file().never();
    source.expect_fetch_inventory_file().never();

    seed_if_empty(&store, &source).await.unwrap();
}

#[tokio::test]
async fn seed_joins_station_metadata_with_inventory_coverage() {
    let stations_file = format!(
        "{}\n{}\n",
        station_line("GME00129634", "48.1400", "11.5800", "520.0", "MUENCHEN"),
        station_line("GME00121234", "48.4000", "11.7500", "448.0", "FREISING"),
    );
    // FREISING has no inventory line; ORPHAN0001 has no station record.
    // Neither survives the join.
    let inventory_file = "\
GME00129634  48.1400   11.5800 TMIN 1954 2010
GME00129634  48.1400   11.5800 TMAX 1961 2024
ORPHAN00011  10.0000   10.0000 TMAX 1990 2000
"
    .to_owned();

    let mut source = MockGhcnSource::new();
    source
        .expect_fetch_stations_file()
        .times(1)
        .return_once(move || Ok(stations_file));
    source
        .expect_fetch_inventory_file()
        .times(1)
        .return_once(move || Ok(inventory_file));

    let store = Arc::new(FakeStore::new());
    seed_if_empty(store.as_ref(), &source).await.unwrap();

    assert_eq!(store.station_count().await.unwrap(), 1);
    let hits = store
        .search_stations(&wetterdaten::StationSearch {
            lat: 48.14,
            lon: 11.58,
            radius_km: 1.0,
            limit: 10,
            from: None,
            to: None,
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "GME00129634");
    assert_eq!(hits[0].name, "MUENCHEN");

    // Coverage years expand to full calendar years.
    let filtered = store
        .search_stations(&wetterdaten::StationSearch {
            lat: 48.14,
            lon: 11.58,
            radius_km: 1.0,
            limit: 10,
            from: Some(date!(2024 - 12 - 31)),
            to: None,
        })
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn download_failure_leaves_the_catalog_empty_but_is_not_fatal() {
    // Port 0 never accepts, so this yields a real connect error without any
    // network traffic.
    let err = reqwest::Client::new()
        .get("http://127.0.0.1:0/")
        .send()
        .await
        .expect_err("connecting to port 0 must fail");

    let mut source = MockGhcnSource::new();
    source
        .expect_fetch_stations_file()
        .return_once(move || Err(err.into()));
    source
        .expect_fetch_inventory_file()
        .returning(|| Ok(String::new()));

    let store = Arc::new(FakeStore::new());
    seed_if_empty(store.as_ref(), &source).await.unwrap();

    assert_eq!(store.station_count().await.unwrap(), 0);
}
