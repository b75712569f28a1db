use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;
use time::macros::date;
use wetterdaten::{StationHit, StationOut, WeatherStore};

use crate::helpers::{
    get, spawn_app, CountingCache, CountingSource, FakeStore, MockGhcnSource, MockWeatherStore,
};

#[tokio::test]
async fn nearest_station_comes_first_with_zero_distance() {
    let mut store = MockWeatherStore::new();
    store.expect_search_stations().times(1).returning(|_| {
        Ok(vec![
            StationHit {
                id: "GME00129634".to_owned(),
                name: "MUENCHEN".to_owned(),
                lat: 48.14,
                lon: 11.58,
                distance_km: 0.02,
            },
            StationHit {
                id: "GME00121234".to_owned(),
                name: "FREISING".to_owned(),
                lat: 48.40,
                lon: 11.75,
                distance_km: 31.66,
            },
        ])
    });
    let app = spawn_app(
        Arc::new(store),
        Arc::new(MockGhcnSource::new()),
        Arc::new(CountingCache::default()),
    );

    let (status, body) = get(&app, "/api/stations?lat=48.14&lon=11.58&radius_km=50&limit=10").await;

    assert_eq!(status, StatusCode::OK);
    let stations: Vec<StationOut> = serde_json::from_slice(&body).unwrap();
    assert_eq!(stations.len(), 2);
    assert_eq!(stations[0].id, "GME00129634");
    assert_eq!(stations[0].distance_km, 0.0);
    assert_eq!(stations[1].distance_km, 31.7);
}

#[tokio::test]
async fn distance_uses_camel_case_key() {
    let mut store = MockWeatherStore::new();
    store.expect_search_stations().returning(|_| {
        Ok(vec![StationHit {
            id: "GME00129634".to_owned(),
            name: "MUENCHEN".to_owned(),
            lat: 48.14,
            lon: 11.58,
            distance_km: 4.25,
        }])
    });
    let app = spawn_app(
        Arc::new(store),
        Arc::new(MockGhcnSource::new()),
        Arc::new(CountingCache::default()),
    );

    let (_, body) = get(&app, "/api/stations?lat=48.14&lon=11.58").await;

    let raw: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(raw[0]["distanceKm"], 4.3);
    assert!(raw[0].get("distance_km").is_none());
}

#[tokio::test]
async fn radius_above_maximum_is_rejected_before_any_backend_access() {
    let mut store = MockWeatherStore::new();
    store.expect_search_stations().never();
    let cache = Arc::new(CountingCache::default());
    let app = spawn_app(Arc::new(store), Arc::new(MockGhcnSource::new()), cache.clone());

    let (status, _) = get(&app, "/api/stations?lat=48.14&lon=11.58&radius_km=200").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn limit_out_of_range_is_rejected() {
    let mut store = MockWeatherStore::new();
    store.expect_search_stations().never();
    let app = spawn_app(
        Arc::new(store),
        Arc::new(MockGhcnSource::new()),
        Arc::new(CountingCache::default()),
    );

    let (status, _) = get(&app, "/api/stations?lat=48.14&lon=11.58&limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/stations?lat=48.14&lon=11.58&limit=51").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_date_filter_is_rejected() {
    let mut store = MockWeatherStore::new();
    store.expect_search_stations().never();
    let app = spawn_app(
        Arc::new(store),
        Arc::new(MockGhcnSource::new()),
        Arc::new(CountingCache::default()),
    );

    let (status, _) = get(&app, "/api/stations?lat=48.14&lon=11.58&from=2020-13-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_required_coordinates_are_rejected() {
    let app = spawn_app(
        Arc::new(MockWeatherStore::new()),
        Arc::new(MockGhcnSource::new()),
        Arc::new(CountingCache::default()),
    );

    let (status, _) = get(&app, "/api/stations?lon=11.58").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn coverage_filters_reach_the_store_and_empty_matches_are_ok() {
    let mut store = MockWeatherStore::new();
    store
        .expect_search_stations()
        .withf(|search| {
            search.from == Some(date!(2020 - 01 - 01)) && search.to == Some(date!(2021 - 12 - 31))
        })
        .times(1)
        .returning(|_| Ok(Vec::new()));
    let app = spawn_app(
        Arc::new(store),
        Arc::new(MockGhcnSource::new()),
        Arc::new(CountingCache::default()),
    );

    let (status, body) = get(
        &app,
        "/api/stations?lat=48.14&lon=11.58&from=2020-01-01&to=2021-12-31",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn search_results_are_written_back_to_the_cache() {
    let mut store = MockWeatherStore::new();
    store.expect_search_stations().returning(|_| Ok(Vec::new()));
    let cache = Arc::new(CountingCache::default());
    let app = spawn_app(Arc::new(store), Arc::new(MockGhcnSource::new()), cache.clone());

    let (status, _) = get(&app, "/api/stations?lat=48.14&lon=11.58").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.gets.load(Ordering::SeqCst), 1);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = spawn_app(
        Arc::new(MockWeatherStore::new()),
        Arc::new(MockGhcnSource::new()),
        Arc::new(CountingCache::default()),
    );

    let (status, body) = get(&app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    let raw: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(raw["status"], "ok");
}

// Scenario from the frontend: exact-location station within the default
// radius, exercised end to end against the in-memory store.
#[tokio::test]
async fn exact_location_station_found_via_fake_store() {
    use wetterdaten::StationRecord;

    let store = Arc::new(FakeStore::new());
    store
        .insert_stations(&[StationRecord {
            id: "GME00129634".to_owned(),
            name: "MUENCHEN".to_owned(),
            lat: 48.14,
            lon: 11.58,
            elevation: Some(520.0),
            data_start: date!(1954 - 01 - 01),
            data_end: date!(2024 - 12 - 31),
        }])
        .await
        .unwrap();
    let app = spawn_app(
        store,
        Arc::new(CountingSource::new(None)),
        Arc::new(CountingCache::default()),
    );

    let (status, body) = get(&app, "/api/stations?lat=48.14&lon=11.58&radius_km=50&limit=10").await;

    assert_eq!(status, StatusCode::OK);
    let stations: Vec<StationOut> = serde_json::from_slice(&body).unwrap();
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].distance_km, 0.0);
}
