use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::parse_date_param;
use crate::{
    cache::{self, stations_key},
    db::StationSearch,
    temperatures::round1,
    AppState,
};

fn default_radius_km() -> f64 {
    50.0
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StationsParams {
    /// Latitude of the search center (WGS84 degrees)
    pub lat: f64,
    /// Longitude of the search center (WGS84 degrees)
    pub lon: f64,
    /// Search radius in kilometers (1-100)
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    /// Maximum number of stations to return (1-50)
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Only stations with temperature coverage ending on/after this ISO date
    #[serde(rename = "from")]
    pub from_date: Option<String>,
    /// Only stations with temperature coverage starting on/before this ISO date
    #[serde(rename = "to")]
    pub to_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StationOut {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

#[utoipa::path(
    get,
    path = "/api/stations",
    params(StationsParams),
    responses(
        (status = OK, description = "Stations within the radius, nearest first", body = Vec<StationOut>),
        (status = BAD_REQUEST, description = "Parameter out of range or malformed date"),
        (status = INTERNAL_SERVER_ERROR, description = "Station search failed")
    ))]
pub async fn get_stations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StationsParams>,
) -> Result<Json<Vec<StationOut>>, (StatusCode, String)> {
    // Validate before any cache or storage access.
    if !(1.0..=100.0).contains(&params.radius_km) {
        return Err((
            StatusCode::BAD_REQUEST,
            "radius_km must be between 1 and 100".to_owned(),
        ));
    }
    if !(1..=50).contains(&params.limit) {
        return Err((
            StatusCode::BAD_REQUEST,
            "limit must be between 1 and 50".to_owned(),
        ));
    }
    let from = params
        .from_date
        .as_deref()
        .map(|raw| parse_date_param("from", raw))
        .transpose()?;
    let to = params
        .to_date
        .as_deref()
        .map(|raw| parse_date_param("to", raw))
        .transpose()?;

    let key = stations_key(
        params.lat,
        params.lon,
        params.radius_km,
        params.limit,
        params.from_date.as_deref(),
        params.to_date.as_deref(),
    );
    if let Some(hit) = state.cache.get(&key).await {
        if let Ok(cached) = serde_json::from_value::<Vec<StationOut>>(hit) {
            return Ok(Json(cached));
        }
    }

    let search = StationSearch {
        lat: params.lat,
        lon: params.lon,
        radius_km: params.radius_km,
        limit: i64::from(params.limit),
        from,
        to,
    };
    let hits = state.store.search_stations(&search).await.map_err(|e| {
        error!("station search failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "station search failed".to_owned(),
        )
    })?;

    let out: Vec<StationOut> = hits
        .into_iter()
        .map(|hit| StationOut {
            id: hit.id,
            name: hit.name,
            lat: hit.lat,
            lon: hit.lon,
            distance_km: round1(hit.distance_km),
        })
        .collect();

    if let Ok(value) = serde_json::to_value(&out) {
        state.cache.set(&key, &value, cache::STATIONS_TTL).await;
    }
    Ok(Json(out))
}
