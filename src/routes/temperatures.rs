use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use log::error;
use serde::Deserialize;
use utoipa::IntoParams;

use super::parse_date_param;
use crate::{
    cache::{self, temperatures_key},
    temperatures::{get_monthly, MonthlyTemperature},
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct TemperaturesParams {
    /// GHCN station id
    pub station_id: String,
    /// Start of the date range (ISO date, inclusive)
    #[serde(rename = "from")]
    pub from_date: String,
    /// End of the date range (ISO date, inclusive)
    #[serde(rename = "to")]
    pub to_date: String,
}

#[utoipa::path(
    get,
    path = "/api/temperatures",
    params(TemperaturesParams),
    responses(
        (status = OK, description = "Monthly aggregates, ascending by month; empty when the station is unknown or has no qualifying data", body = Vec<MonthlyTemperature>),
        (status = BAD_REQUEST, description = "Malformed date parameter"),
        (status = INTERNAL_SERVER_ERROR, description = "Fetch or aggregation failed")
    ))]
pub async fn get_temperatures(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TemperaturesParams>,
) -> Result<Json<Vec<MonthlyTemperature>>, (StatusCode, String)> {
    let from = parse_date_param("from", &params.from_date)?;
    let to = parse_date_param("to", &params.to_date)?;

    let key = temperatures_key(&params.station_id, &params.from_date, &params.to_date);
    if let Some(hit) = state.cache.get(&key).await {
        if let Ok(cached) = serde_json::from_value::<Vec<MonthlyTemperature>>(hit) {
            return Ok(Json(cached));
        }
    }

    let months = get_monthly(
        state.store.as_ref(),
        state.source.as_ref(),
        &params.station_id,
        from,
        to,
    )
    .await
    .map_err(|e| {
        error!(
            "temperature aggregation for {} failed: {e}",
            params.station_id
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "temperature aggregation failed".to_owned(),
        )
    })?;

    if let Ok(value) = serde_json::to_value(&months) {
        state
            .cache
            .set(&key, &value, cache::TEMPERATURES_TTL)
            .await;
    }
    Ok(Json(months))
}
