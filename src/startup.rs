use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use hyper::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use log::{error, info};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cache::{NoopCache, RedisCache, ResultCache},
    db::{Database, WeatherStore},
    ghcn::{seed_if_empty, GhcnClient, GhcnSource},
    routes::{self, get_stations, get_temperatures, health},
    temperatures,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WeatherStore>,
    pub source: Arc<dyn GhcnSource>,
    pub cache: Arc<dyn ResultCache>,
    pub static_dir: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::stations::get_stations,
        routes::temperatures::get_temperatures,
        routes::health::health,
    ),
    components(schemas(routes::stations::StationOut, temperatures::MonthlyTemperature)),
    tags(
        (name = "wetterdaten api", description = "GHCN-Daily station search and monthly temperature aggregates")
    )
)]
struct ApiDoc;

/// Wire the database, upstream client, and cache together, then run the
/// one-time station seed. A failed seed leaves the catalog empty (or
/// partial) but never prevents the server from starting.
pub async fn build_app_state(
    db: Arc<Database>,
    redis_url: &str,
    static_dir: String,
) -> Result<AppState, anyhow::Error> {
    let store: Arc<dyn WeatherStore> = db;
    let source: Arc<dyn GhcnSource> = Arc::new(GhcnClient::new());
    let cache: Arc<dyn ResultCache> = match RedisCache::open(redis_url) {
        Some(cache) => Arc::new(cache),
        None => Arc::new(NoopCache),
    };

    if let Err(e) = seed_if_empty(store.as_ref(), source.as_ref()).await {
        error!("station seed failed, catalog may be empty or partial: {e}");
    }

    Ok(AppState {
        store,
        source,
        cache,
        static_dir,
    })
}

/// Sanity-check the database connection before binding the listener.
pub async fn connect_database(database_url: &str) -> Result<Arc<Database>, anyhow::Error> {
    let db = Database::connect(database_url)
        .await
        .map_err(|e| anyhow!("error setting up PostgreSQL database: {e}"))?;
    db.health_check()
        .await
        .map_err(|e| anyhow!("database health check failed: {e}"))?;
    Ok(Arc::new(db))
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let serve_static = ServeDir::new(&app_state.static_dir);
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/stations", get(get_stations))
        .route("/api/temperatures", get(get_temperatures))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .fallback_service(serve_static)
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default();
    info!(target: "http_request", "new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, code: {}, time: {}", response.status().as_str(), response_time);

    response
}
