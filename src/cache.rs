use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde_json::Value;
use tokio::sync::OnceCell;

/// Station metadata barely changes; searches can be cached briefly.
pub const STATIONS_TTL: Duration = Duration::from_secs(600);
/// Aggregates are immutable for a given parameter set but cheap to recompute,
/// expensive to refetch.
pub const TEMPERATURES_TTL: Duration = Duration::from_secs(3600);

/// Best-effort result cache. Implementations must never surface a failure:
/// a broken read is a miss, a broken write is a no-op.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: &Value, ttl: Duration);
}

pub fn stations_key(
    lat: f64,
    lon: f64,
    radius_km: f64,
    limit: u32,
    from: Option<&str>,
    to: Option<&str>,
) -> String {
    format!(
        "stations:{lat}:{lon}:{radius_km}:{limit}:{}:{}",
        from.unwrap_or("-"),
        to.unwrap_or("-")
    )
}

pub fn temperatures_key(station_id: &str, from: &str, to: &str) -> String {
    format!("temps:{station_id}:{from}:{to}")
}

pub struct RedisCache {
    client: redis::Client,
    manager: OnceCell<ConnectionManager>,
}

impl RedisCache {
    /// Returns `None` only for an unparseable URL; an unreachable server is
    /// handled per-operation so the cache can come and go at runtime.
    pub fn open(redis_url: &str) -> Option<Self> {
        match redis::Client::open(redis_url) {
            Ok(client) => Some(Self {
                client,
                manager: OnceCell::new(),
            }),
            Err(e) => {
                debug!("invalid redis url, result cache disabled: {e}");
                None
            }
        }
    }

    async fn connection(&self) -> Option<ConnectionManager> {
        self.manager
            .get_or_try_init(|| self.client.get_connection_manager())
            .await
            .ok()
            .cloned()
    }
}

#[async_trait]
impl ResultCache for RedisCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(key).await.ok()?;
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) {
        let Some(mut conn) = self.connection().await else {
            return;
        };
        let Ok(raw) = serde_json::to_string(value) else {
            return;
        };
        if let Err(e) = conn.set_ex::<_, _, ()>(key, raw, ttl.as_secs()).await {
            debug!("cache write for {key} failed: {e}");
        }
    }
}

/// Stand-in when no cache is configured; every read is a miss.
pub struct NoopCache;

#[async_trait]
impl ResultCache for NoopCache {
    async fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn set(&self, _key: &str, _value: &Value, _ttl: Duration) {}
}
