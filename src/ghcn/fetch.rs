use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use reqwest::{Client, StatusCode};

use super::parse::{parse_daily_csv, DailyRecord};

pub const STATIONS_URL: &str = "https://www.ncei.noaa.gov/pub/data/ghcn/daily/ghcnd-stations.txt";
pub const INVENTORY_URL: &str = "https://www.ncei.noaa.gov/pub/data/ghcn/daily/ghcnd-inventory.txt";
pub const DAILY_CSV_BASE: &str =
    "https://www.ncei.noaa.gov/data/global-historical-climatology-network-daily/access";

// The bulk metadata files are tens of megabytes from a slow public archive;
// per-station CSVs are smaller but still minutes-scale on a bad day.
const METADATA_TIMEOUT: Duration = Duration::from_secs(180);
const DAILY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("GHCN request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Read-only view of the upstream GHCN archive.
#[async_trait]
pub trait GhcnSource: Send + Sync {
    async fn fetch_stations_file(&self) -> Result<String, Error>;
    async fn fetch_inventory_file(&self) -> Result<String, Error>;
    /// Full daily history for one station. `Ok(None)` means the archive has
    /// no series for this id (a 404, not an error).
    async fn fetch_daily_series(&self, station_id: &str)
        -> Result<Option<Vec<DailyRecord>>, Error>;
}

pub struct GhcnClient {
    client: Client,
    stations_url: String,
    inventory_url: String,
    daily_csv_base: String,
}

impl GhcnClient {
    pub fn new() -> Self {
        Self::with_urls(STATIONS_URL, INVENTORY_URL, DAILY_CSV_BASE)
    }

    pub fn with_urls(stations_url: &str, inventory_url: &str, daily_csv_base: &str) -> Self {
        Self {
            client: Client::new(),
            stations_url: stations_url.to_owned(),
            inventory_url: inventory_url.to_owned(),
            daily_csv_base: daily_csv_base.to_owned(),
        }
    }

    async fn download_text(&self, url: &str, timeout: Duration) -> Result<String, Error> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

impl Default for GhcnClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GhcnSource for GhcnClient {
    async fn fetch_stations_file(&self) -> Result<String, Error> {
        self.download_text(&self.stations_url, METADATA_TIMEOUT)
            .await
    }

    async fn fetch_inventory_file(&self) -> Result<String, Error> {
        self.download_text(&self.inventory_url, METADATA_TIMEOUT)
            .await
    }

    async fn fetch_daily_series(
        &self,
        station_id: &str,
    ) -> Result<Option<Vec<DailyRecord>>, Error> {
        let url = format!("{}/{}.csv", self.daily_csv_base, station_id);
        let response = self.client.get(&url).timeout(DAILY_TIMEOUT).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!("no GHCN daily series for station {station_id} (404)");
            return Ok(None);
        }
        let raw = response.error_for_status()?.text().await?;
        Ok(Some(parse_daily_csv(&raw)))
    }
}
