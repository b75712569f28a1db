use std::collections::HashMap;

use time::{format_description::FormatItem, macros::format_description, Date};

/// Minimum byte length of a `ghcnd-stations.txt` record. Shorter lines are
/// truncated garbage and get skipped.
const MIN_STATION_LINE_LEN: usize = 71;

/// GHCN encodes "elevation unknown" as -999.9.
const ELEVATION_SENTINEL: &str = "-999.9";

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Station metadata as parsed from the fixed-width station list.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMeta {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
}

/// Temperature coverage years for one station, merged across all of its
/// TMIN/TMAX inventory lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageRange {
    pub start_year: i32,
    pub end_year: i32,
}

/// One normalized day of a station's series. All three temperatures are
/// always present as optional values so downstream code never has to ask
/// whether a column existed in the source CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: Date,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    pub tavg: Option<f64>,
}

/// Parse `ghcnd-stations.txt` into a map keyed by station id.
///
/// Malformed lines (too short, non-numeric coordinates) are dropped, never
/// an error. A blank name falls back to the station id.
pub fn parse_stations(raw: &str) -> HashMap<String, StationMeta> {
    let mut stations = HashMap::new();
    for line in raw.lines() {
        if line.len() < MIN_STATION_LINE_LEN {
            continue;
        }
        let Some(id) = line.get(0..11).map(str::trim) else {
            continue;
        };
        let lat = line.get(12..20).and_then(|s| s.trim().parse::<f64>().ok());
        let lon = line.get(21..30).and_then(|s| s.trim().parse::<f64>().ok());
        let (Some(lat), Some(lon)) = (lat, lon) else {
            continue;
        };
        let elevation = line
            .get(31..37)
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != ELEVATION_SENTINEL)
            .and_then(|s| s.parse::<f64>().ok());
        let name = line
            .get(41..71)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(id);
        stations.insert(
            id.to_owned(),
            StationMeta {
                id: id.to_owned(),
                name: name.to_owned(),
                lat,
                lon,
                elevation,
            },
        );
    }
    stations
}

/// Parse `ghcnd-inventory.txt` into temperature coverage ranges.
///
/// Only TMIN/TMAX lines contribute. When one station has several qualifying
/// lines the ranges are unioned: min of starts, max of ends.
pub fn parse_inventory(raw: &str) -> HashMap<String, CoverageRange> {
    let mut inventory: HashMap<String, CoverageRange> = HashMap::new();
    for line in raw.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 6 {
            continue;
        }
        let (id, element) = (parts[0], parts[3]);
        if element != "TMIN" && element != "TMAX" {
            continue;
        }
        let (Ok(start_year), Ok(end_year)) = (parts[4].parse::<i32>(), parts[5].parse::<i32>())
        else {
            continue;
        };
        inventory
            .entry(id.to_owned())
            .and_modify(|range| {
                range.start_year = range.start_year.min(start_year);
                range.end_year = range.end_year.max(end_year);
            })
            .or_insert(CoverageRange {
                start_year,
                end_year,
            });
    }
    inventory
}

/// Parse a per-station GHCN daily CSV into normalized records.
///
/// Temperatures arrive in tenths of a degree Celsius and are divided by 10.
/// Rows with unparseable dates are dropped; non-numeric temperature cells
/// become `None`. A source file missing a temperature column yields `None`
/// for that field on every row.
pub fn parse_daily_csv(raw: &str) -> Vec<DailyRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_bytes());

    let Ok(headers) = reader.headers() else {
        return Vec::new();
    };
    let column = |name: &str| headers.iter().position(|h| h == name);
    let Some(date_idx) = column("DATE") else {
        return Vec::new();
    };
    let tmin_idx = column("TMIN");
    let tmax_idx = column("TMAX");
    let tavg_idx = column("TAVG");

    let mut records = Vec::new();
    for row in reader.records() {
        let Ok(row) = row else {
            continue;
        };
        let Some(date) = row
            .get(date_idx)
            .and_then(|s| Date::parse(s.trim(), DATE_FORMAT).ok())
        else {
            continue;
        };
        let tenths = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .and_then(|s| s.trim().parse::<f64>().ok())
                .map(|v| v / 10.0)
        };
        records.push(DailyRecord {
            date,
            tmin: tenths(tmin_idx),
            tmax: tenths(tmax_idx),
            tavg: tenths(tavg_idx),
        });
    }
    records
}
