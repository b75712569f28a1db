pub mod health;
pub mod stations;
pub mod temperatures;

pub use health::health;
pub use stations::{get_stations, StationOut};
pub use temperatures::get_temperatures;

use axum::http::StatusCode;
use time::{format_description::FormatItem, macros::format_description, Date};

pub(crate) const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse an ISO date query parameter; failure is a client-input error, not a
/// server error.
pub(crate) fn parse_date_param(name: &str, raw: &str) -> Result<Date, (StatusCode, String)> {
    Date::parse(raw.trim(), DATE_FORMAT).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("{name} must be an ISO date (YYYY-MM-DD)"),
        )
    })
}
