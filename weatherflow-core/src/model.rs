//! Persisted record types.
//!
//! Every record is created once per pipeline run, carries a creation
//! timestamp in the reporting time zone, and is handed to the store for an
//! append-only insert. Nothing here is mutated after construction.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::precipitation::PrecipCategory;

/// Daily weather summary, one row per (location, calendar date).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSummary {
    pub date: NaiveDate,
    pub location: String,
    pub avg_temp: f64,
    pub avg_feels_like: f64,
    /// Sum of the day's hourly precipitation, in mm.
    pub total_rainfall: f64,
    /// Timestamp of the hour with the highest precipitation; ties go to
    /// the earliest hour.
    pub peak_rainfall_time: NaiveDateTime,
    pub suggestion: String,
    pub weather_alert: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Hourly observation for the current day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyTrend {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub rainfall: f64,
    pub created_at: DateTime<FixedOffset>,
}

/// Forward-looking hourly entry across the whole forecast horizon, with
/// the owning day's rainfall total attached for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastEntry {
    pub date: NaiveDate,
    /// Hour timestamp converted from upstream UTC to the reporting zone.
    pub time: DateTime<FixedOffset>,
    pub temperature: f64,
    pub feels_like: f64,
    pub precipitation: f64,
    pub humidity: i32,
    pub wind_speed: f64,
    pub total_rainfall: f64,
    pub created_at: DateTime<FixedOffset>,
}

/// Hourly entry for tomorrow, wind speed included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TomorrowEntry {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub feels_like: f64,
    pub precipitation: f64,
    pub humidity: i32,
    pub wind_speed: f64,
    pub created_at: DateTime<FixedOffset>,
}

/// Tunnel sensor enriched with a precipitation estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TunnelRecord {
    pub location_name: String,
    /// Install year; parsing failures degrade to `None`.
    pub year: Option<i32>,
    pub latitude: f64,
    pub longitude: f64,
    pub precipitation_description: PrecipCategory,
    pub precipitation_intensity: f64,
    pub created_at: DateTime<FixedOffset>,
}

/// One day of the trailing precipitation series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub precipitation: f64,
    /// Fixed series tag, always `"historical"`.
    pub kind: &'static str,
    pub created_at: DateTime<FixedOffset>,
}
