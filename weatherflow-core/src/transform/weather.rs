use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{PipelineError, Result},
    fetch::weatherapi::{ForecastDay, ForecastResponse},
    model::{ForecastEntry, HourlyTrend, TomorrowEntry, WeatherSummary},
    transform::{REPORTING_TZ, to_reporting_time},
};

/// Which clothing-advisory rule set the daily summary applies.
///
/// Two incompatible rule sets were in circulation; both are kept and the
/// choice is configuration, not code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryStyle {
    /// Umbrella above 0.5 mm of rain, otherwise nothing special.
    #[default]
    RainOnly,
    /// Rain and temperature grid with 7 and 13 degree cut-offs.
    TemperatureAware,
}

/// Derives the persisted weather batches from one raw forecast payload.
///
/// All four operations read the same fetched payload; `now` is passed in
/// so a run stamps every batch with one consistent creation time.
#[derive(Debug, Clone, Copy)]
pub struct WeatherTransformer {
    advisory: AdvisoryStyle,
}

impl WeatherTransformer {
    pub fn new(advisory: AdvisoryStyle) -> Self {
        Self { advisory }
    }

    /// Daily summary for day 0.
    ///
    /// Means are taken over the hourly series; the total is the sum of
    /// hourly precipitation. Fails on an empty hour sequence.
    pub fn summarize(
        &self,
        payload: &ForecastResponse,
        now: DateTime<Utc>,
    ) -> Result<WeatherSummary> {
        let day = first_day(payload)?;
        let hours = &day.hour;

        if hours.is_empty() {
            return Err(PipelineError::EmptyHours { date: day.date });
        }

        let n = hours.len() as f64;
        let avg_temp = hours.iter().map(|h| h.temp_c).sum::<f64>() / n;
        let avg_feels_like = hours.iter().map(|h| h.feelslike_c).sum::<f64>() / n;
        let total_rainfall: f64 = hours.iter().map(|h| h.precip_mm).sum();

        // Strict comparison keeps the first hour on ties.
        let mut peak = &hours[0];
        for hour in &hours[1..] {
            if hour.precip_mm > peak.precip_mm {
                peak = hour;
            }
        }

        Ok(WeatherSummary {
            date: local_date(payload, day),
            location: payload.location.name.clone(),
            avg_temp,
            avg_feels_like,
            total_rainfall,
            peak_rainfall_time: peak.time,
            suggestion: advisory_text(self.advisory, total_rainfall, avg_temp).to_string(),
            weather_alert: alert_text(payload),
            created_at: to_reporting_time(now),
        })
    }

    /// Hourly trend rows for day 0.
    ///
    /// De-duplicated by timestamp within the batch, keeping the last
    /// occurrence, emitted in ascending time order.
    pub fn today_trends(
        &self,
        payload: &ForecastResponse,
        now: DateTime<Utc>,
    ) -> Result<Vec<HourlyTrend>> {
        let day = first_day(payload)?;

        if day.hour.is_empty() {
            return Err(PipelineError::EmptyHours { date: day.date });
        }

        let created_at = to_reporting_time(now);

        // Later inserts win, which keeps the last occurrence per timestamp.
        let mut by_time = BTreeMap::new();
        for hour in &day.hour {
            by_time.insert(
                hour.time,
                HourlyTrend {
                    time: hour.time,
                    temperature: hour.temp_c,
                    feels_like: hour.feelslike_c,
                    humidity: hour.humidity,
                    rainfall: hour.precip_mm,
                    created_at,
                },
            );
        }

        Ok(by_time.into_values().collect())
    }

    /// One row per hour across the whole horizon, in reporting-zone time,
    /// with the owning day's rainfall total attached.
    pub fn forecast_entries(
        &self,
        payload: &ForecastResponse,
        now: DateTime<Utc>,
    ) -> Vec<ForecastEntry> {
        let created_at = to_reporting_time(now);
        let mut rows = Vec::new();

        for day in &payload.forecast.forecastday {
            let total_rainfall = day.day.totalprecip_mm;

            for hour in &day.hour {
                // Hour stamps are naive; upstream serves them as UTC.
                let time = Utc
                    .from_utc_datetime(&hour.time)
                    .with_timezone(&REPORTING_TZ)
                    .fixed_offset();

                rows.push(ForecastEntry {
                    date: day.date,
                    time,
                    temperature: hour.temp_c,
                    feels_like: hour.feelslike_c,
                    precipitation: hour.precip_mm,
                    humidity: hour.humidity,
                    wind_speed: hour.wind_kph,
                    total_rainfall,
                    created_at,
                });
            }
        }

        rows
    }

    /// Hourly rows for day 1, wind speed included. Fails loudly when the
    /// horizon is shorter than two days instead of defaulting.
    pub fn tomorrow(
        &self,
        payload: &ForecastResponse,
        now: DateTime<Utc>,
    ) -> Result<Vec<TomorrowEntry>> {
        let days = &payload.forecast.forecastday;

        let Some(day) = days.get(1) else {
            return Err(PipelineError::MissingForecastDay { need: 2, got: days.len() });
        };

        let created_at = to_reporting_time(now);

        Ok(day
            .hour
            .iter()
            .map(|hour| TomorrowEntry {
                time: hour.time,
                temperature: hour.temp_c,
                feels_like: hour.feelslike_c,
                precipitation: hour.precip_mm,
                humidity: hour.humidity,
                wind_speed: hour.wind_kph,
                created_at,
            })
            .collect())
    }
}

fn first_day(payload: &ForecastResponse) -> Result<&ForecastDay> {
    payload
        .forecast
        .forecastday
        .first()
        .ok_or(PipelineError::MissingForecastDay { need: 1, got: 0 })
}

/// Calendar date at the location, taken from the upstream local-time
/// string; falls back to the forecast day's own date if unparseable.
fn local_date(payload: &ForecastResponse, day: &ForecastDay) -> NaiveDate {
    payload
        .location
        .localtime
        .split_whitespace()
        .next()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or(day.date)
}

fn alert_text(payload: &ForecastResponse) -> String {
    payload
        .alerts
        .alert
        .first()
        .map(|alert| alert.headline.clone())
        .unwrap_or_else(|| "No alerts".to_string())
}

fn advisory_text(style: AdvisoryStyle, total_rainfall: f64, avg_temp: f64) -> &'static str {
    match style {
        AdvisoryStyle::RainOnly => {
            if total_rainfall > 0.5 {
                "Bring an umbrella!"
            } else {
                "No special clothing needed."
            }
        }
        AdvisoryStyle::TemperatureAware => {
            if total_rainfall > 0.5 {
                if avg_temp < 7.0 {
                    "Take your gloves and umbrella!"
                } else if avg_temp < 13.0 {
                    "Bring your hat and umbrella!"
                } else {
                    "Take an umbrella!"
                }
            } else if avg_temp < 7.0 {
                "Take your gloves!"
            } else if avg_temp < 13.0 {
                "Bring your hat!"
            } else {
                "No special clothing needed today."
            }
        }
    }
}
