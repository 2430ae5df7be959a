use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::WeatherApiConfig,
    error::{PipelineError, Result},
    fetch::truncate_body,
    region::Region,
};

const SERVICE: &str = "weather API";

/// Source of per-day historical rainfall totals.
///
/// Seam for the historical aggregator; the production implementation is
/// [`WeatherApiClient`].
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Total rainfall recorded for one calendar day, in mm.
    async fn day_total_precipitation(&self, region: Region, date: NaiveDate) -> Result<f64>;
}

/// Client for the forecast/history provider.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiClient {
    /// Days requested from the forecast endpoint: day 0 feeds the
    /// current-day batches, day 1 feeds the tomorrow batch.
    pub const FORECAST_DAYS: u8 = 2;

    pub fn new(config: &WeatherApiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http: Client::new(),
        }
    }

    /// Fetch the multi-day forecast for a region.
    pub async fn forecast(&self, region: Region) -> Result<ForecastResponse> {
        let url = format!("{}/forecast.json", self.base_url);
        let days = Self::FORECAST_DAYS.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", region.location_query()),
                ("days", days.as_str()),
            ])
            .send()
            .await
            .map_err(|source| PipelineError::Transport { service: SERVICE, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| PipelineError::Transport { service: SERVICE, source })?;

        if !status.is_success() {
            return Err(PipelineError::UpstreamStatus {
                service: SERVICE,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|source| PipelineError::MalformedPayload { service: SERVICE, source })
    }
}

#[async_trait]
impl HistorySource for WeatherApiClient {
    async fn day_total_precipitation(&self, region: Region, date: NaiveDate) -> Result<f64> {
        let url = format!("{}/history.json", self.base_url);
        let dt = date.format("%Y-%m-%d").to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", region.location_query()),
                ("dt", dt.as_str()),
            ])
            .send()
            .await
            .map_err(|source| PipelineError::Transport { service: SERVICE, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| PipelineError::Transport { service: SERVICE, source })?;

        if !status.is_success() {
            return Err(PipelineError::UpstreamStatus {
                service: SERVICE,
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: HistoryResponse = serde_json::from_str(&body)
            .map_err(|source| PipelineError::MalformedPayload { service: SERVICE, source })?;

        let day = parsed.forecast.forecastday.first().ok_or(PipelineError::IncompletePayload {
            service: SERVICE,
            what: "history day data",
        })?;

        Ok(day.day.totalprecip_mm)
    }
}

/// Raw forecast payload, mirroring the upstream JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub location: LocationInfo,
    pub forecast: ForecastBlock,
    #[serde(default)]
    pub alerts: Alerts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInfo {
    pub name: String,
    /// Local wall-clock time at the location, `"YYYY-MM-DD H:MM"`.
    pub localtime: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastBlock {
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub day: DayAggregates,
    pub hour: Vec<HourSample>,
}

/// Upstream daily aggregates. The summary recomputes its means from the
/// hourly series; only the rainfall total is persisted as-is (attached to
/// forecast entries).
#[derive(Debug, Clone, Deserialize)]
pub struct DayAggregates {
    pub avgtemp_c: f64,
    pub totalprecip_mm: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourSample {
    #[serde(with = "hour_time")]
    pub time: NaiveDateTime,
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: i32,
    pub precip_mm: f64,
    pub wind_kph: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Alerts {
    #[serde(default)]
    pub alert: Vec<AlertEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertEntry {
    pub headline: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    forecast: HistoryBlock,
}

#[derive(Debug, Deserialize)]
struct HistoryBlock {
    forecastday: Vec<HistoryDay>,
}

#[derive(Debug, Deserialize)]
struct HistoryDay {
    day: DayAggregates,
}

/// Hour timestamps come as `"2024-05-10 13:00"`, not RFC 3339.
mod hour_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M";

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
