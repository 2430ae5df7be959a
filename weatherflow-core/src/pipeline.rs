//! Per-region pipeline runs: fetch, transform, persist.
//!
//! Each `run_*` method is one independent run over one data kind. Runs
//! share no mutable state, so different kinds (and different regions) can
//! be executed sequentially or concurrently by whatever invokes them.

use chrono::Utc;
use tracing::{error, info};

use crate::{
    config::Config,
    error::{PipelineError, Result},
    fetch::{radar::RadarClient, sensors::SensorCatalogClient, weatherapi::WeatherApiClient},
    region::Region,
    store::Store,
    transform::{
        historical::HistoricalAggregator, sensors::SensorTransformer, weather::WeatherTransformer,
    },
};

/// Owns the gateways and transformers for one process lifetime.
///
/// All collaborators are built from explicit configuration at
/// construction; nothing reads process-wide state afterwards.
pub struct Pipeline {
    weather_api: WeatherApiClient,
    sensor_catalog: SensorCatalogClient,
    radar: RadarClient,
    store: Store,
    weather: WeatherTransformer,
    sensors: SensorTransformer,
    historical: HistoricalAggregator,
}

impl Pipeline {
    pub async fn new(config: &Config) -> Result<Self> {
        let store = Store::connect(&config.database).await?;

        Ok(Self {
            weather_api: WeatherApiClient::new(&config.weather_api),
            sensor_catalog: SensorCatalogClient::new(&config.sensor_api),
            radar: RadarClient::new(&config.radar),
            store,
            weather: WeatherTransformer::new(config.advisory_style),
            sensors: SensorTransformer::new(config.radar.concurrency),
            historical: HistoricalAggregator::new(config.historical_window_days),
        })
    }

    /// Fetch the forecast once and persist the four weather batches
    /// derived from it.
    pub async fn run_weather(&self, region: Region) -> Result<()> {
        info!(region = %region, "starting weather run");

        let payload = self.weather_api.forecast(region).await?;
        let now = Utc::now();

        let summary = self.weather.summarize(&payload, now)?;
        let trends = self.weather.today_trends(&payload, now)?;
        let forecast = self.weather.forecast_entries(&payload, now);
        let tomorrow = self.weather.tomorrow(&payload, now)?;

        self.store.insert_weather_summary(region, &summary).await?;
        self.store.insert_today_trends(region, &trends).await?;
        self.store.insert_forecast_entries(region, &forecast).await?;
        self.store.insert_tomorrow_entries(region, &tomorrow).await?;

        info!(
            region = %region,
            trends = trends.len(),
            forecast = forecast.len(),
            tomorrow = tomorrow.len(),
            "weather run complete"
        );
        Ok(())
    }

    /// Fetch the sensor catalog, enrich every record with a precipitation
    /// estimate and persist the batch.
    pub async fn run_tunnel(&self, region: Region) -> Result<()> {
        info!(region = %region, "starting tunnel run");

        let records = self.sensor_catalog.records().await?;

        if records.is_empty() {
            info!(region = %region, "sensor catalog empty, nothing to persist");
            return Ok(());
        }

        let rows = self.sensors.process(&self.radar, records, Utc::now()).await;
        self.store.insert_tunnel_records(region, &rows).await?;

        info!(region = %region, rows = rows.len(), "tunnel run complete");
        Ok(())
    }

    /// Build and persist the trailing precipitation series.
    pub async fn run_historical(&self, region: Region) -> Result<()> {
        info!(region = %region, "starting historical run");

        let points = self.historical.collect(&self.weather_api, region, Utc::now()).await?;
        self.store.insert_historical_points(region, &points).await?;

        info!(region = %region, points = points.len(), "historical run complete");
        Ok(())
    }

    /// Run every data kind for a region.
    ///
    /// The kinds are independent, so each is attempted even when an
    /// earlier one fails; failures are reported together at the end.
    pub async fn run_all(&self, region: Region) -> Result<()> {
        let mut failed = Vec::new();

        if let Err(error) = self.run_weather(region).await {
            error!(region = %region, %error, "weather stage failed");
            failed.push("weather");
        }

        if let Err(error) = self.run_tunnel(region).await {
            error!(region = %region, %error, "tunnel stage failed");
            failed.push("tunnel");
        }

        if let Err(error) = self.run_historical(region).await {
            error!(region = %region, %error, "historical stage failed");
            failed.push("historical");
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::StagesFailed(failed.join(", ")))
        }
    }
}
