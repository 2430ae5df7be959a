use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::RadarConfig,
    error::{PipelineError, Result},
    fetch::truncate_body,
};

const SERVICE: &str = "point radar";

/// Source of raw radar snapshots for a coordinate.
///
/// Seam for the sensor transformer; the production implementation is
/// [`RadarClient`].
#[async_trait]
pub trait PrecipSource: Send + Sync {
    /// Newline-delimited `<code>|<timestamp>` samples for one point.
    async fn radar_snapshot(&self, lat: f64, lon: f64) -> Result<String>;
}

/// Client for the point-radar service.
#[derive(Debug, Clone)]
pub struct RadarClient {
    base_url: String,
    http: Client,
}

impl RadarClient {
    pub fn new(config: &RadarConfig) -> Self {
        Self { base_url: config.base_url.clone(), http: Client::new() }
    }
}

#[async_trait]
impl PrecipSource for RadarClient {
    async fn radar_snapshot(&self, lat: f64, lon: f64) -> Result<String> {
        let lat = lat.to_string();
        let lon = lon.to_string();

        let res = self
            .http
            .get(&self.base_url)
            .query(&[("lat", lat.as_str()), ("lon", lon.as_str())])
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

        Ok(body)
    }
}
