use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::SensorApiConfig,
    error::{PipelineError, Result},
    fetch::truncate_body,
};

const SERVICE: &str = "sensor catalog";

/// Client for the tunnel-sensor catalog.
#[derive(Debug, Clone)]
pub struct SensorCatalogClient {
    base_url: String,
    limit: u32,
    http: Client,
}

impl SensorCatalogClient {
    pub fn new(config: &SensorApiConfig) -> Self {
        Self { base_url: config.base_url.clone(), limit: config.limit, http: Client::new() }
    }

    /// Fetch the sensor catalog. A payload without a `results` array is
    /// treated as an empty catalog, not an error.
    pub async fn records(&self) -> Result<Vec<RawSensorRecord>> {
        let url = format!("{}/records", self.base_url);
        let limit = self.limit.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[("limit", limit.as_str())])
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

        let parsed: CatalogResponse = serde_json::from_str(&body)
            .map_err(|source| PipelineError::MalformedPayload { service: SERVICE, source })?;

        Ok(parsed.results)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    results: Vec<RawSensorRecord>,
}

/// One catalog row as served upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSensorRecord {
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "locatienaam")]
    pub name: String,
    /// Install year: a number, a string, a `"YYYY/YYYY"` range, or absent.
    #[serde(default, rename = "jaar")]
    pub year: Option<YearField>,
}

/// The install-year field has no stable type upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearField {
    Number(i64),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_with_mixed_year_types_deserializes() {
        let json = r#"{
            "results": [
                {"lat": 51.44, "lon": 5.47, "locatienaam": "Tunnel A", "jaar": 2021},
                {"lat": 51.45, "lon": 5.48, "locatienaam": "Tunnel B", "jaar": "2017/2022"},
                {"lat": 51.46, "lon": 5.49, "locatienaam": "Tunnel C", "jaar": null},
                {"lat": 51.47, "lon": 5.50, "locatienaam": "Tunnel D"}
            ]
        }"#;

        let parsed: CatalogResponse = serde_json::from_str(json).expect("must parse");
        assert_eq!(parsed.results.len(), 4);

        assert!(matches!(parsed.results[0].year, Some(YearField::Number(2021))));
        assert!(matches!(parsed.results[1].year, Some(YearField::Text(ref s)) if s == "2017/2022"));
        assert!(parsed.results[2].year.is_none());
        assert!(parsed.results[3].year.is_none());
        assert_eq!(parsed.results[1].name, "Tunnel B");
    }

    #[test]
    fn missing_results_array_is_an_empty_catalog() {
        let parsed: CatalogResponse = serde_json::from_str("{}").expect("must parse");
        assert!(parsed.results.is_empty());
    }
}
