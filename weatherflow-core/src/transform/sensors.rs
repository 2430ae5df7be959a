use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use tracing::warn;

use crate::{
    fetch::{
        radar::PrecipSource,
        sensors::{RawSensorRecord, YearField},
    },
    model::TunnelRecord,
    precipitation::{self, PrecipEstimate},
    transform::to_reporting_time,
};

/// Enriches raw tunnel-sensor records with precipitation estimates.
///
/// Tolerance policy: per-item degrade. A failed radar lookup produces a
/// zero-intensity "N/A" record for that sensor; the batch itself never
/// fails. Lookups run with bounded concurrency and the output preserves
/// catalog order regardless of completion order.
#[derive(Debug, Clone, Copy)]
pub struct SensorTransformer {
    concurrency: usize,
}

impl SensorTransformer {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency: concurrency.max(1) }
    }

    pub async fn process(
        &self,
        source: &dyn PrecipSource,
        records: Vec<RawSensorRecord>,
        now: DateTime<Utc>,
    ) -> Vec<TunnelRecord> {
        let created_at = to_reporting_time(now);

        stream::iter(records)
            .map(|record| async move {
                let estimate = match source.radar_snapshot(record.lat, record.lon).await {
                    Ok(snapshot) => precipitation::estimate_from_snapshot(&snapshot),
                    Err(error) => {
                        warn!(sensor = %record.name, %error, "radar lookup failed, degrading record");
                        PrecipEstimate::unavailable()
                    }
                };

                let year = clean_year(record.year.as_ref());

                TunnelRecord {
                    location_name: record.name,
                    year,
                    latitude: record.lat,
                    longitude: record.lon,
                    precipitation_description: estimate.category,
                    precipitation_intensity: estimate.intensity,
                    created_at,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

/// Clean the free-text install year. A `"YYYY/YYYY"` range collapses to
/// its first year; anything unparseable becomes `None` rather than an
/// error.
pub fn clean_year(raw: Option<&YearField>) -> Option<i32> {
    match raw? {
        YearField::Number(n) => i32::try_from(*n).ok(),
        YearField::Text(s) => {
            let first = s.split('/').next().unwrap_or_default();
            first.trim().parse().ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, Result};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn year_range_collapses_to_its_first_year() {
        let raw = YearField::Text("2017/2022".to_string());
        assert_eq!(clean_year(Some(&raw)), Some(2017));
    }

    #[test]
    fn plain_text_year_parses() {
        let raw = YearField::Text("2019".to_string());
        assert_eq!(clean_year(Some(&raw)), Some(2019));
    }

    #[test]
    fn numeric_year_passes_through() {
        let raw = YearField::Number(2021);
        assert_eq!(clean_year(Some(&raw)), Some(2021));
    }

    #[test]
    fn absent_year_is_none() {
        assert_eq!(clean_year(None), None);
    }

    #[test]
    fn unparseable_year_is_none() {
        let raw = YearField::Text("abc".to_string());
        assert_eq!(clean_year(Some(&raw)), None);
    }

    /// Radar stub keyed on latitude: 2.0 fails, 1.0 answers slowly so a
    /// later lookup completes first.
    struct StubRadar;

    #[async_trait]
    impl PrecipSource for StubRadar {
        async fn radar_snapshot(&self, lat: f64, _lon: f64) -> Result<String> {
            if lat == 2.0 {
                return Err(PipelineError::UpstreamStatus {
                    service: "point radar",
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    body: "boom".to_string(),
                });
            }

            if lat == 1.0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }

            Ok("109|10:00\n".to_string())
        }
    }

    fn record(lat: f64, name: &str) -> RawSensorRecord {
        RawSensorRecord {
            lat,
            lon: 5.47,
            name: name.to_string(),
            year: Some(YearField::Number(2020)),
        }
    }

    #[tokio::test]
    async fn failed_lookup_degrades_only_its_own_record() {
        let transformer = SensorTransformer::new(3);
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();

        let rows = transformer
            .process(
                &StubRadar,
                vec![record(1.0, "first"), record(2.0, "second"), record(3.0, "third")],
                now,
            )
            .await;

        assert_eq!(rows.len(), 3);

        // order follows the catalog, not completion
        assert_eq!(rows[0].location_name, "first");
        assert_eq!(rows[1].location_name, "second");
        assert_eq!(rows[2].location_name, "third");

        assert_eq!(rows[1].precipitation_intensity, 0.0);
        assert_eq!(rows[1].precipitation_description.label(), "N/A");

        assert!((rows[0].precipitation_intensity - 1.0).abs() < 1e-12);
        assert_eq!(rows[0].precipitation_description.label(), "Light rain");
        assert_eq!(rows[2].year, Some(2020));
    }
}
