use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::future::try_join_all;

use crate::{
    error::Result,
    fetch::weatherapi::HistorySource,
    model::HistoricalPoint,
    region::Region,
    transform::{REPORTING_TZ, to_reporting_time},
};

/// Series tag carried by every trailing-window row.
const SERIES_TYPE: &str = "historical";

/// Builds the trailing per-day precipitation series for a region.
///
/// Tolerance policy: whole-batch fail. Any failed day lookup fails the
/// aggregation; partial series are never emitted. Lookups run
/// concurrently but the output is always oldest to newest.
#[derive(Debug, Clone, Copy)]
pub struct HistoricalAggregator {
    window_days: u32,
}

impl HistoricalAggregator {
    pub fn new(window_days: u32) -> Self {
        Self { window_days: window_days.max(1) }
    }

    /// The window's calendar days, oldest first, ending at `today`.
    pub fn window(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (0..self.window_days)
            .rev()
            .map(|back| today - Duration::days(i64::from(back)))
            .collect()
    }

    /// One point per day of the window ending today on the reporting-zone
    /// calendar.
    pub async fn collect(
        &self,
        source: &dyn HistorySource,
        region: Region,
        now: DateTime<Utc>,
    ) -> Result<Vec<HistoricalPoint>> {
        let today = now.with_timezone(&REPORTING_TZ).date_naive();
        let created_at = to_reporting_time(now);

        let lookups = self.window(today).into_iter().map(|date| async move {
            let precipitation = source.day_total_precipitation(region, date).await?;
            Ok(HistoricalPoint { date, precipitation, kind: SERIES_TYPE, created_at })
        });

        try_join_all(lookups).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use async_trait::async_trait;
    use chrono::{Datelike, TimeZone};

    /// Answers with the day-of-month so pairing is checkable; fails for
    /// any date named in `fail_on`.
    struct StubHistory {
        fail_on: Option<NaiveDate>,
    }

    #[async_trait]
    impl HistorySource for StubHistory {
        async fn day_total_precipitation(&self, _region: Region, date: NaiveDate) -> Result<f64> {
            if self.fail_on == Some(date) {
                return Err(PipelineError::UpstreamStatus {
                    service: "weather API",
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: "boom".to_string(),
                });
            }

            Ok(f64::from(date.day()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn window_runs_oldest_to_newest() {
        let aggregator = HistoricalAggregator::new(7);
        let days = aggregator.window(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());

        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
        assert_eq!(days[6], NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert!(days.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn collect_emits_the_window_in_order_with_paired_totals() {
        let aggregator = HistoricalAggregator::new(7);
        let source = StubHistory { fail_on: None };

        let points =
            aggregator.collect(&source, Region::Riga, now()).await.expect("aggregation");

        let dates: Vec<_> = points.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(
            dates,
            vec![
                "2024-05-04",
                "2024-05-05",
                "2024-05-06",
                "2024-05-07",
                "2024-05-08",
                "2024-05-09",
                "2024-05-10",
            ]
        );

        for point in &points {
            assert_eq!(point.precipitation, f64::from(point.date.day()));
            assert_eq!(point.kind, "historical");
        }
    }

    #[tokio::test]
    async fn one_failed_day_fails_the_whole_aggregation() {
        let aggregator = HistoricalAggregator::new(7);
        let source = StubHistory { fail_on: NaiveDate::from_ymd_opt(2024, 5, 7) };

        let err = aggregator.collect(&source, Region::Riga, now()).await.unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamStatus { .. }));
    }

    #[tokio::test]
    async fn today_is_taken_from_the_reporting_zone_calendar() {
        // 23:30 UTC is already the next day in Amsterdam (CEST).
        let late = Utc.with_ymd_and_hms(2024, 5, 10, 23, 30, 0).unwrap();
        let aggregator = HistoricalAggregator::new(1);
        let source = StubHistory { fail_on: None };

        let points = aggregator.collect(&source, Region::Eindhoven, late).await.expect("point");
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
    }
}
