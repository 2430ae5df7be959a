//! Transformations from raw upstream payloads to persisted records.
//!
//! Transformers are pure with respect to I/O where possible; the sensor
//! and historical transformers take their gateway as an explicit trait
//! object so tests can substitute stubs.

pub mod historical;
pub mod sensors;
pub mod weather;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

/// Derived records are timestamped in this zone for both regions.
pub const REPORTING_TZ: Tz = chrono_tz::Europe::Amsterdam;

/// Current wall-clock time in the reporting zone, carried as a fixed
/// offset so it binds as `timestamptz`.
pub(crate) fn to_reporting_time(now: DateTime<Utc>) -> DateTime<FixedOffset> {
    now.with_timezone(&REPORTING_TZ).fixed_offset()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reporting_time_tracks_daylight_saving() {
        let summer = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(to_reporting_time(summer).offset().local_minus_utc(), 2 * 3600);

        let winter = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        assert_eq!(to_reporting_time(winter).offset().local_minus_utc(), 3600);
    }
}
