//! Radar reflectivity to rainfall intensity conversion.
//!
//! The point-radar endpoint serves newline-delimited `<code>|<timestamp>`
//! samples. A reflectivity code `v` converts to an intensity in mm/h via
//! `10^((v - 109) / 32)`; the estimate for a location is the peak intensity
//! across all valid samples.

use serde::{Serialize, Serializer};

/// Rainfall bucket derived from a peak intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrecipCategory {
    NoRain,
    LightRain,
    ModerateRain,
    HeavyRain,
    /// No estimate could be produced (the radar lookup failed).
    Unavailable,
}

impl PrecipCategory {
    pub fn label(&self) -> &'static str {
        match self {
            PrecipCategory::NoRain => "No rain",
            PrecipCategory::LightRain => "Light rain",
            PrecipCategory::ModerateRain => "Moderate rain",
            PrecipCategory::HeavyRain => "Heavy rain",
            PrecipCategory::Unavailable => "N/A",
        }
    }

    /// Bucket an intensity in mm/h. Boundaries are closed on the upper
    /// edge: exactly 2.5 is still light rain, exactly 7.5 still moderate.
    pub fn from_intensity(mm_per_hour: f64) -> Self {
        if mm_per_hour < 0.1 {
            PrecipCategory::NoRain
        } else if mm_per_hour <= 2.5 {
            PrecipCategory::LightRain
        } else if mm_per_hour <= 7.5 {
            PrecipCategory::ModerateRain
        } else {
            PrecipCategory::HeavyRain
        }
    }
}

impl std::fmt::Display for PrecipCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for PrecipCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Peak rainfall estimate for one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecipEstimate {
    pub intensity: f64,
    pub category: PrecipCategory,
}

impl PrecipEstimate {
    /// Placeholder for a failed radar lookup: zero intensity, "N/A".
    pub fn unavailable() -> Self {
        Self { intensity: 0.0, category: PrecipCategory::Unavailable }
    }
}

/// Convert a raw reflectivity code to an intensity in mm/h.
pub fn reflectivity_to_intensity(code: i32) -> f64 {
    10f64.powf(f64::from(code - 109) / 32.0)
}

/// Estimate peak rainfall from one radar snapshot.
///
/// Lines that do not split into exactly two `|`-separated fields, or whose
/// first field is not an integer, are skipped; a single bad sample never
/// fails the estimate. An all-invalid (or empty) snapshot yields zero
/// intensity, "No rain".
pub fn estimate_from_snapshot(snapshot: &str) -> PrecipEstimate {
    let mut peak = 0.0f64;

    for line in snapshot.lines() {
        let mut parts = line.split('|');
        let (Some(code), Some(_), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };

        let Ok(code) = code.trim().parse::<i32>() else {
            continue;
        };

        peak = peak.max(reflectivity_to_intensity(code));
    }

    PrecipEstimate { intensity: peak, category: PrecipCategory::from_intensity(peak) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_109_is_one_mm_per_hour() {
        let intensity = reflectivity_to_intensity(109);
        assert!((intensity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn intensity_is_monotonic_in_the_code() {
        let mut previous = reflectivity_to_intensity(0);
        for code in 1..=255 {
            let current = reflectivity_to_intensity(code);
            assert!(current > previous, "intensity must grow with the code (at {code})");
            previous = current;
        }
    }

    #[test]
    fn category_boundaries_are_closed_at_the_upper_edge() {
        assert_eq!(PrecipCategory::from_intensity(0.0), PrecipCategory::NoRain);
        assert_eq!(PrecipCategory::from_intensity(0.1), PrecipCategory::LightRain);
        assert_eq!(PrecipCategory::from_intensity(2.5), PrecipCategory::LightRain);
        assert_eq!(PrecipCategory::from_intensity(2.6), PrecipCategory::ModerateRain);
        assert_eq!(PrecipCategory::from_intensity(7.5), PrecipCategory::ModerateRain);
        assert_eq!(PrecipCategory::from_intensity(7.6), PrecipCategory::HeavyRain);
    }

    #[test]
    fn snapshot_takes_the_peak_sample() {
        let estimate = estimate_from_snapshot("000|10:00\n109|10:05\n077|10:10\n");
        assert!((estimate.intensity - 1.0).abs() < 1e-12);
        assert_eq!(estimate.category, PrecipCategory::LightRain);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let estimate = estimate_from_snapshot("garbage\nnot|a|triple\nxyz|10:00\n109|10:05\n");
        assert!((estimate.intensity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_malformed_input_yields_no_rain() {
        let estimate = estimate_from_snapshot("garbage\nxyz|10:00\n");
        assert_eq!(estimate.intensity, 0.0);
        assert_eq!(estimate.category, PrecipCategory::NoRain);
    }

    #[test]
    fn empty_snapshot_yields_no_rain() {
        let estimate = estimate_from_snapshot("");
        assert_eq!(estimate.intensity, 0.0);
        assert_eq!(estimate.category, PrecipCategory::NoRain);
    }

    #[test]
    fn unavailable_label_is_na() {
        assert_eq!(PrecipEstimate::unavailable().category.label(), "N/A");
        assert_eq!(PrecipEstimate::unavailable().intensity, 0.0);
    }
}
