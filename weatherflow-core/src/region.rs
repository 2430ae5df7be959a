use std::convert::TryFrom;

use crate::error::PipelineError;

/// One of the fixed geographic locations a pipeline instance targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Eindhoven,
    Riga,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Eindhoven => "eindhoven",
            Region::Riga => "riga",
        }
    }

    /// Location string used in upstream forecast and history queries.
    pub fn location_query(&self) -> &'static str {
        match self {
            Region::Eindhoven => "Eindhoven",
            Region::Riga => "Riga",
        }
    }

    fn table_suffix(&self) -> &'static str {
        match self {
            Region::Eindhoven => "",
            Region::Riga => "_baltic",
        }
    }

    /// Resolve the persisted table name for this region.
    ///
    /// The sole place region-specific table names are produced.
    pub fn table_name(&self, table: Table) -> String {
        format!("{}{}", table.base_name(), self.table_suffix())
    }

    pub const fn all() -> &'static [Region] {
        &[Region::Eindhoven, Region::Riga]
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Region {
    type Error = PipelineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "eindhoven" => Ok(Region::Eindhoven),
            "riga" => Ok(Region::Riga),
            _ => Err(PipelineError::Config(format!(
                "Unknown region '{value}'. Supported regions: eindhoven, riga."
            ))),
        }
    }
}

/// The persisted table kinds, one per record batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    WeatherSummaries,
    TodayTrends,
    ForecastEntries,
    TomorrowEntries,
    TunnelRecords,
    PrecipitationTrends,
}

impl Table {
    pub fn base_name(&self) -> &'static str {
        match self {
            Table::WeatherSummaries => "weather_data",
            Table::TodayTrends => "today_weather_trends",
            Table::ForecastEntries => "forecast_weather",
            Table::TomorrowEntries => "tomorrow_weather",
            Table::TunnelRecords => "tunnel_data",
            Table::PrecipitationTrends => "precipitation_trends",
        }
    }

    pub const fn all() -> &'static [Table] {
        &[
            Table::WeatherSummaries,
            Table::TodayTrends,
            Table::ForecastEntries,
            Table::TomorrowEntries,
            Table::TunnelRecords,
            Table::PrecipitationTrends,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_as_str_roundtrip() {
        for region in Region::all() {
            let s = region.as_str();
            let parsed = Region::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*region, parsed);
        }
    }

    #[test]
    fn region_parse_is_case_insensitive() {
        assert_eq!(Region::try_from("Eindhoven").unwrap(), Region::Eindhoven);
        assert_eq!(Region::try_from("RIGA").unwrap(), Region::Riga);
    }

    #[test]
    fn unknown_region_error() {
        let err = Region::try_from("rotterdam").unwrap_err();
        assert!(err.to_string().contains("Unknown region"));
    }

    #[test]
    fn eindhoven_tables_are_unsuffixed() {
        assert_eq!(Region::Eindhoven.table_name(Table::WeatherSummaries), "weather_data");
        assert_eq!(Region::Eindhoven.table_name(Table::TunnelRecords), "tunnel_data");
    }

    #[test]
    fn riga_tables_carry_the_baltic_suffix() {
        assert_eq!(Region::Riga.table_name(Table::WeatherSummaries), "weather_data_baltic");
        assert_eq!(
            Region::Riga.table_name(Table::PrecipitationTrends),
            "precipitation_trends_baltic"
        );
    }
}
