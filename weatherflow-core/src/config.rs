use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::transform::weather::AdvisoryStyle;

/// Credentials and endpoint for the forecast/history provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    /// API key; overridable via `WEATHERFLOW_API_KEY`.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self { api_key: String::new(), base_url: default_weather_base_url() }
    }
}

/// Endpoint for the tunnel-sensor catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorApiConfig {
    #[serde(default = "default_sensor_base_url")]
    pub base_url: String,

    /// Number of catalog records to request per run.
    #[serde(default = "default_sensor_limit")]
    pub limit: u32,
}

impl Default for SensorApiConfig {
    fn default() -> Self {
        Self { base_url: default_sensor_base_url(), limit: default_sensor_limit() }
    }
}

/// Endpoint for the point-radar service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarConfig {
    #[serde(default = "default_radar_base_url")]
    pub base_url: String,

    /// Upper bound on concurrent radar lookups per sensor batch.
    #[serde(default = "default_radar_concurrency")]
    pub concurrency: usize,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self { base_url: default_radar_base_url(), concurrency: default_radar_concurrency() }
    }
}

/// Postgres connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL; overridable via `DATABASE_URL`.
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: String::new(), max_connections: default_max_connections() }
    }
}

/// Top-level configuration stored on disk.
///
/// Every component receives its slice of this at construction; there is no
/// process-wide client or credential state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub weather_api: WeatherApiConfig,

    #[serde(default)]
    pub sensor_api: SensorApiConfig,

    #[serde(default)]
    pub radar: RadarConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Length of the trailing historical-precipitation window, in days.
    #[serde(default = "default_window_days")]
    pub historical_window_days: u32,

    /// Which clothing-advisory rule set the weather summary applies.
    #[serde(default)]
    pub advisory_style: AdvisoryStyle,
}

impl Config {
    /// Load config from the given path, or from the platform config
    /// directory when absent. A missing file yields the defaults, so a
    /// fully env-var-driven deployment needs no file at all.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path)?;

        let mut cfg = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    /// Returns the path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = Self::resolve_path(path)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Default path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherflow", "weatherflow")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Fail unless the secrets a run needs are present.
    pub fn validate(&self) -> Result<()> {
        if self.weather_api.api_key.is_empty() {
            return Err(anyhow!(
                "No weather API key configured.\n\
                 Hint: run `weatherflow configure` or set WEATHERFLOW_API_KEY."
            ));
        }

        if self.database.url.is_empty() {
            return Err(anyhow!(
                "No database URL configured.\n\
                 Hint: run `weatherflow configure` or set DATABASE_URL."
            ));
        }

        Ok(())
    }

    fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(p.to_path_buf()),
            None => Self::config_file_path(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("WEATHERFLOW_API_KEY")
            && !key.is_empty()
        {
            self.weather_api.api_key = key;
        }

        if let Ok(url) = std::env::var("DATABASE_URL")
            && !url.is_empty()
        {
            self.database.url = url;
        }
    }
}

fn default_weather_base_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}

fn default_sensor_base_url() -> String {
    "https://data.eindhoven.nl/api/explore/v2.1/catalog/datasets/tunnelvisie-punten".to_string()
}

fn default_sensor_limit() -> u32 {
    71
}

fn default_radar_base_url() -> String {
    "https://gps.buienradar.nl/getrr.php".to_string()
}

fn default_radar_concurrency() -> usize {
    8
}

fn default_max_connections() -> u32 {
    5
}

fn default_window_days() -> u32 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: Config = toml::from_str("").expect("empty config must parse");

        assert!(cfg.weather_api.api_key.is_empty());
        assert_eq!(cfg.weather_api.base_url, "http://api.weatherapi.com/v1");
        assert_eq!(cfg.sensor_api.limit, 71);
        assert_eq!(cfg.radar.concurrency, 8);
        assert_eq!(cfg.historical_window_days, 7);
        assert_eq!(cfg.advisory_style, AdvisoryStyle::RainOnly);
    }

    #[test]
    fn full_toml_parses() {
        let cfg: Config = toml::from_str(
            r#"
            historical_window_days = 14
            advisory_style = "temperature_aware"

            [weather_api]
            api_key = "KEY"

            [database]
            url = "postgres://localhost/weatherflow"
            max_connections = 2

            [radar]
            concurrency = 3
            "#,
        )
        .expect("config must parse");

        assert_eq!(cfg.weather_api.api_key, "KEY");
        assert_eq!(cfg.historical_window_days, 14);
        assert_eq!(cfg.advisory_style, AdvisoryStyle::TemperatureAware);
        assert_eq!(cfg.database.max_connections, 2);
        assert_eq!(cfg.radar.concurrency, 3);
        // untouched sections keep their defaults
        assert_eq!(cfg.sensor_api.limit, 71);
    }

    #[test]
    fn validate_requires_api_key_and_database_url() {
        let mut cfg = Config::default();

        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("No weather API key configured"));

        cfg.weather_api.api_key = "KEY".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("No database URL configured"));

        cfg.database.url = "postgres://localhost/weatherflow".into();
        assert!(cfg.validate().is_ok());
    }
}
