use crate::prediction::noise::DEFAULT_NOISE_STD_DEV;
use crate::sources::SourceSettings;
use crate::sources::openweather::DEFAULT_WEATHER_BASE_URL;
use crate::sources::places::DEFAULT_PLACES_BASE_URL;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use time::UtcOffset;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_CAMPUS_LATITUDE: f64 = 42.729869;
pub const DEFAULT_CAMPUS_LONGITUDE: f64 = -73.676871;
pub const DEFAULT_SEARCH_RADIUS_M: u32 = 1000;
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const DEFAULT_WEATHER_API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const MAX_UTC_OFFSET_HOURS: i8 = 23;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub model: Option<ModelSection>,
    #[serde(default)]
    pub campus: Option<CampusSection>,
    #[serde(default)]
    pub sources: Option<SourcesSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
    /// Seconds between campus snapshot refreshes (default: 300)
    pub refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelSection {
    /// JSON file replacing the built-in model tables
    pub tables_path: Option<String>,
    /// Standard deviation of the occupancy jitter (default: 0.02)
    pub noise_std_dev: Option<f64>,
    pub seed: Option<u64>,
    /// Offset of campus wall-clock time from UTC (default: 0)
    pub utc_offset_hours: Option<i8>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CampusSection {
    pub latitude: f64,
    pub longitude: f64,
    pub search_radius_m: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourcesSection {
    #[serde(default)]
    pub use_mock: bool,
    pub google_api_key_env: Option<String>,
    pub weather_api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
    pub places_base_url: Option<String>,
    pub weather_base_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        let std_dev = self.noise_std_dev();
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "model.noise_std_dev must be finite and non-negative, got {std_dev}"
            )));
        }
        if self.refresh_interval().is_zero() {
            return Err(ConfigError::Invalid(
                "server.refresh_interval_secs must be positive".to_string(),
            ));
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn tables_path(&self) -> Option<&Path> {
        let path = self.model.as_ref()?.tables_path.as_deref()?;
        if path.is_empty() {
            None
        } else {
            Some(Path::new(path))
        }
    }

    pub fn noise_std_dev(&self) -> f64 {
        self.model
            .as_ref()
            .and_then(|m| m.noise_std_dev)
            .unwrap_or(DEFAULT_NOISE_STD_DEV)
    }

    pub fn noise_seed(&self) -> Option<u64> {
        self.model.as_ref().and_then(|m| m.seed)
    }

    /// Campus wall-clock offset from UTC.
    pub fn utc_offset(&self) -> Result<UtcOffset, ConfigError> {
        let hours = self
            .model
            .as_ref()
            .and_then(|m| m.utc_offset_hours)
            .unwrap_or(0);
        if !(-MAX_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&hours) {
            return Err(ConfigError::Invalid(format!(
                "model.utc_offset_hours must be within -23..=23, got {hours}"
            )));
        }
        UtcOffset::from_hms(hours, 0, 0).map_err(|err| {
            ConfigError::Invalid(format!("model.utc_offset_hours {hours}: {err}"))
        })
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Returns the snapshot refresh interval (default: 5 minutes)
    pub fn refresh_interval(&self) -> Duration {
        let secs = self
            .server
            .as_ref()
            .and_then(|s| s.refresh_interval_secs)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    /// Campus center as (latitude, longitude).
    pub fn campus_center(&self) -> (f64, f64) {
        self.campus
            .as_ref()
            .map(|c| (c.latitude, c.longitude))
            .unwrap_or((DEFAULT_CAMPUS_LATITUDE, DEFAULT_CAMPUS_LONGITUDE))
    }

    pub fn search_radius_m(&self) -> u32 {
        self.campus
            .as_ref()
            .and_then(|c| c.search_radius_m)
            .unwrap_or(DEFAULT_SEARCH_RADIUS_M)
    }

    /// Source settings with API keys read through `lookup_env`.
    pub fn source_settings_with<F>(&self, lookup_env: F) -> SourceSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = self.sources.as_ref();
        let key = |configured: Option<&String>, default: &str| {
            let name = configured.map(String::as_str).unwrap_or(default);
            lookup_env(name).filter(|value| !value.trim().is_empty())
        };

        SourceSettings {
            use_mock: section.is_some_and(|s| s.use_mock),
            google_api_key: key(
                section.and_then(|s| s.google_api_key_env.as_ref()),
                DEFAULT_GOOGLE_API_KEY_ENV,
            ),
            weather_api_key: key(
                section.and_then(|s| s.weather_api_key_env.as_ref()),
                DEFAULT_WEATHER_API_KEY_ENV,
            ),
            places_base_url: section
                .and_then(|s| s.places_base_url.clone())
                .unwrap_or_else(|| DEFAULT_PLACES_BASE_URL.to_string()),
            weather_base_url: section
                .and_then(|s| s.weather_base_url.clone())
                .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string()),
            timeout: Duration::from_secs(
                section
                    .and_then(|s| s.timeout_secs)
                    .unwrap_or(DEFAULT_SOURCE_TIMEOUT_SECS),
            ),
        }
    }

    pub fn source_settings(&self) -> SourceSettings {
        self.source_settings_with(|name| std::env::var(name).ok())
    }
}
