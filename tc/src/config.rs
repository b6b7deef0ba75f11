//! Tripcast configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::units::Units;

/// Valid range for `route.max-stops`
pub const MAX_STOPS_RANGE: std::ops::RangeInclusive<usize> = 1..=20;

/// Upper bound for `route.sample-interval-km`
pub const MAX_SAMPLE_INTERVAL_KM: f64 = 500.0;

/// Main Tripcast configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Directions and geocoding provider configuration
    pub maps: MapsConfig,

    /// Weather provider configuration
    pub weather: WeatherConfig,

    /// Waypoint sampling configuration
    pub route: RouteConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks value ranges only. API keys are checked when a provider client is built,
    /// so mock mode does not need a weather key.
    pub fn validate(&self) -> Result<()> {
        if !MAX_STOPS_RANGE.contains(&self.route.max_stops) {
            return Err(eyre::eyre!(
                "route.max-stops must be between {} and {} (got {})",
                MAX_STOPS_RANGE.start(),
                MAX_STOPS_RANGE.end(),
                self.route.max_stops
            ));
        }

        let interval = self.route.sample_interval_km;
        if !interval.is_finite() || interval <= 0.0 || interval > MAX_SAMPLE_INTERVAL_KM {
            return Err(eyre::eyre!(
                "route.sample-interval-km must be in (0, {}] (got {})",
                MAX_SAMPLE_INTERVAL_KM,
                interval
            ));
        }

        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed here; `load` reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::search_paths(),
        };

        paths
            .iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(p).ok())
            .and_then(|c| c.log_level)
    }

    /// Project-local `.tripcast.yml`, then `~/.config/tripcast/tripcast.yml`
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".tripcast.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("tripcast").join("tripcast.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Read an API key from the named environment variable
fn read_api_key(env_var: &str) -> Result<String> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(eyre::eyre!("API key not found. Set the {} environment variable.", env_var)),
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "openai" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Sampling temperature for origin/destination extraction
    #[serde(rename = "intent-temperature")]
    pub intent_temperature: f32,

    /// Sampling temperature for the final reply
    #[serde(rename = "reply-temperature")]
    pub reply_temperature: f32,

    /// Rewrite the itinerary into a conversational reply
    #[serde(rename = "compose-reply")]
    pub compose_reply: bool,
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        read_api_key(&self.api_key_env)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 1024,
            timeout_ms: 60_000,
            intent_temperature: 0.2,
            reply_temperature: 0.3,
            compose_reply: true,
        }
    }
}

/// Directions and geocoding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Travel mode passed to the directions API
    pub mode: String,
}

impl MapsConfig {
    /// Resolve the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        read_api_key(&self.api_key_env)
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GOOGLE_MAPS_API_KEY".to_string(),
            base_url: "https://maps.googleapis.com".to_string(),
            timeout_ms: 20_000,
            mode: "driving".to_string(),
        }
    }
}

/// Weather provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Unit system for temperatures
    pub units: Units,

    /// Per-waypoint request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Maximum in-flight forecast requests (0 = unbounded)
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Generate simulated forecasts instead of calling the provider
    pub mock: bool,

    /// Seed for simulated forecasts; unset means non-deterministic
    #[serde(rename = "mock-seed")]
    pub mock_seed: Option<u64>,
}

impl WeatherConfig {
    /// Resolve the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        read_api_key(&self.api_key_env)
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENWEATHER_API_KEY".to_string(),
            base_url: "https://api.openweathermap.org".to_string(),
            units: Units::default(),
            timeout_ms: 20_000,
            max_concurrent: 0,
            mock: false,
            mock_seed: None,
        }
    }
}

/// Waypoint sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Maximum number of waypoints in an itinerary
    #[serde(rename = "max-stops")]
    pub max_stops: usize,

    /// Target spacing between sample points along the route
    #[serde(rename = "sample-interval-km")]
    pub sample_interval_km: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            max_stops: 8,
            sample_interval_km: 50.0,
        }
    }
}
