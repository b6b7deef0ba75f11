//! OpenWeather One Call 3.0 client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{DailyForecast, ProviderError, WeatherProvider};
use crate::config::WeatherConfig;
use crate::route::GeoPoint;
use crate::units::Units;

/// Weather client for the One Call API
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    http: Client,
}

impl OpenWeatherClient {
    /// Create a client from configuration, reading the key from the configured env var
    pub fn from_config(config: &WeatherConfig) -> Result<Self, ProviderError> {
        debug!(base_url = %config.base_url, "OpenWeatherClient::from_config: called");
        let api_key = config.get_api_key().map_err(|e| ProviderError::Config(e.to_string()))?;
        Self::new(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn new(config: &WeatherConfig, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(ProviderError::Network)?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn daily_forecast(&self, point: GeoPoint, units: Units) -> Result<Vec<DailyForecast>, ProviderError> {
        debug!(%point, %units, "daily_forecast: called");
        let url = format!("{}/data/3.0/onecall", self.base_url);
        let lat = point.lat.to_string();
        let lon = point.lon.to_string();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", units.as_str()),
                ("exclude", "minutely,alerts"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "daily_forecast: HTTP error");
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: OneCallResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let days: Vec<DailyForecast> = body.daily.into_iter().map(DailyForecast::from).collect();
        debug!(days = days.len(), "daily_forecast: done");
        Ok(days)
    }
}

// One Call response types

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    #[serde(default)]
    daily: Vec<OneCallDay>,
}

#[derive(Debug, Deserialize)]
struct OneCallDay {
    #[serde(default)]
    temp: Option<OneCallTemp>,
    #[serde(default)]
    weather: Vec<OneCallCondition>,
}

#[derive(Debug, Deserialize)]
struct OneCallTemp {
    min: Option<f64>,
    max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OneCallCondition {
    main: Option<String>,
    description: Option<String>,
}

impl From<OneCallDay> for DailyForecast {
    fn from(day: OneCallDay) -> Self {
        let condition = day.weather.into_iter().next();
        let (condition, description) = match condition {
            Some(c) => (c.main, c.description),
            None => (None, None),
        };
        DailyForecast {
            condition,
            description,
            min: day.temp.as_ref().and_then(|t| t.min),
            max: day.temp.as_ref().and_then(|t| t.max),
        }
    }
}
