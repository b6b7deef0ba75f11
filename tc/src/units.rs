//! Unit systems for weather data

use serde::{Deserialize, Serialize};

/// Unit system used when requesting and rendering temperatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Celsius
    Metric,
    /// Fahrenheit
    #[default]
    Imperial,
    /// Kelvin
    Standard,
}

impl Units {
    /// Name used on the wire by OpenWeather
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Imperial => "imperial",
            Self::Standard => "standard",
        }
    }

    /// Convert a Celsius reading into this unit system
    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            Self::Metric => celsius,
            Self::Imperial => celsius * 9.0 / 5.0 + 32.0,
            Self::Standard => celsius + 273.15,
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" => Ok(Self::Metric),
            "imperial" => Ok(Self::Imperial),
            "standard" => Ok(Self::Standard),
            _ => Err(format!("Unknown units: {}. Use: metric, imperial, or standard", s)),
        }
    }
}
