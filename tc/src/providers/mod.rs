//! External providers consumed by the trip workflow
//!
//! Each remote capability sits behind a trait so the workflow can run against
//! the real services, the simulated weather generator, or test fakes.

mod error;
pub mod google;
pub mod mock_weather;
pub mod openweather;

pub use error::ProviderError;
pub use google::GoogleMapsClient;
pub use mock_weather::MockWeatherProvider;
pub use openweather::OpenWeatherClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::route::GeoPoint;
use crate::units::Units;

/// Route payload returned by the directions provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Short route description (e.g. "I-65 S")
    pub summary: String,

    /// Encoded overview polyline; `None` when the provider sent no geometry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyline: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_address: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// One component of a geocoded address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// A reverse-geocoding result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressResult {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

impl AddressResult {
    /// First component tagged with `kind` (e.g. "locality")
    pub fn component(&self, kind: &str) -> Option<&AddressComponent> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
    }
}

/// A single day of forecast data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Condition group (e.g. "Rain")
    pub condition: Option<String>,
    /// Longer condition text (e.g. "light rain")
    pub description: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Driving directions between two named places
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// First route between `origin` and `destination`, `None` when no route exists
    async fn directions(&self, origin: &str, destination: &str) -> Result<Option<RouteRecord>, ProviderError>;
}

/// Reverse geocoding restricted to county/locality-level results
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Address results for a point, best match first; empty when nothing matched
    async fn reverse_geocode(&self, point: GeoPoint) -> Result<Vec<AddressResult>, ProviderError>;
}

/// Daily forecasts for a point
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn daily_forecast(&self, point: GeoPoint, units: Units) -> Result<Vec<DailyForecast>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(long: &str, short: &str, types: &[&str]) -> AddressComponent {
        AddressComponent {
            long_name: long.to_string(),
            short_name: short.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_address_component_lookup() {
        let result = AddressResult {
            formatted_address: None,
            address_components: vec![
                component("Davidson County", "Davidson County", &["administrative_area_level_2", "political"]),
                component("Tennessee", "TN", &["administrative_area_level_1", "political"]),
            ],
        };

        assert_eq!(result.component("administrative_area_level_1").unwrap().short_name, "TN");
        assert!(result.component("locality").is_none());
    }

    #[test]
    fn test_route_record_serialization_skips_empty() {
        let route = RouteRecord {
            summary: "I-65 S".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["summary"], "I-65 S");
        assert!(json.get("polyline").is_none());
        assert!(json.get("warnings").is_none());
    }
}
