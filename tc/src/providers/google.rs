//! Google Maps Platform client (Directions + reverse Geocoding)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::{AddressResult, DirectionsProvider, Geocoder, ProviderError, RouteRecord};
use crate::config::MapsConfig;
use crate::route::GeoPoint;

/// Result types requested from reverse geocoding (county/locality level)
pub const GEOCODE_RESULT_TYPES: &str = "administrative_area_level_2|locality|administrative_area_level_3|sublocality";

/// Client for the Directions and Geocoding web services
pub struct GoogleMapsClient {
    api_key: String,
    base_url: String,
    mode: String,
    timeout: Duration,
    http: Client,
}

impl GoogleMapsClient {
    /// Create a client from configuration, reading the key from the configured env var
    pub fn from_config(config: &MapsConfig) -> Result<Self, ProviderError> {
        debug!(base_url = %config.base_url, "GoogleMapsClient::from_config: called");
        let api_key = config.get_api_key().map_err(|e| ProviderError::Config(e.to_string()))?;
        Self::new(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn new(config: &MapsConfig, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(ProviderError::Network)?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            mode: config.mode.clone(),
            timeout,
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "get_json: called");

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "get_json: HTTP error");
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl DirectionsProvider for GoogleMapsClient {
    async fn directions(&self, origin: &str, destination: &str) -> Result<Option<RouteRecord>, ProviderError> {
        debug!(%origin, %destination, mode = %self.mode, "directions: called");
        let body: DirectionsResponse = self
            .get_json(
                "/maps/api/directions/json",
                &[("origin", origin), ("destination", destination), ("mode", self.mode.as_str())],
            )
            .await?;

        match body.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" | "NOT_FOUND" => {
                debug!(status = %body.status, "directions: no route");
                return Ok(None);
            }
            other => {
                warn!(status = %other, "directions: provider rejected request");
                return Err(ProviderError::Status {
                    service: "directions",
                    status: other.to_string(),
                    message: body.error_message.unwrap_or_default(),
                });
            }
        }

        let Some(route) = body.routes.into_iter().next() else {
            debug!("directions: OK with empty routes");
            return Ok(None);
        };

        let leg = route.legs.into_iter().next();
        let record = RouteRecord {
            summary: route.summary,
            polyline: route
                .overview_polyline
                .map(|p| p.points)
                .filter(|p| !p.is_empty()),
            distance_meters: leg.as_ref().and_then(|l| l.distance.as_ref()).map(|d| d.value),
            duration_seconds: leg.as_ref().and_then(|l| l.duration.as_ref()).map(|d| d.value),
            start_address: leg.as_ref().and_then(|l| l.start_address.clone()),
            end_address: leg.and_then(|l| l.end_address),
            warnings: route.warnings,
        };
        debug!(summary = %record.summary, has_polyline = record.polyline.is_some(), "directions: route found");
        Ok(Some(record))
    }
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn reverse_geocode(&self, point: GeoPoint) -> Result<Vec<AddressResult>, ProviderError> {
        debug!(%point, "reverse_geocode: called");
        let latlng = point.to_string();
        let body: GeocodeResponse = self
            .get_json(
                "/maps/api/geocode/json",
                &[("latlng", latlng.as_str()), ("result_type", GEOCODE_RESULT_TYPES)],
            )
            .await?;

        match body.status.as_str() {
            "OK" => Ok(body.results),
            "ZERO_RESULTS" => Ok(vec![]),
            other => Err(ProviderError::Status {
                service: "geocode",
                status: other.to_string(),
                message: body.error_message.unwrap_or_default(),
            }),
        }
    }
}

// Google Maps response types

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<GoogleRoute>,
}

#[derive(Debug, Deserialize)]
struct GoogleRoute {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    overview_polyline: Option<GooglePolyline>,
    #[serde(default)]
    legs: Vec<GoogleLeg>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GooglePolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct GoogleLeg {
    distance: Option<GoogleValue>,
    duration: Option<GoogleValue>,
    start_address: Option<String>,
    end_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleValue {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<AddressResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(base_url: &str) -> GoogleMapsClient {
        let config = MapsConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        GoogleMapsClient::new(&config, "maps-key").unwrap()
    }

    #[tokio::test]
    async fn test_directions_first_route() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/directions/json"))
            .and(query_param("origin", "Chicago"))
            .and(query_param("destination", "Nashville"))
            .and(query_param("mode", "driving"))
            .and(query_param("key", "maps-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "routes": [
                    {
                        "summary": "I-65 S",
                        "overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC"},
                        "legs": [{
                            "distance": {"text": "761 km", "value": 761000},
                            "duration": {"text": "7 hours", "value": 25200},
                            "start_address": "Chicago, IL, USA",
                            "end_address": "Nashville, TN, USA"
                        }],
                        "warnings": []
                    },
                    {"summary": "I-57 S"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let route = client_for(&server.uri())
            .directions("Chicago", "Nashville")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(route.summary, "I-65 S");
        assert_eq!(route.polyline.as_deref(), Some("_p~iF~ps|U_ulLnnqC"));
        assert_eq!(route.distance_meters, Some(761000));
        assert_eq!(route.duration_seconds, Some(25200));
        assert_eq!(route.end_address.as_deref(), Some("Nashville, TN, USA"));
    }

    #[tokio::test]
    async fn test_directions_zero_results_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/directions/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ZERO_RESULTS", "routes": []})),
            )
            .mount(&server)
            .await;

        let route = client_for(&server.uri()).directions("Atlantis", "Nashville").await.unwrap();
        assert!(route.is_none());
    }

    #[tokio::test]
    async fn test_directions_missing_polyline() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/directions/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "routes": [{"summary": "somewhere", "legs": []}]
            })))
            .mount(&server)
            .await;

        let route = client_for(&server.uri()).directions("A", "B").await.unwrap().unwrap();
        assert!(route.polyline.is_none());
        assert!(route.distance_meters.is_none());
    }

    #[tokio::test]
    async fn test_directions_request_denied() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/directions/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            })))
            .mount(&server)
            .await;

        match client_for(&server.uri()).directions("A", "B").await {
            Err(ProviderError::Status { service, status, .. }) => {
                assert_eq!(service, "directions");
                assert_eq!(status, "REQUEST_DENIED");
            }
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_directions_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server.uri()).directions("A", "B").await,
            Err(ProviderError::Http { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_reverse_geocode_request_shape() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .and(query_param("latlng", "36.16266,-86.78160"))
            .and(query_param("result_type", GEOCODE_RESULT_TYPES))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "OK",
                "results": [{
                    "formatted_address": "Davidson County, TN, USA",
                    "address_components": [
                        {"long_name": "Davidson County", "short_name": "Davidson County", "types": ["administrative_area_level_2", "political"]},
                        {"long_name": "Tennessee", "short_name": "TN", "types": ["administrative_area_level_1", "political"]},
                        {"long_name": "United States", "short_name": "US", "types": ["country", "political"]}
                    ]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = client_for(&server.uri())
            .reverse_geocode(GeoPoint::new(36.16266, -86.7816))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].component("country").unwrap().short_name, "US");
    }

    #[tokio::test]
    async fn test_reverse_geocode_zero_results() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/maps/api/geocode/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ZERO_RESULTS"})))
            .mount(&server)
            .await;

        let results = client_for(&server.uri())
            .reverse_geocode(GeoPoint::new(0.0, -30.0))
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
