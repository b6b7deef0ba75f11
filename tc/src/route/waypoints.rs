//! Waypoint resolution: sample points to named, deduplicated stops

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{PolylineSampler, RouteError};
use crate::providers::{AddressResult, Geocoder};
use crate::trip::Waypoint;

/// Place label derived from a geocoding result's address components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceLabel {
    /// County name, or locality when no county is present
    pub primary: String,
    /// Short first-level region (e.g. "TN")
    pub region_short: Option<String>,
    /// Short country code (e.g. "US")
    pub country_short: Option<String>,
}

impl PlaceLabel {
    /// Build a label from a geocoding result
    ///
    /// Returns `None` when the result has neither a county nor a locality, or
    /// when the primary label only repeats the region or country.
    pub fn from_address(result: &AddressResult) -> Option<Self> {
        let primary = result
            .component("administrative_area_level_2")
            .or_else(|| result.component("locality"))
            .map(|c| c.long_name.trim().to_string())
            .filter(|name| !name.is_empty())?;

        let short = |kind: &str| {
            result
                .component(kind)
                .map(|c| c.short_name.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let label = Self {
            primary,
            region_short: short("administrative_area_level_1"),
            country_short: short("country"),
        };

        if label.repeats_region() {
            debug!(primary = %label.primary, "PlaceLabel::from_address: primary repeats region or country");
            return None;
        }
        Some(label)
    }

    fn repeats_region(&self) -> bool {
        [&self.region_short, &self.country_short]
            .into_iter()
            .flatten()
            .any(|part| part.eq_ignore_ascii_case(&self.primary))
    }

    /// `primary, region, country` with absent parts omitted
    pub fn display_name(&self) -> String {
        std::iter::once(self.primary.as_str())
            .chain(self.region_short.as_deref())
            .chain(self.country_short.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Deduplication key: primary label and short region
    pub fn key(&self) -> (String, Option<String>) {
        (self.primary.clone(), self.region_short.clone())
    }
}

/// Turns a route polyline into at most `max_stops` named waypoints
pub struct WaypointResolver {
    geocoder: Arc<dyn Geocoder>,
    sampler: PolylineSampler,
    max_stops: usize,
}

impl WaypointResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, interval_km: f64, max_stops: usize) -> Self {
        let max_stops = max_stops.max(1);
        Self {
            geocoder,
            sampler: PolylineSampler::new(interval_km, max_stops),
            max_stops,
        }
    }

    /// Sample the polyline and reverse-geocode each sample in path order
    ///
    /// Samples that fail to geocode, return nothing, or produce no usable
    /// label are skipped. Only the first occurrence of each place is kept.
    pub async fn resolve(&self, encoded: &str) -> Result<Vec<Waypoint>, RouteError> {
        debug!(max_stops = self.max_stops, "resolve: called");
        let samples = self.sampler.sample(encoded)?;

        let mut seen = HashSet::new();
        let mut stops = Vec::new();
        let mut previous_index = None;

        for sample in samples {
            // Several targets inside one long segment select the same point
            if previous_index.replace(sample.index) == Some(sample.index) {
                debug!(index = sample.index, "resolve: sample repeats previous point, skipping");
                continue;
            }

            let results = match self.geocoder.reverse_geocode(sample.point).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(point = %sample.point, error = %e, "resolve: reverse geocode failed, skipping");
                    continue;
                }
            };

            let Some(label) = results.first().and_then(PlaceLabel::from_address) else {
                debug!(point = %sample.point, "resolve: no usable label, skipping");
                continue;
            };

            if !seen.insert(label.key()) {
                debug!(primary = %label.primary, "resolve: duplicate place, skipping");
                continue;
            }

            stops.push(Waypoint {
                name: label.display_name(),
                lat: sample.point.lat,
                lon: sample.point.lon,
            });
            if stops.len() >= self.max_stops {
                break;
            }
        }

        info!(count = stops.len(), "resolve: waypoints resolved");
        Ok(stops)
    }
}
