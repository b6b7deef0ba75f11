//! Route geometry and waypoint selection
//!
//! A route arrives as an encoded polyline. [`polyline`] decodes it and picks
//! sample points evenly by distance; [`waypoints`] turns those samples into
//! named, deduplicated stops via reverse geocoding.

mod geo;
pub mod polyline;
pub mod waypoints;

pub use geo::{EARTH_RADIUS_KM, GeoPoint};
pub use polyline::{PolylineSampler, SamplePoint};
pub use waypoints::{PlaceLabel, WaypointResolver};

use thiserror::Error;

/// Errors that can occur while turning a route into sample points
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Route has no usable path data")]
    MissingGeometry,

    #[error("Invalid polyline at byte {position}: {reason}")]
    InvalidPolyline { position: usize, reason: String },
}
