//! Tripcast - driving itineraries with weather along the way
//!
//! A free-text request such as "from Chicago to Nashville" is turned into a
//! route, a handful of named stops spread evenly along it, and a short
//! weather summary for each stop.
//!
//! # Modules
//!
//! - [`trip`] - Trip state and the planning workflow
//! - [`route`] - Polyline sampling and waypoint naming
//! - [`weather`] - Concurrent per-stop forecast lookups
//! - [`providers`] - Directions, geocoding and weather services
//! - [`intent`] / [`reply`] - LLM-backed extraction and reply composition
//! - [`llm`] - LLM client trait and OpenAI implementation
//! - [`config`] - Configuration types and loading
//! - [`cli`] / [`chat`] - Command-line interface

pub mod chat;
pub mod cli;
pub mod config;
pub mod intent;
pub mod llm;
pub mod prompts;
pub mod providers;
pub mod reply;
pub mod route;
pub mod trip;
pub mod units;
pub mod weather;

// Re-export commonly used types
pub use config::{Config, LlmConfig, MapsConfig, RouteConfig, WeatherConfig};
pub use intent::{Intent, IntentExtractor};
pub use providers::{DailyForecast, DirectionsProvider, Geocoder, ProviderError, RouteRecord, WeatherProvider};
pub use reply::ReplyComposer;
pub use route::{GeoPoint, RouteError, WaypointResolver};
pub use trip::{Forecast, Stage, TripOutcome, TripPlan, TripState, TripWorkflow, Waypoint};
pub use units::Units;
pub use weather::WeatherFanout;
