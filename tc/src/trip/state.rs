//! Trip record threaded through the workflow stages

use serde::{Deserialize, Serialize};

use crate::providers::RouteRecord;
use crate::route::GeoPoint;

/// A named point along the route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Waypoint {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// A waypoint with its weather summary (or an error marker)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(flatten)]
    pub waypoint: Waypoint,
    pub summary: String,
}

impl Forecast {
    pub fn new(waypoint: Waypoint, summary: impl Into<String>) -> Self {
        Self {
            waypoint,
            summary: summary.into(),
        }
    }
}

/// State of a single trip run
///
/// Each stage takes the state by value and returns a new one with its own
/// fields filled in. `need` and `reply` are never both set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripState {
    pub user_input: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub route: Option<RouteRecord>,
    pub stops: Vec<Waypoint>,
    pub forecasts: Vec<Forecast>,
    pub reply: Option<String>,
    pub need: Option<String>,
}

impl TripState {
    /// Fresh state for one user message, with any endpoints the caller already knows
    pub fn new(user_input: impl Into<String>, origin: Option<String>, destination: Option<String>) -> Self {
        Self {
            user_input: user_input.into(),
            origin: non_empty(origin),
            destination: non_empty(destination),
            ..Default::default()
        }
    }

    /// Both endpoints, when present and non-empty
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        match (self.origin.as_deref(), self.destination.as_deref()) {
            (Some(o), Some(d)) if !o.trim().is_empty() && !d.trim().is_empty() => Some((o, d)),
            _ => None,
        }
    }

    /// Fill in endpoints that are still missing; known ones are kept
    pub fn with_endpoints(self, origin: Option<String>, destination: Option<String>) -> Self {
        Self {
            origin: non_empty(self.origin).or_else(|| non_empty(origin)),
            destination: non_empty(self.destination).or_else(|| non_empty(destination)),
            ..self
        }
    }

    pub fn with_route(self, route: RouteRecord) -> Self {
        Self {
            route: Some(route),
            ..self
        }
    }

    pub fn with_stops(self, stops: Vec<Waypoint>) -> Self {
        Self { stops, ..self }
    }

    pub fn with_forecasts(self, forecasts: Vec<Forecast>) -> Self {
        Self { forecasts, ..self }
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..self
        }
    }

    /// Stop the run and ask the user for something; drops any partial results
    pub fn with_need(self, need: impl Into<String>) -> Self {
        Self {
            stops: Vec::new(),
            forecasts: Vec::new(),
            reply: None,
            need: Some(need.into()),
            ..self
        }
    }

    /// Convert a finished state into the caller-facing result
    pub fn into_outcome(self) -> TripOutcome {
        if let Some(need) = self.need {
            return TripOutcome::NeedInput { need };
        }

        TripOutcome::Planned(TripPlan {
            reply: self.reply.unwrap_or_default(),
            origin: self.origin.unwrap_or_default(),
            destination: self.destination.unwrap_or_default(),
            stops: self.stops,
            forecasts: self.forecasts,
            route: self.route,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// A completed itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub reply: String,
    pub origin: String,
    pub destination: String,
    pub stops: Vec<Waypoint>,
    pub forecasts: Vec<Forecast>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteRecord>,
}

/// Result of one trip run: a question for the user, or the itinerary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TripOutcome {
    NeedInput { need: String },
    Planned(TripPlan),
}

impl TripOutcome {
    pub fn need(&self) -> Option<&str> {
        match self {
            TripOutcome::NeedInput { need } => Some(need),
            TripOutcome::Planned(_) => None,
        }
    }

    pub fn plan(&self) -> Option<&TripPlan> {
        match self {
            TripOutcome::NeedInput { .. } => None,
            TripOutcome::Planned(plan) => Some(plan),
        }
    }
}
