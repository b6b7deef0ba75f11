//! Trip planning: the shared trip record and the workflow that fills it

mod state;
mod workflow;

pub use crate::providers::RouteRecord;
pub use state::{Forecast, TripOutcome, TripPlan, TripState, Waypoint};
pub use workflow::{
    NEED_BAD_GEOMETRY, NEED_ENDPOINTS, NEED_NO_GEOMETRY, NEED_NO_ROUTE, NEED_NO_STOPS, NEED_ROUTE_ERROR, Stage,
    TripWorkflow, format_itinerary,
};
