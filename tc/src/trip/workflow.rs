//! The trip planning state machine
//!
//! A run walks `GatherIntent -> GetDirections -> ExtractWaypoints ->
//! FetchWeather -> ComposeReply -> Done`, leaving early through `NeedInput`
//! when the user has to supply something or no route can be planned. Every
//! stage takes the trip state by value and returns the next stage with the
//! updated state. No stage is visited twice.

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::{Forecast, TripOutcome, TripState};
use crate::config::Config;
use crate::intent::{IntentExtractor, LlmIntentExtractor};
use crate::llm;
use crate::prompts::PromptLoader;
use crate::providers::{
    DirectionsProvider, Geocoder, GoogleMapsClient, MockWeatherProvider, OpenWeatherClient, WeatherProvider,
};
use crate::reply::{LlmReplyComposer, ReplyComposer};
use crate::route::{RouteError, WaypointResolver};
use crate::weather::WeatherFanout;

/// Asked when origin or destination could not be determined
pub const NEED_ENDPOINTS: &str = "Could you please provide both an origin and destination?";

/// Reported when the directions provider fails
pub const NEED_ROUTE_ERROR: &str =
    "I was unable to find the route for the origin and destination, try a different name or locations.";

/// Reported when the directions provider has no route
pub const NEED_NO_ROUTE: &str = "No route found. Try different locations.";

/// Reported when the route carries no geometry
pub const NEED_NO_GEOMETRY: &str = "Route polyline missing; cannot extract stops.";

/// Reported when the route geometry cannot be decoded
pub const NEED_BAD_GEOMETRY: &str = "Route polyline could not be decoded; cannot extract stops.";

/// Reported when no waypoint could be named
pub const NEED_NO_STOPS: &str = "No stops available to fetch weather.";

/// Workflow stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    GatherIntent,
    GetDirections,
    ExtractWaypoints,
    FetchWeather,
    ComposeReply,
    Done,
    NeedInput,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::NeedInput)
    }
}

/// Runs trips against a fixed set of collaborators
pub struct TripWorkflow {
    intent: Arc<dyn IntentExtractor>,
    directions: Arc<dyn DirectionsProvider>,
    waypoints: WaypointResolver,
    weather: WeatherFanout,
    composer: Option<Arc<dyn ReplyComposer>>,
}

impl TripWorkflow {
    /// Workflow without reply composition; the itinerary text is the reply
    pub fn new(
        intent: Arc<dyn IntentExtractor>,
        directions: Arc<dyn DirectionsProvider>,
        waypoints: WaypointResolver,
        weather: WeatherFanout,
    ) -> Self {
        Self {
            intent,
            directions,
            waypoints,
            weather,
            composer: None,
        }
    }

    pub fn with_composer(mut self, composer: Arc<dyn ReplyComposer>) -> Self {
        self.composer = Some(composer);
        self
    }

    /// Build the workflow with the real providers named in config
    ///
    /// Requires the LLM and maps API keys; the weather key is only needed
    /// when mock weather is off.
    pub fn from_config(config: &Config) -> Result<Self> {
        debug!("TripWorkflow::from_config: called");
        config.validate()?;

        let root = std::env::current_dir().context("Failed to resolve current directory")?;
        let prompts = Arc::new(PromptLoader::new(root));

        let llm = llm::create_client(&config.llm).context("Failed to create LLM client")?;
        let intent: Arc<dyn IntentExtractor> =
            Arc::new(LlmIntentExtractor::new(llm.clone(), prompts.clone(), &config.llm));

        let maps = Arc::new(GoogleMapsClient::from_config(&config.maps).context("Failed to create maps client")?);
        let geocoder: Arc<dyn Geocoder> = maps.clone();
        let waypoints = WaypointResolver::new(geocoder, config.route.sample_interval_km, config.route.max_stops);

        let provider: Arc<dyn WeatherProvider> = if config.weather.mock {
            info!(seed = ?config.weather.mock_seed, "from_config: using simulated weather");
            Arc::new(MockWeatherProvider::new(config.weather.mock_seed))
        } else {
            Arc::new(OpenWeatherClient::from_config(&config.weather).context("Failed to create weather client")?)
        };
        let weather = WeatherFanout::from_config(provider, &config.weather);

        let workflow = Self::new(intent, maps, waypoints, weather);
        Ok(if config.llm.compose_reply {
            workflow.with_composer(Arc::new(LlmReplyComposer::new(llm, prompts, &config.llm)))
        } else {
            workflow
        })
    }

    /// Plan one trip for a user message
    ///
    /// `origin` and `destination` carry endpoints the caller already knows
    /// from earlier turns; missing ones are extracted from `user_input`.
    pub async fn run(&self, user_input: &str, origin: Option<String>, destination: Option<String>) -> TripOutcome {
        let run_id = Uuid::now_v7();
        let span = info_span!("trip", %run_id);

        async move {
            info!(input_len = user_input.len(), "run: started");
            let mut stage = Stage::GatherIntent;
            let mut state = TripState::new(user_input, origin, destination);

            while !stage.is_terminal() {
                debug!(?stage, "run: entering stage");
                (stage, state) = self.step(stage, state).await;
            }

            info!(?stage, stops = state.stops.len(), "run: finished");
            state.into_outcome()
        }
        .instrument(span)
        .await
    }

    /// Execute a single stage
    pub async fn step(&self, stage: Stage, state: TripState) -> (Stage, TripState) {
        match stage {
            Stage::GatherIntent => self.gather_intent(state).await,
            Stage::GetDirections => self.get_directions(state).await,
            Stage::ExtractWaypoints => self.extract_waypoints(state).await,
            Stage::FetchWeather => self.fetch_weather(state).await,
            Stage::ComposeReply => self.compose_reply(state).await,
            Stage::Done | Stage::NeedInput => (stage, state),
        }
    }

    async fn gather_intent(&self, state: TripState) -> (Stage, TripState) {
        debug!("gather_intent: called");
        if state.endpoints().is_some() {
            debug!("gather_intent: endpoints already known");
            return (Stage::GetDirections, state);
        }

        let intent = match self.intent.extract(&state.user_input).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "gather_intent: extraction failed");
                Default::default()
            }
        };

        let state = state.with_endpoints(intent.origin, intent.destination);
        match state.endpoints() {
            Some((origin, destination)) => {
                info!(%origin, %destination, "gather_intent: endpoints resolved");
                (Stage::GetDirections, state)
            }
            None => {
                let need = intent.reply.unwrap_or_else(|| NEED_ENDPOINTS.to_string());
                info!("gather_intent: asking for endpoints");
                (Stage::NeedInput, state.with_need(need))
            }
        }
    }

    async fn get_directions(&self, state: TripState) -> (Stage, TripState) {
        let Some((origin, destination)) = state.endpoints() else {
            return (Stage::NeedInput, state.with_need(NEED_ENDPOINTS));
        };
        debug!(%origin, %destination, "get_directions: called");

        match self.directions.directions(origin, destination).await {
            Ok(Some(route)) => {
                info!(summary = %route.summary, "get_directions: route found");
                (Stage::ExtractWaypoints, state.with_route(route))
            }
            Ok(None) => {
                info!("get_directions: no route");
                (Stage::NeedInput, state.with_need(NEED_NO_ROUTE))
            }
            Err(e) => {
                warn!(error = %e, "get_directions: provider error");
                (Stage::NeedInput, state.with_need(NEED_ROUTE_ERROR))
            }
        }
    }

    async fn extract_waypoints(&self, state: TripState) -> (Stage, TripState) {
        debug!("extract_waypoints: called");
        let Some(encoded) = state.route.as_ref().and_then(|r| r.polyline.clone()) else {
            info!("extract_waypoints: route has no polyline");
            return (Stage::NeedInput, state.with_need(NEED_NO_GEOMETRY));
        };

        match self.waypoints.resolve(&encoded).await {
            Ok(stops) => (Stage::FetchWeather, state.with_stops(stops)),
            Err(RouteError::MissingGeometry) => (Stage::NeedInput, state.with_need(NEED_NO_GEOMETRY)),
            Err(e) => {
                warn!(error = %e, "extract_waypoints: polyline rejected");
                (Stage::NeedInput, state.with_need(NEED_BAD_GEOMETRY))
            }
        }
    }

    async fn fetch_weather(&self, state: TripState) -> (Stage, TripState) {
        debug!(stops = state.stops.len(), "fetch_weather: called");
        if state.stops.is_empty() {
            return (Stage::NeedInput, state.with_need(NEED_NO_STOPS));
        }

        let forecasts = self.weather.fetch_all(&state.stops).await;
        (Stage::ComposeReply, state.with_forecasts(forecasts))
    }

    async fn compose_reply(&self, state: TripState) -> (Stage, TripState) {
        debug!("compose_reply: called");
        let itinerary = format_itinerary(
            state.origin.as_deref().unwrap_or_default(),
            state.destination.as_deref().unwrap_or_default(),
            &state.forecasts,
        );

        let reply = match &self.composer {
            Some(composer) => match composer.compose(&itinerary).await {
                Ok(Some(reply)) => reply,
                Ok(None) => {
                    debug!("compose_reply: empty composition, using itinerary");
                    itinerary
                }
                Err(e) => {
                    warn!(error = %e, "compose_reply: composition failed, using itinerary");
                    itinerary
                }
            },
            None => itinerary,
        };

        (Stage::Done, state.with_reply(reply))
    }
}

/// Plain-text itinerary: a header line then one numbered line per forecast
pub fn format_itinerary(origin: &str, destination: &str, forecasts: &[Forecast]) -> String {
    let mut lines = vec![format!("Trip from {} to {}:", origin, destination)];
    lines.extend(
        forecasts
            .iter()
            .enumerate()
            .map(|(i, f)| format!("  {}. {}: {}", i + 1, f.waypoint.name, f.summary)),
    );
    lines.join("\n")
}
