//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::units::Units;

/// Tripcast - driving itineraries with weather along the way
#[derive(Parser)]
#[command(
    name = "tripcast",
    about = "Plan a drive and see the weather at stops along the route",
    version = env!("CARGO_PKG_VERSION"),
    after_help = after_help(),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a single trip from a free-text request
    Plan {
        /// Request text, e.g. "from Chicago to Nashville"
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Origin, skips extraction for this endpoint
        #[arg(long)]
        origin: Option<String>,

        /// Destination, skips extraction for this endpoint
        #[arg(long)]
        destination: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Interactive session, one trip per line
    Chat {
        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print the effective configuration
    Config,
}

/// Per-run configuration overrides
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Temperature units (metric, imperial, standard)
    #[arg(long)]
    pub units: Option<Units>,

    /// Maximum number of stops
    #[arg(long)]
    pub max_stops: Option<usize>,

    /// Spacing between sampled points in kilometers
    #[arg(long)]
    pub interval_km: Option<f64>,

    /// Use simulated weather instead of the weather API
    #[arg(long)]
    pub mock_weather: bool,

    /// Seed for simulated weather
    #[arg(long)]
    pub seed: Option<u64>,

    /// Reply with the plain itinerary instead of an LLM summary
    #[arg(long)]
    pub no_compose: bool,
}

impl Overrides {
    /// Apply overrides on top of a loaded config
    pub fn apply(&self, config: &mut Config) {
        debug!(?self, "Overrides::apply: called");
        if let Some(units) = self.units {
            config.weather.units = units;
        }
        if let Some(max_stops) = self.max_stops {
            config.route.max_stops = max_stops;
        }
        if let Some(interval) = self.interval_km {
            config.route.sample_interval_km = interval;
        }
        if self.mock_weather {
            config.weather.mock = true;
        }
        if let Some(seed) = self.seed {
            config.weather.mock_seed = Some(seed);
        }
        if self.no_compose {
            config.llm.compose_reply = false;
        }
    }
}

/// Output format for `plan`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Log file location
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripcast")
        .join("logs")
        .join("tripcast.log")
}

fn after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}
