//! Simulated weather for offline runs and tests
//!
//! With a seed, the forecast for a point is a pure function of
//! `(seed, lat, lon)`. Without one every call draws fresh randomness.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{DailyForecast, ProviderError, WeatherProvider};
use crate::route::GeoPoint;
use crate::units::Units;

/// Number of simulated days
pub const MOCK_DAYS: usize = 7;

const CONDITIONS: &[(&str, &str)] = &[
    ("Clear", "clear sky"),
    ("Clouds", "scattered clouds"),
    ("Rain", "light rain"),
    ("Thunderstorm", "thunderstorms possible"),
    ("Drizzle", "drizzle"),
    ("Snow", "light snow"),
    ("Mist", "misty"),
];

/// Weather provider that generates plausible daily forecasts locally
#[derive(Debug, Clone, Copy, Default)]
pub struct MockWeatherProvider {
    seed: Option<u64>,
}

impl MockWeatherProvider {
    pub fn new(seed: Option<u64>) -> Self {
        Self { seed }
    }

    /// RNG seed for a point: `(seed ^ round(lat*1e4) ^ (round(lon*1e4) << 1)) & 0xFFFF_FFFF`
    pub fn point_seed(seed: u64, point: GeoPoint) -> u64 {
        let lat = (point.lat * 1e4).round() as i64;
        let lon = (point.lon * 1e4).round() as i64;
        ((seed as i64) ^ lat ^ (lon << 1)) as u64 & 0xFFFF_FFFF
    }

    /// Generate the simulated days for a point
    pub fn generate(&self, point: GeoPoint, units: Units) -> Vec<DailyForecast> {
        let rng_seed = match self.seed {
            Some(seed) => Self::point_seed(seed, point),
            None => rand::random::<u64>(),
        };
        debug!(%point, %units, seeded = self.seed.is_some(), "generate: called");
        let mut rng = StdRng::seed_from_u64(rng_seed);

        (0..MOCK_DAYS)
            .map(|_| {
                let max_c: f64 = rng.random_range(15.0..35.0);
                let min_c = max_c - rng.random_range(4.0..10.0);
                let (condition, description) = CONDITIONS.choose(&mut rng).copied().unwrap_or(CONDITIONS[0]);
                DailyForecast {
                    condition: Some(condition.to_string()),
                    description: Some(description.to_string()),
                    min: Some(round1(units.from_celsius(min_c))),
                    max: Some(round1(units.from_celsius(max_c))),
                }
            })
            .collect()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn daily_forecast(&self, point: GeoPoint, units: Units) -> Result<Vec<DailyForecast>, ProviderError> {
        Ok(self.generate(point, units))
    }
}
