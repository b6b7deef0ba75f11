//! Weather lookups for resolved waypoints
//!
//! [`WeatherFanout`] runs one forecast task per waypoint and reassembles the
//! results in waypoint order. A failed lookup becomes an error-marker summary
//! on that waypoint instead of failing the batch.

mod summary;

pub use summary::{NO_DAILY_DATA, SUMMARY_DAYS, format_temperature, summarize};

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::config::WeatherConfig;
use crate::providers::{ProviderError, WeatherProvider};
use crate::trip::{Forecast, Waypoint};
use crate::units::Units;

/// Prefix of the summary recorded for a failed lookup
pub const WEATHER_ERROR_PREFIX: &str = "weather error: ";

/// Aborts the per-stop tasks if the fan-out is dropped before they finish
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Concurrent per-waypoint forecast fetcher
#[derive(Clone)]
pub struct WeatherFanout {
    provider: Arc<dyn WeatherProvider>,
    units: Units,
    timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
}

impl WeatherFanout {
    /// Unbounded fan-out with the given per-call timeout
    pub fn new(provider: Arc<dyn WeatherProvider>, units: Units, timeout: Duration) -> Self {
        Self {
            provider,
            units,
            timeout,
            limiter: None,
        }
    }

    pub fn from_config(provider: Arc<dyn WeatherProvider>, config: &WeatherConfig) -> Self {
        Self::new(provider, config.units, Duration::from_millis(config.timeout_ms))
            .with_max_concurrent(config.max_concurrent)
    }

    /// Cap in-flight lookups; 0 leaves the fan-out unbounded
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.limiter = (max_concurrent > 0).then(|| Arc::new(Semaphore::new(max_concurrent)));
        self
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Fetch forecasts for every stop
    ///
    /// Always returns exactly one forecast per stop, in stop order.
    pub async fn fetch_all(&self, stops: &[Waypoint]) -> Vec<Forecast> {
        debug!(count = stops.len(), units = %self.units, "fetch_all: called");

        let handles: Vec<_> = stops
            .iter()
            .map(|stop| {
                let provider = self.provider.clone();
                let limiter = self.limiter.clone();
                let point = stop.point();
                let units = self.units;
                let timeout = self.timeout;

                tokio::spawn(async move {
                    let _permit = match limiter {
                        Some(semaphore) => semaphore.acquire_owned().await.ok(),
                        None => None,
                    };
                    match tokio::time::timeout(timeout, provider.daily_forecast(point, units)).await {
                        Ok(Ok(days)) => Ok(summarize(&days)),
                        Ok(Err(e)) => Err(e),
                        Err(_) => Err(ProviderError::Timeout(timeout)),
                    }
                })
            })
            .collect();

        let _guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());
        let results = join_all(handles).await;

        let mut failed = 0;
        let forecasts: Vec<Forecast> = stops
            .iter()
            .zip(results)
            .map(|(stop, result)| {
                let summary = match result {
                    Ok(Ok(summary)) => summary,
                    Ok(Err(e)) => {
                        failed += 1;
                        warn!(stop = %stop.name, error = %e, "fetch_all: weather lookup failed");
                        format!("{WEATHER_ERROR_PREFIX}{e}")
                    }
                    Err(e) => {
                        failed += 1;
                        warn!(stop = %stop.name, error = %e, "fetch_all: weather task did not complete");
                        format!("{WEATHER_ERROR_PREFIX}{e}")
                    }
                };
                Forecast::new(stop.clone(), summary)
            })
            .collect();

        info!(count = forecasts.len(), failed, "fetch_all: forecasts collected");
        forecasts
    }
}

/// True when a forecast summary marks a failed lookup
pub fn is_error_summary(summary: &str) -> bool {
    summary.starts_with(WEATHER_ERROR_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{DailyForecast, MockWeatherProvider};
    use crate::route::GeoPoint;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn stops(n: usize) -> Vec<Waypoint> {
        (0..n)
            .map(|i| Waypoint {
                name: format!("Stop {i}"),
                lat: 35.0 + i as f64,
                lon: -86.0,
            })
            .collect()
    }

    /// Fails for every second stop; earlier stops answer last
    struct FlakyProvider;

    #[async_trait]
    impl WeatherProvider for FlakyProvider {
        async fn daily_forecast(&self, point: GeoPoint, _units: Units) -> Result<Vec<DailyForecast>, ProviderError> {
            let delay = (45.0 - point.lat) as u64;
            tokio::time::sleep(Duration::from_millis(delay * 5)).await;
            if (point.lat as i64 - 35) % 2 == 1 {
                return Err(ProviderError::Http {
                    status: 502,
                    message: "bad gateway".to_string(),
                });
            }
            Ok(vec![DailyForecast {
                condition: Some(format!("Lat{}", point.lat)),
                description: None,
                min: Some(1.0),
                max: Some(2.0),
            }])
        }
    }

    struct PanickingProvider;

    #[async_trait]
    impl WeatherProvider for PanickingProvider {
        async fn daily_forecast(&self, point: GeoPoint, _units: Units) -> Result<Vec<DailyForecast>, ProviderError> {
            if point.lat > 35.5 {
                panic!("provider exploded");
            }
            Ok(vec![])
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl WeatherProvider for SlowProvider {
        async fn daily_forecast(&self, _point: GeoPoint, _units: Units) -> Result<Vec<DailyForecast>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![])
        }
    }

    /// Tracks the highest number of concurrent calls
    #[derive(Default)]
    struct CountingProvider {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for CountingProvider {
        async fn daily_forecast(&self, _point: GeoPoint, _units: Units) -> Result<Vec<DailyForecast>, ProviderError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    /// Counts calls that start and calls that run to completion
    #[derive(Default)]
    struct TrackingProvider {
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for TrackingProvider {
        async fn daily_forecast(&self, _point: GeoPoint, _units: Units) -> Result<Vec<DailyForecast>, ProviderError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_dropped_fanout_aborts_tasks() {
        let provider = Arc::new(TrackingProvider::default());
        let fanout = WeatherFanout::new(provider.clone(), Units::Metric, Duration::from_secs(5));
        let input = stops(3);

        let cut_short = tokio::time::timeout(Duration::from_millis(50), fanout.fetch_all(&input)).await;
        assert!(cut_short.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(provider.started.load(Ordering::SeqCst), 3);
        assert_eq!(provider.finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_alignment_under_partial_failure() {
        let fanout = WeatherFanout::new(Arc::new(FlakyProvider), Units::Metric, Duration::from_secs(5));
        let input = stops(6);
        let forecasts = fanout.fetch_all(&input).await;

        assert_eq!(forecasts.len(), input.len());
        for (i, (forecast, stop)) in forecasts.iter().zip(&input).enumerate() {
            assert_eq!(&forecast.waypoint, stop);
            if i % 2 == 1 {
                assert!(is_error_summary(&forecast.summary), "{}", forecast.summary);
                assert!(forecast.summary.contains("502"));
            } else {
                assert_eq!(forecast.summary, format!("Lat{} (min 1°, max 2°)", stop.lat));
            }
        }
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_error_marker() {
        let fanout = WeatherFanout::new(Arc::new(PanickingProvider), Units::Metric, Duration::from_secs(5));
        let forecasts = fanout.fetch_all(&stops(3)).await;

        assert_eq!(forecasts.len(), 3);
        assert_eq!(forecasts[0].summary, NO_DAILY_DATA);
        assert!(is_error_summary(&forecasts[1].summary));
        assert!(is_error_summary(&forecasts[2].summary));
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_marker() {
        let fanout = WeatherFanout::new(Arc::new(SlowProvider), Units::Metric, Duration::from_millis(20));
        let forecasts = fanout.fetch_all(&stops(2)).await;

        assert_eq!(forecasts.len(), 2);
        for forecast in &forecasts {
            assert!(forecast.summary.starts_with("weather error: timed out"), "{}", forecast.summary);
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let fanout = WeatherFanout::new(Arc::new(MockWeatherProvider::new(Some(1))), Units::Metric, Duration::from_secs(1));
        assert!(fanout.fetch_all(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_seeded_mock_is_repeatable() {
        let fanout = WeatherFanout::new(
            Arc::new(MockWeatherProvider::new(Some(2024))),
            Units::Imperial,
            Duration::from_secs(1),
        );
        let input = stops(4);
        let first = fanout.fetch_all(&input).await;
        let second = fanout.fetch_all(&input).await;

        assert_eq!(first, second);
        assert!(first.iter().all(|f| !is_error_summary(&f.summary)));
    }

    #[tokio::test]
    async fn test_max_concurrent_limits_in_flight() {
        let provider = Arc::new(CountingProvider::default());
        let fanout =
            WeatherFanout::new(provider.clone(), Units::Metric, Duration::from_secs(5)).with_max_concurrent(2);

        let forecasts = fanout.fetch_all(&stops(6)).await;
        assert_eq!(forecasts.len(), 6);
        assert!(provider.peak.load(Ordering::SeqCst) <= 2);
    }
}
