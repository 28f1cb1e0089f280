// Replay service - Race telemetry and track geometry use cases
//
// Compute-once-per-key: artifacts are cached on disk keyed by
// (year, round, session_type). The recompute path is single-flight per
// key; provider work is timeout-bounded.
use crate::application::frame_builder::FrameBuilder;
use crate::application::session_provider::SessionProvider;
use crate::domain::diagnostics;
use crate::domain::frame::Frame;
use crate::domain::geometry;
use crate::domain::session::SessionKey;
use crate::domain::track::{self, TrackGeometry, TrackStatus};
use crate::error::ReplayError;
use crate::infrastructure::cache::{DiskCache, KeyLocks};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// The full precomputed race artifact, as cached and served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceTelemetry {
    pub frames: Vec<Frame>,
    pub track_statuses: Vec<TrackStatus>,
    pub driver_colors: BTreeMap<String, [u8; 3]>,
    pub total_laps: u32,
}

#[derive(Clone)]
pub struct ReplayService {
    provider: Arc<dyn SessionProvider>,
    cache: Arc<DiskCache>,
    locks: Arc<KeyLocks>,
    provider_timeout: Duration,
}

impl ReplayService {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        cache: Arc<DiskCache>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            locks: Arc::new(KeyLocks::new()),
            provider_timeout,
        }
    }

    /// Full race telemetry for a session, computed on first request and
    /// served from the cache afterwards. `refresh` forces a recompute
    /// that atomically replaces the artifact.
    pub async fn race_telemetry(
        &self,
        key: &SessionKey,
        refresh: bool,
    ) -> Result<RaceTelemetry, ReplayError> {
        let artifact = key.artifact_name("race_telemetry");

        if !refresh {
            if let Some(cached) = self.cache.read::<RaceTelemetry>(&artifact)? {
                tracing::debug!("cache hit for {}", artifact);
                return Ok(cached);
            }
        }

        let _guard = self.locks.acquire(&artifact).await;
        // Another request may have finished the computation while we
        // waited for the guard.
        if !refresh {
            if let Some(cached) = self.cache.read::<RaceTelemetry>(&artifact)? {
                return Ok(cached);
            }
        }

        tracing::info!("computing race telemetry for {}", key);
        let telemetry = self.compute_race_telemetry(key).await?;
        self.cache.write(&artifact, &telemetry)?;
        Ok(telemetry)
    }

    async fn compute_race_telemetry(&self, key: &SessionKey) -> Result<RaceTelemetry, ReplayError> {
        let provider = &self.provider;
        let (info, series, weather, status_events, driver_colors) = self
            .bounded(async {
                futures::try_join!(
                    provider.session_info(key),
                    provider.driver_series(key),
                    provider.weather_series(key),
                    provider.status_events(key),
                    provider.driver_colors(key),
                )
            })
            .await?;

        let frames = FrameBuilder::new(series, weather).build();

        let anomalies = diagnostics::find_ordering_anomalies(&frames);
        for anomaly in anomalies.iter().take(5) {
            tracing::warn!("{}: ordering anomaly: {}", key, anomaly);
        }
        if anomalies.len() > 5 {
            tracing::warn!("{}: {} further ordering anomalies", key, anomalies.len() - 5);
        }

        Ok(RaceTelemetry {
            frames,
            track_statuses: track::status_intervals(&status_events),
            driver_colors,
            total_laps: info.total_laps,
        })
    }

    /// Track boundary geometry for a session, built once from the
    /// fastest lap and cached.
    pub async fn track_geometry(&self, key: &SessionKey) -> Result<TrackGeometry, ReplayError> {
        let artifact = key.artifact_name("track_geometry");

        if let Some(cached) = self.cache.read::<TrackGeometry>(&artifact)? {
            tracing::debug!("cache hit for {}", artifact);
            return Ok(cached);
        }

        let _guard = self.locks.acquire(&artifact).await;
        if let Some(cached) = self.cache.read::<TrackGeometry>(&artifact)? {
            return Ok(cached);
        }

        tracing::info!("building track geometry for {}", key);
        let trajectory = self.bounded(self.provider.fastest_lap_trajectory(key)).await?;
        let track = geometry::build_track_geometry(&trajectory)?;
        self.cache.write(&artifact, &track)?;
        Ok(track)
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, ReplayError>>,
    ) -> Result<T, ReplayError> {
        tokio::time::timeout(self.provider_timeout, fut)
            .await
            .map_err(|_| ReplayError::ProviderTimeout(self.provider_timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::Event;
    use crate::domain::frame::{DriverSeries, TelemetrySample, WeatherSample};
    use crate::domain::geometry::TrajectoryPoint;
    use crate::domain::qualifying::QualifyingLap;
    use crate::domain::session::SessionInfo;
    use crate::domain::track::StatusEvent;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        series_calls: AtomicUsize,
        delay: Duration,
    }

    impl StubProvider {
        fn new(delay: Duration) -> Self {
            Self {
                series_calls: AtomicUsize::new(0),
                delay,
            }
        }
    }

    #[async_trait]
    impl SessionProvider for StubProvider {
        async fn session_info(&self, _key: &SessionKey) -> Result<SessionInfo, ReplayError> {
            Ok(SessionInfo {
                event_name: "Test Grand Prix".to_string(),
                total_laps: 2,
            })
        }

        async fn driver_series(&self, _key: &SessionKey) -> Result<Vec<DriverSeries>, ReplayError> {
            self.series_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let samples = |offset: f64| {
                vec![
                    TelemetrySample {
                        time: 0.0,
                        x: 0.0,
                        y: 0.0,
                        lap_distance: 100.0 + offset,
                        lap: 1,
                        tyre_compound: 1,
                        speed: 280.0,
                        gear: 8,
                        drs_state: 0,
                        throttle: 1.0,
                        brake: 0.0,
                    },
                    TelemetrySample {
                        time: 1.0,
                        x: 10.0,
                        y: 0.0,
                        lap_distance: 180.0 + offset,
                        lap: 1,
                        tyre_compound: 1,
                        speed: 280.0,
                        gear: 8,
                        drs_state: 0,
                        throttle: 1.0,
                        brake: 0.0,
                    },
                ]
            };
            Ok(vec![
                DriverSeries {
                    code: "AAA".to_string(),
                    samples: samples(50.0),
                },
                DriverSeries {
                    code: "BBB".to_string(),
                    samples: samples(0.0),
                },
            ])
        }

        async fn weather_series(&self, _key: &SessionKey) -> Result<Vec<WeatherSample>, ReplayError> {
            Ok(Vec::new())
        }

        async fn status_events(&self, _key: &SessionKey) -> Result<Vec<StatusEvent>, ReplayError> {
            Ok(vec![StatusEvent {
                time: 0.0,
                status_code: "1".to_string(),
            }])
        }

        async fn driver_colors(
            &self,
            _key: &SessionKey,
        ) -> Result<BTreeMap<String, [u8; 3]>, ReplayError> {
            let mut colors = BTreeMap::new();
            colors.insert("AAA".to_string(), [255, 0, 0]);
            colors.insert("BBB".to_string(), [0, 0, 255]);
            Ok(colors)
        }

        async fn fastest_lap_trajectory(
            &self,
            _key: &SessionKey,
        ) -> Result<Vec<TrajectoryPoint>, ReplayError> {
            tokio::time::sleep(self.delay).await;
            Ok((0..360)
                .map(|i| {
                    let angle = i as f64 / 360.0 * std::f64::consts::TAU;
                    TrajectoryPoint {
                        x: 200.0 * angle.cos(),
                        y: 200.0 * angle.sin(),
                    }
                })
                .collect())
        }

        async fn qualifying_laps(
            &self,
            _key: &SessionKey,
        ) -> Result<Vec<QualifyingLap>, ReplayError> {
            Ok(Vec::new())
        }

        async fn event_schedule(&self, _year: i32) -> Result<Vec<Event>, ReplayError> {
            Ok(Vec::new())
        }

        async fn sprint_schedule(&self, _year: i32) -> Result<Vec<Event>, ReplayError> {
            Ok(Vec::new())
        }
    }

    fn service(delay: Duration, timeout: Duration) -> (tempfile::TempDir, ReplayService, Arc<StubProvider>) {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(DiskCache::new(dir.path().join("computed")).unwrap());
        let provider = Arc::new(StubProvider::new(delay));
        let service = ReplayService::new(provider.clone(), cache, timeout);
        (dir, service, provider)
    }

    fn key() -> SessionKey {
        SessionKey::new(2024, 1, "R")
    }

    #[tokio::test]
    async fn test_first_request_computes_then_serves_from_cache() {
        let (_dir, service, provider) = service(Duration::ZERO, Duration::from_secs(5));
        let first = service.race_telemetry(&key(), false).await.unwrap();
        let second = service.race_telemetry(&key(), false).await.unwrap();
        assert_eq!(provider.series_calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.frames.len(), second.frames.len());
        assert_eq!(first.total_laps, 2);
        assert_eq!(first.track_statuses.len(), 1);
        assert_eq!(first.track_statuses[0].end_time, None);
    }

    #[tokio::test]
    async fn test_cached_artifact_is_byte_identical_across_requests() {
        let (_dir, service, _provider) = service(Duration::ZERO, Duration::from_secs(5));
        let artifact = key().artifact_name("race_telemetry");
        service.race_telemetry(&key(), false).await.unwrap();
        let first = service.cache.read_bytes(&artifact).unwrap().unwrap();
        service.race_telemetry(&key(), false).await.unwrap();
        let second = service.cache.read_bytes(&artifact).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_refresh_recomputes() {
        let (_dir, service, provider) = service(Duration::ZERO, Duration::from_secs(5));
        service.race_telemetry(&key(), false).await.unwrap();
        service.race_telemetry(&key(), true).await.unwrap();
        assert_eq!(provider.series_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_computation() {
        let (_dir, service, provider) = service(Duration::from_millis(50), Duration::from_secs(5));
        let a = service.clone();
        let b = service.clone();
        let session = key();
        let (ra, rb) = tokio::join!(
            a.race_telemetry(&session, false),
            b.race_telemetry(&session, false)
        );
        ra.unwrap();
        rb.unwrap();
        assert_eq!(provider.series_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_surfaces_as_bounded_timeout() {
        let (_dir, service, _provider) =
            service(Duration::from_millis(200), Duration::from_millis(20));
        let result = service.race_telemetry(&key(), false).await;
        assert!(matches!(result, Err(ReplayError::ProviderTimeout(_))));
    }

    #[tokio::test]
    async fn test_track_geometry_is_cached() {
        let (_dir, service, _provider) = service(Duration::ZERO, Duration::from_secs(5));
        let artifact = key().artifact_name("track_geometry");
        let track = service.track_geometry(&key()).await.unwrap();
        assert_eq!(track.inner_boundary.first(), track.inner_boundary.last());
        let first = service.cache.read_bytes(&artifact).unwrap().unwrap();
        service.track_geometry(&key()).await.unwrap();
        let second = service.cache.read_bytes(&artifact).unwrap().unwrap();
        assert_eq!(first, second);
    }
}
