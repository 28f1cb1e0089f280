// Qualifying service - Results and per-driver segment telemetry
use crate::application::session_provider::SessionProvider;
use crate::domain::qualifying::{self, DrsZone, QualifyingFrame, QualifyingResult, Segment};
use crate::domain::session::SessionKey;
use crate::error::ReplayError;
use crate::infrastructure::cache::{DiskCache, KeyLocks};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Speed trace for one driver's best lap in one segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTelemetry {
    pub frames: Vec<QualifyingFrame>,
    pub drs_zones: Vec<DrsZone>,
    pub min_speed: f64,
    pub max_speed: f64,
}

/// The cached qualifying artifact: classification plus per-driver,
/// per-segment speed traces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifyingData {
    pub results: Vec<QualifyingResult>,
    pub telemetry: BTreeMap<String, BTreeMap<String, SegmentTelemetry>>,
}

#[derive(Clone)]
pub struct QualifyingService {
    provider: Arc<dyn SessionProvider>,
    cache: Arc<DiskCache>,
    locks: Arc<KeyLocks>,
    provider_timeout: Duration,
}

impl QualifyingService {
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

    /// Ranked classification with per-segment lap times.
    pub async fn results(&self, key: &SessionKey) -> Result<Vec<QualifyingResult>, ReplayError> {
        Ok(self.session_data(key).await?.results)
    }

    /// Speed trace for one driver and segment; NotFound when that
    /// combination has no recorded lap.
    pub async fn driver_segment_telemetry(
        &self,
        key: &SessionKey,
        driver_code: &str,
        segment: Segment,
    ) -> Result<SegmentTelemetry, ReplayError> {
        let data = self.session_data(key).await?;
        data.telemetry
            .get(driver_code)
            .and_then(|segments| segments.get(&segment.to_string()))
            .cloned()
            .ok_or_else(|| {
                ReplayError::not_found(format!(
                    "telemetry not found for driver {driver_code} in segment {segment}"
                ))
            })
    }

    async fn session_data(&self, key: &SessionKey) -> Result<QualifyingData, ReplayError> {
        let artifact = key.artifact_name("qualifying");

        if let Some(cached) = self.cache.read::<QualifyingData>(&artifact)? {
            tracing::debug!("cache hit for {}", artifact);
            return Ok(cached);
        }

        let _guard = self.locks.acquire(&artifact).await;
        if let Some(cached) = self.cache.read::<QualifyingData>(&artifact)? {
            return Ok(cached);
        }

        tracing::info!("computing qualifying data for {}", key);
        let provider = &self.provider;
        let (laps, colors) = tokio::time::timeout(self.provider_timeout, async {
            futures::try_join!(provider.qualifying_laps(key), provider.driver_colors(key))
        })
        .await
        .map_err(|_| ReplayError::ProviderTimeout(self.provider_timeout))??;

        let results = qualifying::rank_results(&laps, &colors);

        let mut telemetry: BTreeMap<String, BTreeMap<String, SegmentTelemetry>> = BTreeMap::new();
        for lap in laps {
            if lap.frames.is_empty() {
                continue;
            }
            let (min_speed, max_speed) = lap.frames.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(min, max), frame| (min.min(frame.speed), max.max(frame.speed)),
            );
            telemetry.entry(lap.driver_code.clone()).or_default().insert(
                lap.segment.to_string(),
                SegmentTelemetry {
                    frames: lap.frames,
                    drs_zones: lap.drs_zones,
                    min_speed,
                    max_speed,
                },
            );
        }

        let data = QualifyingData { results, telemetry };
        self.cache.write(&artifact, &data)?;
        Ok(data)
    }
}
