// HTTP implementation of the session provider
//
// Talks JSON to a telemetry export sidecar that wraps the actual F1
// data library (session loading, GPS interpolation, lap timing). All
// numeric payload values are validated to be finite here, at the
// boundary: serde_json would otherwise encode a non-finite float as
// `null` on the way out, which is exactly the silent data drop the
// serialization contract forbids.
use crate::application::session_provider::SessionProvider;
use crate::domain::event::Event;
use crate::domain::frame::{DriverSeries, TelemetrySample, WeatherInfo, WeatherSample};
use crate::domain::geometry::TrajectoryPoint;
use crate::domain::qualifying::{DrsZone, QualifyingFrame, QualifyingLap, Segment};
use crate::domain::session::{SessionInfo, SessionKey};
use crate::domain::track::StatusEvent;
use crate::error::ReplayError;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSessionProvider {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build provider HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn session_url(&self, key: &SessionKey, tail: &str) -> String {
        let session_type = urlencoding::encode(&key.session_type);
        let mut url = format!(
            "{}/api/sessions/{}/{}/{}",
            self.base_url, key.year, key.round, session_type
        );
        if !tail.is_empty() {
            url.push('/');
            url.push_str(tail);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ReplayError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("provider request to {url} failed"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ReplayError::not_found(format!(
                "provider has no data for {url}"
            )));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("provider returned {status} for {url}: {body}").into());
        }

        Ok(response
            .json::<T>()
            .await
            .with_context(|| format!("failed to parse provider response from {url}"))?)
    }
}

// --- Wire DTOs ---

#[derive(Debug, Deserialize)]
struct SessionInfoDto {
    event_name: String,
    total_laps: u32,
}

#[derive(Debug, Deserialize)]
struct DriverSeriesDto {
    code: String,
    samples: Vec<SampleDto>,
}

#[derive(Debug, Deserialize)]
struct SampleDto {
    t: Option<f64>,
    x: Option<f64>,
    y: Option<f64>,
    dist: Option<f64>,
    lap: u32,
    #[serde(default)]
    tyre: i32,
    speed: Option<f64>,
    #[serde(default)]
    gear: i32,
    #[serde(default)]
    drs: i32,
    throttle: Option<f64>,
    brake: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WeatherDto {
    t: Option<f64>,
    track_temp: Option<f64>,
    air_temp: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
    rain_state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusEventDto {
    t: Option<f64>,
    status: String,
}

#[derive(Debug, Deserialize)]
struct TrajectoryPointDto {
    x: Option<f64>,
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct QualifyingLapDto {
    driver: String,
    segment: String,
    lap_time: Option<f64>,
    #[serde(default)]
    frames: Vec<QualifyingFrameDto>,
    #[serde(default)]
    drs_zones: Vec<DrsZoneDto>,
}

#[derive(Debug, Deserialize)]
struct QualifyingFrameDto {
    t: Option<f64>,
    dist: Option<f64>,
    speed: Option<f64>,
    #[serde(default)]
    gear: i32,
    throttle: Option<f64>,
    brake: Option<f64>,
    #[serde(default)]
    drs: i32,
}

#[derive(Debug, Deserialize)]
struct DrsZoneDto {
    zone_start: Option<f64>,
    zone_end: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EventDto {
    round_number: u32,
    event_name: String,
    country: String,
    location: String,
    event_date: String,
}

// --- Numeric normalization ---

fn require_finite(field: &str, value: Option<f64>) -> Result<f64, ReplayError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(ReplayError::serialization(field, "non-finite number")),
        None => Err(ReplayError::serialization(field, "missing value")),
    }
}

fn optional_finite(field: &str, value: Option<f64>) -> Result<Option<f64>, ReplayError> {
    match value {
        Some(v) if v.is_finite() => Ok(Some(v)),
        Some(_) => Err(ReplayError::serialization(field, "non-finite number")),
        None => Ok(None),
    }
}

fn sample_from_dto(code: &str, index: usize, dto: SampleDto) -> Result<TelemetrySample, ReplayError> {
    let at = |name: &str| format!("drivers[{code}].samples[{index}].{name}");
    Ok(TelemetrySample {
        time: require_finite(&at("t"), dto.t)?,
        x: require_finite(&at("x"), dto.x)?,
        y: require_finite(&at("y"), dto.y)?,
        lap_distance: require_finite(&at("dist"), dto.dist)?,
        lap: dto.lap,
        tyre_compound: dto.tyre,
        speed: require_finite(&at("speed"), dto.speed)?,
        gear: dto.gear,
        drs_state: dto.drs,
        throttle: require_finite(&at("throttle"), dto.throttle)?,
        brake: require_finite(&at("brake"), dto.brake)?,
    })
}

fn weather_from_dto(index: usize, dto: WeatherDto) -> Result<WeatherSample, ReplayError> {
    let at = |name: &str| format!("weather[{index}].{name}");
    Ok(WeatherSample {
        time: require_finite(&at("t"), dto.t)?,
        info: WeatherInfo {
            track_temp: optional_finite(&at("track_temp"), dto.track_temp)?,
            air_temp: optional_finite(&at("air_temp"), dto.air_temp)?,
            humidity: optional_finite(&at("humidity"), dto.humidity)?,
            wind_speed: optional_finite(&at("wind_speed"), dto.wind_speed)?,
            wind_direction: optional_finite(&at("wind_direction"), dto.wind_direction)?,
            rain_state: dto.rain_state,
        },
    })
}

fn qualifying_lap_from_dto(dto: QualifyingLapDto) -> Result<QualifyingLap, ReplayError> {
    let segment: Segment = dto.segment.parse()?;
    let code = dto.driver;

    let frames = dto
        .frames
        .into_iter()
        .enumerate()
        .map(|(index, frame)| {
            let at = |name: &str| format!("qualifying[{code}][{segment}].frames[{index}].{name}");
            Ok(QualifyingFrame {
                t: require_finite(&at("t"), frame.t)?,
                distance: require_finite(&at("dist"), frame.dist)?,
                speed: require_finite(&at("speed"), frame.speed)?,
                gear: frame.gear,
                throttle: require_finite(&at("throttle"), frame.throttle)?,
                brake: require_finite(&at("brake"), frame.brake)?,
                drs: frame.drs,
            })
        })
        .collect::<Result<Vec<_>, ReplayError>>()?;

    let drs_zones = dto
        .drs_zones
        .into_iter()
        .enumerate()
        .map(|(index, zone)| {
            let at = |name: &str| format!("qualifying[{code}][{segment}].drs_zones[{index}].{name}");
            Ok(DrsZone {
                zone_start: require_finite(&at("zone_start"), zone.zone_start)?,
                zone_end: require_finite(&at("zone_end"), zone.zone_end)?,
            })
        })
        .collect::<Result<Vec<_>, ReplayError>>()?;

    Ok(QualifyingLap {
        driver_code: code,
        segment,
        lap_time: optional_finite("qualifying.lap_time", dto.lap_time)?,
        frames,
        drs_zones,
    })
}

/// Normalize whatever date shape the provider emits to YYYY-MM-DD.
fn event_from_dto(dto: EventDto) -> anyhow::Result<Event> {
    let event_date = normalize_date(&dto.event_date)
        .with_context(|| format!("unparsable event_date for round {}", dto.round_number))?;
    Ok(Event {
        round_number: dto.round_number,
        event_name: dto.event_name,
        country: dto.country,
        location: dto.location,
        event_date,
    })
}

fn normalize_date(raw: &str) -> anyhow::Result<String> {
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.format("%Y-%m-%d").to_string());
    }
    let datetime = chrono::DateTime::parse_from_rfc3339(raw)?;
    Ok(datetime.date_naive().format("%Y-%m-%d").to_string())
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn session_info(&self, key: &SessionKey) -> Result<SessionInfo, ReplayError> {
        let dto: SessionInfoDto = self.get_json(&self.session_url(key, "")).await?;
        Ok(SessionInfo {
            event_name: dto.event_name,
            total_laps: dto.total_laps,
        })
    }

    async fn driver_series(&self, key: &SessionKey) -> Result<Vec<DriverSeries>, ReplayError> {
        let dtos: Vec<DriverSeriesDto> = self.get_json(&self.session_url(key, "samples")).await?;
        dtos.into_iter()
            .map(|series| {
                let samples = series
                    .samples
                    .into_iter()
                    .enumerate()
                    .map(|(index, dto)| sample_from_dto(&series.code, index, dto))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DriverSeries {
                    code: series.code,
                    samples,
                })
            })
            .collect()
    }

    async fn weather_series(&self, key: &SessionKey) -> Result<Vec<WeatherSample>, ReplayError> {
        let dtos: Vec<WeatherDto> = self.get_json(&self.session_url(key, "weather")).await?;
        dtos.into_iter()
            .enumerate()
            .map(|(index, dto)| weather_from_dto(index, dto))
            .collect()
    }

    async fn status_events(&self, key: &SessionKey) -> Result<Vec<StatusEvent>, ReplayError> {
        let dtos: Vec<StatusEventDto> = self.get_json(&self.session_url(key, "status")).await?;
        dtos.into_iter()
            .enumerate()
            .map(|(index, dto)| {
                Ok(StatusEvent {
                    time: require_finite(&format!("track_statuses[{index}].t"), dto.t)?,
                    status_code: dto.status,
                })
            })
            .collect()
    }

    async fn driver_colors(
        &self,
        key: &SessionKey,
    ) -> Result<BTreeMap<String, [u8; 3]>, ReplayError> {
        self.get_json(&self.session_url(key, "colors")).await
    }

    async fn fastest_lap_trajectory(
        &self,
        key: &SessionKey,
    ) -> Result<Vec<TrajectoryPoint>, ReplayError> {
        let dtos: Vec<TrajectoryPointDto> =
            self.get_json(&self.session_url(key, "fastest-lap")).await?;
        dtos.into_iter()
            .enumerate()
            .map(|(index, dto)| {
                Ok(TrajectoryPoint {
                    x: require_finite(&format!("fastest_lap[{index}].x"), dto.x)?,
                    y: require_finite(&format!("fastest_lap[{index}].y"), dto.y)?,
                })
            })
            .collect()
    }

    async fn qualifying_laps(&self, key: &SessionKey) -> Result<Vec<QualifyingLap>, ReplayError> {
        let dtos: Vec<QualifyingLapDto> =
            self.get_json(&self.session_url(key, "qualifying")).await?;
        dtos.into_iter().map(qualifying_lap_from_dto).collect()
    }

    async fn event_schedule(&self, year: i32) -> Result<Vec<Event>, ReplayError> {
        let url = format!("{}/api/schedule/{}", self.base_url, year);
        let dtos: Vec<EventDto> = self.get_json(&url).await?;
        Ok(dtos
            .into_iter()
            .map(event_from_dto)
            .collect::<anyhow::Result<Vec<_>>>()?)
    }

    async fn sprint_schedule(&self, year: i32) -> Result<Vec<Event>, ReplayError> {
        let url = format!("{}/api/schedule/{}/sprints", self.base_url, year);
        let dtos: Vec<EventDto> = self.get_json(&url).await?;
        Ok(dtos
            .into_iter()
            .map(event_from_dto)
            .collect::<anyhow::Result<Vec<_>>>()?)
    }
}
