// Provider trait for session data access
//
// The external telemetry provider is a black box behind this trait: it
// owns GPS interpolation, lap timing and schedule data. This service
// only aggregates and serves what it returns.
use crate::domain::event::Event;
use crate::domain::frame::{DriverSeries, WeatherSample};
use crate::domain::geometry::TrajectoryPoint;
use crate::domain::qualifying::QualifyingLap;
use crate::domain::session::{SessionInfo, SessionKey};
use crate::domain::track::StatusEvent;
use crate::error::ReplayError;
use async_trait::async_trait;
use std::collections::BTreeMap;

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Session metadata: event name and total lap count.
    async fn session_info(&self, key: &SessionKey) -> Result<SessionInfo, ReplayError>;

    /// Per-driver telemetry samples, time-aligned across drivers.
    async fn driver_series(&self, key: &SessionKey) -> Result<Vec<DriverSeries>, ReplayError>;

    /// Timestamped weather observations for the session.
    async fn weather_series(&self, key: &SessionKey) -> Result<Vec<WeatherSample>, ReplayError>;

    /// Raw track status change points.
    async fn status_events(&self, key: &SessionKey) -> Result<Vec<StatusEvent>, ReplayError>;

    /// Display color per driver code.
    async fn driver_colors(&self, key: &SessionKey)
    -> Result<BTreeMap<String, [u8; 3]>, ReplayError>;

    /// The fastest lap's (x, y) trajectory, basis for track geometry.
    async fn fastest_lap_trajectory(
        &self,
        key: &SessionKey,
    ) -> Result<Vec<TrajectoryPoint>, ReplayError>;

    /// Best laps per driver and segment for a qualifying session.
    async fn qualifying_laps(&self, key: &SessionKey) -> Result<Vec<QualifyingLap>, ReplayError>;

    /// All race weekends in a season.
    async fn event_schedule(&self, year: i32) -> Result<Vec<Event>, ReplayError>;

    /// Only the weekends with a sprint race.
    async fn sprint_schedule(&self, year: i32) -> Result<Vec<Event>, ReplayError>;
}
