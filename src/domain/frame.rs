// Replay frame models
//
// Wire field names (`t`, `dist`, `rel_dist`, ...) are the contract the
// frontend replays against; the Rust names spell out what they mean.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A synchronized snapshot of every active driver at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Seconds since session start. Strictly increasing within a session.
    #[serde(rename = "t")]
    pub timestamp: f64,
    /// Current lap of the race leader.
    #[serde(rename = "lap")]
    pub leader_lap: u32,
    /// Driver code -> state. BTreeMap keeps serialization deterministic.
    pub drivers: BTreeMap<String, DriverState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    pub x: f64,
    pub y: f64,
    /// Total meters covered since the race start: completed-lap lengths
    /// plus the current in-lap distance. Non-decreasing over time and the
    /// sole ranking key for `race_position`.
    #[serde(rename = "dist")]
    pub cumulative_distance: f64,
    /// Fraction of the current lap completed, in [0, 1).
    #[serde(rename = "rel_dist")]
    pub normalized_distance: f64,
    pub lap: u32,
    #[serde(rename = "tyre")]
    pub tyre_compound: i32,
    /// 1-based rank among drivers present in this frame.
    #[serde(rename = "position")]
    pub race_position: u32,
    pub speed: f64,
    pub gear: i32,
    #[serde(rename = "drs")]
    pub drs_state: i32,
    pub throttle: f64,
    pub brake: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain_state: Option<String>,
}

/// One raw telemetry sample for a driver, as supplied by the provider.
/// Samples are time-aligned across drivers on a shared grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    /// Distance into the current lap, meters. Resets to ~0 at each
    /// start/finish crossing.
    pub lap_distance: f64,
    pub lap: u32,
    pub tyre_compound: i32,
    pub speed: f64,
    pub gear: i32,
    pub drs_state: i32,
    pub throttle: f64,
    pub brake: f64,
}

/// All samples for one driver, ordered by time.
#[derive(Debug, Clone)]
pub struct DriverSeries {
    pub code: String,
    pub samples: Vec<TelemetrySample>,
}

/// A timestamped weather observation.
#[derive(Debug, Clone)]
pub struct WeatherSample {
    pub time: f64,
    pub info: WeatherInfo,
}
