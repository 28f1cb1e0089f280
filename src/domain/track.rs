// Track status intervals and track geometry models
use serde::{Deserialize, Serialize};

/// A raw status change reported by the provider: at `time` the track
/// went to `status_code` ('1' green, '2' yellow, '4' safety car, ...).
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub time: f64,
    pub status_code: String,
}

/// A track status in effect over [start_time, end_time). `end_time` is
/// absent for the final interval, which is still open as of the last
/// known frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStatus {
    #[serde(rename = "status")]
    pub status_code: String,
    pub start_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
}

/// Fold raw status change points into contiguous intervals. Consecutive
/// identical codes are merged; each interval ends where the next begins.
pub fn status_intervals(events: &[StatusEvent]) -> Vec<TrackStatus> {
    let mut sorted: Vec<&StatusEvent> = events.iter().collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut intervals: Vec<TrackStatus> = Vec::new();
    for event in sorted {
        match intervals.last_mut() {
            Some(last) if last.status_code == event.status_code => continue,
            Some(last) => last.end_time = Some(event.time),
            None => {}
        }
        intervals.push(TrackStatus {
            status_code: event.status_code.clone(),
            start_time: event.time,
            end_time: None,
        });
    }
    intervals
}

/// Inner/outer boundary polylines plus display rotation for one circuit.
/// Built once per session from the reference lap and cached; immutable
/// after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackGeometry {
    #[serde(rename = "inner")]
    pub inner_boundary: Vec<[f64; 2]>,
    #[serde(rename = "outer")]
    pub outer_boundary: Vec<[f64; 2]>,
    #[serde(rename = "rotation")]
    pub rotation_degrees: f64,
    pub bounds: TrackBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}
