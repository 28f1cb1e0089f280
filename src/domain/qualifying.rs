// Qualifying session models and ranking
use crate::error::ReplayError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Qualifying segment. Parsed case-insensitively from the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Segment {
    Q1,
    Q2,
    Q3,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Q1, Segment::Q2, Segment::Q3];
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Q1 => write!(f, "Q1"),
            Segment::Q2 => write!(f, "Q2"),
            Segment::Q3 => write!(f, "Q3"),
        }
    }
}

impl FromStr for Segment {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "Q1" => Ok(Segment::Q1),
            "Q2" => Ok(Segment::Q2),
            "Q3" => Ok(Segment::Q3),
            other => Err(ReplayError::not_found(format!(
                "unknown qualifying segment `{other}`"
            ))),
        }
    }
}

/// One driver's best lap in one segment, as supplied by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifyingLap {
    pub driver_code: String,
    pub segment: Segment,
    /// Lap time in seconds; absent when the driver set no time.
    pub lap_time: Option<f64>,
    pub frames: Vec<QualifyingFrame>,
    pub drs_zones: Vec<DrsZone>,
}

/// One sample along a qualifying lap, keyed by distance for the speed
/// trace view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingFrame {
    pub t: f64,
    #[serde(rename = "dist")]
    pub distance: f64,
    pub speed: f64,
    pub gear: i32,
    pub throttle: f64,
    pub brake: f64,
    pub drs: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrsZone {
    pub zone_start: f64,
    pub zone_end: f64,
}

/// One row of the ranked qualifying classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualifyingResult {
    pub pos: u32,
    pub code: String,
    pub color: [u8; 3],
    #[serde(rename = "Q1", default, skip_serializing_if = "Option::is_none")]
    pub q1: Option<f64>,
    #[serde(rename = "Q2", default, skip_serializing_if = "Option::is_none")]
    pub q2: Option<f64>,
    #[serde(rename = "Q3", default, skip_serializing_if = "Option::is_none")]
    pub q3: Option<f64>,
    /// Best time formatted `m:ss.mmm`, or "No Time".
    pub time: String,
}

/// Rank drivers by their deepest segment: everyone with a Q3 time comes
/// first ordered by it, then Q2-only drivers, then Q1-only, then
/// drivers without a time (by code, so the order is deterministic).
pub fn rank_results(
    laps: &[QualifyingLap],
    colors: &BTreeMap<String, [u8; 3]>,
) -> Vec<QualifyingResult> {
    let mut best: BTreeMap<String, BTreeMap<Segment, f64>> = BTreeMap::new();
    for lap in laps {
        if let Some(time) = lap.lap_time {
            let per_segment = best.entry(lap.driver_code.clone()).or_default();
            let slot = per_segment.entry(lap.segment).or_insert(time);
            if time < *slot {
                *slot = time;
            }
        }
    }
    // Drivers that appear only with timeless laps still classify last.
    for lap in laps {
        best.entry(lap.driver_code.clone()).or_default();
    }

    let mut rows: Vec<(String, Option<f64>, Option<f64>, Option<f64>)> = best
        .into_iter()
        .map(|(code, times)| {
            (
                code,
                times.get(&Segment::Q1).copied(),
                times.get(&Segment::Q2).copied(),
                times.get(&Segment::Q3).copied(),
            )
        })
        .collect();

    rows.sort_by(|a, b| sort_rank(a).total_cmp(&sort_rank(b)).then_with(|| a.0.cmp(&b.0)));

    rows.into_iter()
        .enumerate()
        .map(|(index, (code, q1, q2, q3))| {
            let best_time = q3.or(q2).or(q1);
            QualifyingResult {
                pos: index as u32 + 1,
                color: colors.get(&code).copied().unwrap_or([128, 128, 128]),
                code,
                q1,
                q2,
                q3,
                time: best_time.map(format_lap_time).unwrap_or_else(|| "No Time".to_string()),
            }
        })
        .collect()
}

// Deeper segments always outrank shallower ones; the large stride keeps
// a slow Q3 time ahead of the fastest Q2 time.
fn sort_rank(row: &(String, Option<f64>, Option<f64>, Option<f64>)) -> f64 {
    const STRIDE: f64 = 100_000.0;
    let (_, q1, q2, q3) = row;
    if let Some(t) = q3 {
        *t
    } else if let Some(t) = q2 {
        STRIDE + *t
    } else if let Some(t) = q1 {
        2.0 * STRIDE + *t
    } else {
        3.0 * STRIDE
    }
}

/// Format a lap time in seconds as `m:ss.mmm`.
pub fn format_lap_time(seconds: f64) -> String {
    let total_millis = (seconds * 1000.0).round() as u64;
    let minutes = total_millis / 60_000;
    let rest = total_millis % 60_000;
    format!("{}:{:02}.{:03}", minutes, rest / 1000, rest % 1000)
}
