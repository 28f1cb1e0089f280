// Ordering sanity checks over a built frame sequence
//
// Replaces the one-off pickle inspection scripts: the same checks they
// ran by hand, as pure functions over any frame slice. The replay
// service runs them after every rebuild and logs what it finds.
use crate::domain::frame::Frame;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum OrderingAnomaly {
    /// `race_position` disagrees with the descending-cumulative-distance
    /// ranking (the in-lap-distance sort bug shows up as this).
    PositionMismatch {
        frame_index: usize,
        timestamp: f64,
        driver: String,
        expected: u32,
        actual: u32,
    },
    /// A driver's cumulative distance went backwards between frames.
    ProgressRegression {
        frame_index: usize,
        timestamp: f64,
        driver: String,
        previous: f64,
        current: f64,
    },
    /// Positions in a frame are not a permutation of 1..=N.
    NotAPermutation { frame_index: usize, timestamp: f64 },
}

impl fmt::Display for OrderingAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingAnomaly::PositionMismatch {
                frame_index,
                timestamp,
                driver,
                expected,
                actual,
            } => write!(
                f,
                "frame {frame_index} (t={timestamp:.1}s): {driver} holds P{actual} but ranks P{expected} by cumulative distance"
            ),
            OrderingAnomaly::ProgressRegression {
                frame_index,
                timestamp,
                driver,
                previous,
                current,
            } => write!(
                f,
                "frame {frame_index} (t={timestamp:.1}s): {driver} cumulative distance fell from {previous:.1}m to {current:.1}m"
            ),
            OrderingAnomaly::NotAPermutation { frame_index, timestamp } => write!(
                f,
                "frame {frame_index} (t={timestamp:.1}s): positions are not a permutation of 1..=N"
            ),
        }
    }
}

/// Scan a frame sequence for ordering anomalies.
pub fn find_ordering_anomalies(frames: &[Frame]) -> Vec<OrderingAnomaly> {
    let mut anomalies = Vec::new();
    let mut last_distance: BTreeMap<String, f64> = BTreeMap::new();

    for (frame_index, frame) in frames.iter().enumerate() {
        let mut positions: Vec<u32> = frame.drivers.values().map(|d| d.race_position).collect();
        positions.sort_unstable();
        let is_permutation = positions
            .iter()
            .enumerate()
            .all(|(i, p)| *p == i as u32 + 1);
        if !is_permutation {
            anomalies.push(OrderingAnomaly::NotAPermutation {
                frame_index,
                timestamp: frame.timestamp,
            });
        }

        // Expected order: descending cumulative distance, code tiebreak.
        let mut expected: Vec<(&String, f64)> = frame
            .drivers
            .iter()
            .map(|(code, state)| (code, state.cumulative_distance))
            .collect();
        expected.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        for (rank, (code, _)) in expected.iter().enumerate() {
            let actual = frame.drivers[*code].race_position;
            let expected_position = rank as u32 + 1;
            if actual != expected_position {
                anomalies.push(OrderingAnomaly::PositionMismatch {
                    frame_index,
                    timestamp: frame.timestamp,
                    driver: (*code).clone(),
                    expected: expected_position,
                    actual,
                });
            }
        }

        for (code, state) in &frame.drivers {
            if let Some(previous) = last_distance.get(code) {
                if state.cumulative_distance < *previous {
                    anomalies.push(OrderingAnomaly::ProgressRegression {
                        frame_index,
                        timestamp: frame.timestamp,
                        driver: code.clone(),
                        previous: *previous,
                        current: state.cumulative_distance,
                    });
                }
            }
            last_distance.insert(code.clone(), state.cumulative_distance);
        }
    }
    anomalies
}
