// Race-progress ordering
//
// The ranking key is cumulative race distance, never the raw in-lap
// distance: a driver 40m into lap 2 is ahead of a driver 4980m into
// lap 1. Sorting by in-lap distance misorders drivers who have
// completed different numbers of laps.
use crate::domain::frame::{DriverState, TelemetrySample};
use std::collections::BTreeMap;

/// Per-lap lengths for one driver, derived from the samples themselves:
/// the length of lap N is the largest in-lap distance observed on lap N.
pub fn lap_lengths(samples: &[TelemetrySample]) -> BTreeMap<u32, f64> {
    let mut lengths: BTreeMap<u32, f64> = BTreeMap::new();
    for sample in samples {
        let entry = lengths.entry(sample.lap).or_insert(0.0);
        if sample.lap_distance > *entry {
            *entry = sample.lap_distance;
        }
    }
    lengths
}

/// Cumulative race distance for every sample of one driver: the sum of
/// that driver's completed-lap lengths plus the current in-lap distance.
///
/// The completed-lap sum is folded in from the first sample of the new
/// lap, so a driver crossing the line never momentarily ranks below
/// slower cars still finishing the previous lap. The series is clamped
/// to be non-decreasing so sample noise cannot move a driver backwards.
pub fn cumulative_distances(samples: &[TelemetrySample]) -> Vec<f64> {
    let lengths = lap_lengths(samples);
    let mut completed_before: BTreeMap<u32, f64> = BTreeMap::new();
    let mut sum = 0.0;
    for (lap, length) in &lengths {
        completed_before.insert(*lap, sum);
        sum += length;
    }

    let mut out = Vec::with_capacity(samples.len());
    let mut high_water = 0.0f64;
    for sample in samples {
        let base = completed_before.get(&sample.lap).copied().unwrap_or(0.0);
        let total = base + sample.lap_distance.max(0.0);
        high_water = high_water.max(total);
        out.push(high_water);
    }
    out
}

/// Assign 1-based race positions to every driver in a frame, ordered by
/// descending cumulative distance. Ties break on driver code ascending
/// so the ordering is deterministic.
pub fn assign_race_positions(drivers: &mut BTreeMap<String, DriverState>) {
    let mut order: Vec<(String, f64)> = drivers
        .iter()
        .map(|(code, state)| (code.clone(), state.cumulative_distance))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    for (rank, (code, _)) in order.into_iter().enumerate() {
        if let Some(state) = drivers.get_mut(&code) {
            state.race_position = rank as u32 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, lap: u32, lap_distance: f64) -> TelemetrySample {
        TelemetrySample {
            time,
            x: 0.0,
            y: 0.0,
            lap_distance,
            lap,
            tyre_compound: 1,
            speed: 200.0,
            gear: 5,
            drs_state: 0,
            throttle: 0.9,
            brake: 0.0,
        }
    }

    fn state(cumulative: f64) -> DriverState {
        DriverState {
            x: 0.0,
            y: 0.0,
            cumulative_distance: cumulative,
            normalized_distance: 0.0,
            lap: 1,
            tyre_compound: 1,
            race_position: 0,
            speed: 0.0,
            gear: 0,
            drs_state: 0,
            throttle: 0.0,
            brake: 0.0,
        }
    }

    #[test]
    fn test_lap_lengths_take_max_in_lap_distance() {
        let samples = vec![
            sample(0.0, 1, 100.0),
            sample(1.0, 1, 4990.0),
            sample(2.0, 2, 30.0),
            sample(3.0, 2, 60.0),
        ];
        let lengths = lap_lengths(&samples);
        assert_eq!(lengths[&1], 4990.0);
        assert_eq!(lengths[&2], 60.0);
    }

    #[test]
    fn test_cumulative_includes_completed_laps_at_transition() {
        let samples = vec![
            sample(0.0, 1, 4980.0),
            sample(1.0, 1, 5000.0),
            // Line crossing: in-lap distance re-zeroes but cumulative
            // already carries the full 5000m of lap 1.
            sample(2.0, 2, 10.0),
        ];
        let cumulative = cumulative_distances(&samples);
        assert_eq!(cumulative, vec![4980.0, 5000.0, 5010.0]);
    }

    #[test]
    fn test_cumulative_never_decreases_on_noisy_input() {
        let samples = vec![
            sample(0.0, 1, 120.0),
            sample(1.0, 1, 110.0), // GPS jitter
            sample(2.0, 1, 130.0),
        ];
        let cumulative = cumulative_distances(&samples);
        assert!(cumulative.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_positions_rank_by_cumulative_not_in_lap_distance() {
        // A is 40m into lap 2 (5040m total), B is 4980m into lap 1.
        let mut drivers = BTreeMap::new();
        drivers.insert("ALO".to_string(), state(5040.0));
        drivers.insert("BOT".to_string(), state(4980.0));
        assign_race_positions(&mut drivers);
        assert_eq!(drivers["ALO"].race_position, 1);
        assert_eq!(drivers["BOT"].race_position, 2);
    }

    #[test]
    fn test_positions_are_a_permutation_with_stable_tiebreak() {
        let mut drivers = BTreeMap::new();
        drivers.insert("VER".to_string(), state(1000.0));
        drivers.insert("HAM".to_string(), state(1000.0));
        drivers.insert("LEC".to_string(), state(900.0));
        assign_race_positions(&mut drivers);

        let mut positions: Vec<u32> = drivers.values().map(|d| d.race_position).collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![1, 2, 3]);
        // Equal distance: code ascending wins the tie.
        assert_eq!(drivers["HAM"].race_position, 1);
        assert_eq!(drivers["VER"].race_position, 2);
    }
}
