// Frame builder - Per-timestamp aggregation of driver samples
//
// Converts per-driver sample series into synchronized frames: one
// BTreeMap of driver states per grid timestamp, ranked by cumulative
// race distance. Frames come out of a lazy iterator; building is
// idempotent for identical input.
use crate::domain::frame::{DriverSeries, DriverState, Frame, TelemetrySample, WeatherSample};
use crate::domain::progress;
use std::collections::BTreeMap;

// Samples are time-aligned across drivers; this only absorbs float
// round-trip noise in the shared grid.
const TIME_EPS: f64 = 1e-6;

struct DriverTrace {
    code: String,
    samples: Vec<TelemetrySample>,
    cumulative: Vec<f64>,
    lap_lengths: BTreeMap<u32, f64>,
}

pub struct FrameBuilder {
    traces: Vec<DriverTrace>,
    weather: Vec<WeatherSample>,
    grid: Vec<f64>,
}

impl FrameBuilder {
    pub fn new(series: Vec<DriverSeries>, mut weather: Vec<WeatherSample>) -> Self {
        let mut traces: Vec<DriverTrace> = series
            .into_iter()
            .filter(|s| !s.samples.is_empty())
            .map(|mut s| {
                s.samples.sort_by(|a, b| a.time.total_cmp(&b.time));
                let cumulative = progress::cumulative_distances(&s.samples);
                let lap_lengths = progress::lap_lengths(&s.samples);
                DriverTrace {
                    code: s.code,
                    samples: s.samples,
                    cumulative,
                    lap_lengths,
                }
            })
            .collect();
        traces.sort_by(|a, b| a.code.cmp(&b.code));

        weather.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut grid: Vec<f64> = traces
            .iter()
            .flat_map(|t| t.samples.iter().map(|s| s.time))
            .collect();
        grid.sort_by(f64::total_cmp);
        grid.dedup_by(|a, b| (*a - *b).abs() < TIME_EPS);

        Self { traces, weather, grid }
    }

    /// Number of frames this builder will emit.
    pub fn frame_count(&self) -> usize {
        self.grid.len()
    }

    /// Lazy iterator over the frame sequence. Restartable: every call
    /// yields the same frames from the start.
    pub fn iter(&self) -> Frames<'_> {
        Frames {
            builder: self,
            grid_index: 0,
            cursors: vec![0; self.traces.len()],
            weather_cursor: 0,
        }
    }

    /// Materialize the full sequence.
    pub fn build(&self) -> Vec<Frame> {
        self.iter().collect()
    }
}

pub struct Frames<'a> {
    builder: &'a FrameBuilder,
    grid_index: usize,
    cursors: Vec<usize>,
    weather_cursor: usize,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let timestamp = *self.builder.grid.get(self.grid_index)?;
        self.grid_index += 1;

        let mut drivers: BTreeMap<String, DriverState> = BTreeMap::new();
        for (trace, cursor) in self.builder.traces.iter().zip(self.cursors.iter_mut()) {
            while *cursor < trace.samples.len()
                && trace.samples[*cursor].time < timestamp - TIME_EPS
            {
                *cursor += 1;
            }
            // A driver with no sample at this grid point has retired (or
            // not started reporting yet) and is left out of the frame.
            if *cursor >= trace.samples.len()
                || (trace.samples[*cursor].time - timestamp).abs() > TIME_EPS
            {
                continue;
            }

            let sample = &trace.samples[*cursor];
            let lap_length = trace.lap_lengths.get(&sample.lap).copied().unwrap_or(0.0);
            let normalized_distance = if lap_length > 0.0 {
                (sample.lap_distance / lap_length).clamp(0.0, 1.0 - f64::EPSILON)
            } else {
                0.0
            };

            drivers.insert(
                trace.code.clone(),
                DriverState {
                    x: sample.x,
                    y: sample.y,
                    cumulative_distance: trace.cumulative[*cursor],
                    normalized_distance,
                    lap: sample.lap,
                    tyre_compound: sample.tyre_compound,
                    race_position: 0,
                    speed: sample.speed,
                    gear: sample.gear,
                    drs_state: sample.drs_state,
                    throttle: sample.throttle,
                    brake: sample.brake,
                },
            );
        }

        progress::assign_race_positions(&mut drivers);
        let leader_lap = drivers
            .values()
            .find(|d| d.race_position == 1)
            .map(|d| d.lap)
            .unwrap_or(0);

        while self.weather_cursor < self.builder.weather.len()
            && self.builder.weather[self.weather_cursor].time <= timestamp
        {
            self.weather_cursor += 1;
        }
        let weather = self
            .weather_cursor
            .checked_sub(1)
            .map(|i| self.builder.weather[i].info.clone());

        Some(Frame {
            timestamp,
            leader_lap,
            drivers,
            weather,
        })
    }
}
