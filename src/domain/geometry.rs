// Track geometry reconstruction from a single reference lap
//
// The fastest lap's GPS trace is treated as the track centerline. The
// trace is smoothed with a wrap-around moving average, then offset
// perpendicular to the local heading by a fixed half-track-width to
// produce the inner and outer boundary polylines.
use crate::domain::track::{TrackBounds, TrackGeometry};
use crate::error::ReplayError;
use simple_moving_average::{SMA, SumTreeSMA};

/// Below this many reference samples the offset boundaries degenerate.
pub const MIN_REFERENCE_SAMPLES: usize = 32;

const SMOOTHING_WINDOW: usize = 9;
const HALF_WINDOW: usize = SMOOTHING_WINDOW / 2;
const HALF_TRACK_WIDTH_M: f64 = 6.5;

/// One (x, y) sample of the reference-lap trajectory, meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub x: f64,
    pub y: f64,
}

/// Derive inner/outer boundaries, display rotation and bounds from one
/// reference-lap trajectory.
pub fn build_track_geometry(reference_lap: &[TrajectoryPoint]) -> Result<TrackGeometry, ReplayError> {
    if reference_lap.len() < MIN_REFERENCE_SAMPLES {
        return Err(ReplayError::InsufficientTelemetry(format!(
            "reference lap has {} samples, need at least {}",
            reference_lap.len(),
            MIN_REFERENCE_SAMPLES
        )));
    }

    let centerline = smooth_closed(reference_lap);
    let n = centerline.len();

    // Interior lies to the left of travel for a counter-clockwise lap.
    let interior_sign = if signed_area(&centerline) >= 0.0 { 1.0 } else { -1.0 };

    let mut inner: Vec<[f64; 2]> = Vec::with_capacity(n + 1);
    let mut outer: Vec<[f64; 2]> = Vec::with_capacity(n + 1);
    let mut last_normal = (0.0f64, 1.0f64);

    for i in 0..n {
        let prev = centerline[(i + n - 1) % n];
        let next = centerline[(i + 1) % n];
        let dx = next.x - prev.x;
        let dy = next.y - prev.y;
        let len = dx.hypot(dy);
        // Duplicate GPS fixes produce a zero heading; carry the previous
        // normal across them.
        let normal = if len > f64::EPSILON {
            (-dy / len, dx / len)
        } else {
            last_normal
        };
        last_normal = normal;

        let point = centerline[i];
        let off_x = normal.0 * HALF_TRACK_WIDTH_M * interior_sign;
        let off_y = normal.1 * HALF_TRACK_WIDTH_M * interior_sign;
        inner.push([point.x + off_x, point.y + off_y]);
        outer.push([point.x - off_x, point.y - off_y]);
    }

    // Close both loops: first and last point coincide.
    inner.push(inner[0]);
    outer.push(outer[0]);

    let bounds = bounds_of(&outer);
    let rotation_degrees = dominant_axis_degrees(&centerline);

    Ok(TrackGeometry {
        inner_boundary: inner,
        outer_boundary: outer,
        rotation_degrees,
        bounds,
    })
}

/// Moving-average smoothing with a window that wraps across the
/// start/finish line, so the loop stays closed and noisy or
/// self-crossing GPS fixes are flattened before offsetting.
fn smooth_closed(points: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
    let n = points.len();
    let mut sma_x = SumTreeSMA::<f64, f64, SMOOTHING_WINDOW>::new();
    let mut sma_y = SumTreeSMA::<f64, f64, SMOOTHING_WINDOW>::new();

    // Prime with the trailing points so the first emitted window already
    // wraps around the start/finish line.
    for point in points.iter().skip(n - (SMOOTHING_WINDOW - 1)) {
        sma_x.add_sample(point.x);
        sma_y.add_sample(point.y);
    }

    let mut smoothed = vec![TrajectoryPoint { x: 0.0, y: 0.0 }; n];
    for (i, point) in points.iter().enumerate() {
        sma_x.add_sample(point.x);
        sma_y.add_sample(point.y);
        // The window now ends at i; its center is HALF_WINDOW back.
        let center = (i + n - HALF_WINDOW) % n;
        smoothed[center] = TrajectoryPoint {
            x: sma_x.get_average(),
            y: sma_y.get_average(),
        };
    }
    smoothed
}

/// Shoelace formula; positive for counter-clockwise winding.
fn signed_area(points: &[TrajectoryPoint]) -> f64 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    area / 2.0
}

/// Angle of the trajectory's dominant axis, from the second moments
/// about the centroid. Rotating the display by this angle lays the
/// track out along the horizontal.
fn dominant_axis_degrees(points: &[TrajectoryPoint]) -> f64 {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for p in points {
        let dx = p.x - cx;
        let dy = p.y - cy;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    (0.5 * (2.0 * sxy).atan2(sxx - syy)).to_degrees()
}

fn bounds_of(boundary: &[[f64; 2]]) -> TrackBounds {
    let mut bounds = TrackBounds {
        x_min: f64::INFINITY,
        x_max: f64::NEG_INFINITY,
        y_min: f64::INFINITY,
        y_max: f64::NEG_INFINITY,
    };
    for [x, y] in boundary {
        bounds.x_min = bounds.x_min.min(*x);
        bounds.x_max = bounds.x_max.max(*x);
        bounds.y_min = bounds.y_min.min(*y);
        bounds.y_max = bounds.y_max.max(*y);
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(samples: usize, radius: f64, clockwise: bool) -> Vec<TrajectoryPoint> {
        (0..samples)
            .map(|i| {
                let mut angle = i as f64 / samples as f64 * std::f64::consts::TAU;
                if clockwise {
                    angle = -angle;
                }
                TrajectoryPoint {
                    x: radius * angle.cos(),
                    y: radius * angle.sin(),
                }
            })
            .collect()
    }

    #[test]
    fn test_too_few_samples_is_insufficient_telemetry() {
        let result = build_track_geometry(&circle(MIN_REFERENCE_SAMPLES - 1, 100.0, false));
        assert!(matches!(result, Err(ReplayError::InsufficientTelemetry(_))));
    }

    #[test]
    fn test_boundaries_are_closed_loops() {
        let geometry = build_track_geometry(&circle(360, 100.0, false)).unwrap();
        assert_eq!(geometry.inner_boundary.first(), geometry.inner_boundary.last());
        assert_eq!(geometry.outer_boundary.first(), geometry.outer_boundary.last());
        assert_eq!(geometry.inner_boundary.len(), 361);
    }

    #[test]
    fn test_boundaries_do_not_cross_on_a_circle() {
        let geometry = build_track_geometry(&circle(360, 100.0, false)).unwrap();
        let max_inner = geometry
            .inner_boundary
            .iter()
            .map(|[x, y]| x.hypot(*y))
            .fold(0.0f64, f64::max);
        let min_outer = geometry
            .outer_boundary
            .iter()
            .map(|[x, y]| x.hypot(*y))
            .fold(f64::INFINITY, f64::min);
        assert!(max_inner < min_outer);
        // Offsets land near radius +/- half width.
        assert!((max_inner - (100.0 - HALF_TRACK_WIDTH_M)).abs() < 1.0);
        assert!((min_outer - (100.0 + HALF_TRACK_WIDTH_M)).abs() < 1.0);
    }

    #[test]
    fn test_inner_is_inside_regardless_of_winding() {
        let geometry = build_track_geometry(&circle(360, 100.0, true)).unwrap();
        let max_inner = geometry
            .inner_boundary
            .iter()
            .map(|[x, y]| x.hypot(*y))
            .fold(0.0f64, f64::max);
        assert!(max_inner < 100.0);
    }

    #[test]
    fn test_bounds_cover_the_outer_boundary() {
        let geometry = build_track_geometry(&circle(360, 100.0, false)).unwrap();
        let bounds = &geometry.bounds;
        assert!(bounds.x_max > 100.0 && bounds.x_max < 107.5);
        assert!(bounds.x_min < -100.0 && bounds.x_min > -107.5);
        assert!(bounds.y_max > 100.0 && bounds.y_min < -100.0);
    }

    #[test]
    fn test_rotation_follows_the_dominant_axis() {
        // Ellipse stretched along the x axis: no rotation needed.
        let flat: Vec<TrajectoryPoint> = (0..360)
            .map(|i| {
                let angle = i as f64 / 360.0 * std::f64::consts::TAU;
                TrajectoryPoint {
                    x: 500.0 * angle.cos(),
                    y: 80.0 * angle.sin(),
                }
            })
            .collect();
        let geometry = build_track_geometry(&flat).unwrap();
        assert!(geometry.rotation_degrees.abs() < 1.0);

        // Same ellipse tilted 45 degrees.
        let tilted: Vec<TrajectoryPoint> = flat
            .iter()
            .map(|p| {
                let c = std::f64::consts::FRAC_PI_4.cos();
                let s = std::f64::consts::FRAC_PI_4.sin();
                TrajectoryPoint {
                    x: p.x * c - p.y * s,
                    y: p.x * s + p.y * c,
                }
            })
            .collect();
        let geometry = build_track_geometry(&tilted).unwrap();
        assert!((geometry.rotation_degrees - 45.0).abs() < 1.0);
    }
}
