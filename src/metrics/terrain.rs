//! Distance and terrain metrics: per-km splits, cadence, elevation

use serde::{Deserialize, Serialize};

use crate::streams::{positive_mean, StreamRecord};

const SPLIT_METERS: f64 = 1000.0;
const MIN_CADENCE_SAMPLES: usize = 10;
const ELEVATION_SMOOTHING_WINDOW: usize = 5;
const ELEVATION_NOISE_METERS: f64 = 1.0;

/// ---------------------------------------------------------------------------
/// Splits
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
  /// 1-based kilometer number
  pub km: u32,
  pub elapsed_seconds: f64,
  pub pace_sec_per_km: f64,
  pub average_hr: Option<f64>,
  pub elevation_change_meters: Option<f64>,
}

/// Close a split every time cumulative distance crosses a whole kilometer.
/// A trailing partial kilometer is not reported.
pub fn splits(stream: &StreamRecord) -> Vec<Split> {
  let n = stream.len();
  if n < 2 || !stream.has_distance_data() {
    return Vec::new();
  }

  let distance = &stream.distance;
  let mut result = Vec::new();
  let mut start = 0;
  let mut next_boundary = next_kilometer(distance[0]);

  for i in 1..n {
    if distance[i] < next_boundary {
      continue;
    }

    let elapsed = stream.time[i] - stream.time[start];
    let covered = distance[i] - distance[start];
    if elapsed > 0.0 && covered > 0.0 {
      result.push(Split {
        km: result.len() as u32 + 1,
        elapsed_seconds: elapsed,
        pace_sec_per_km: elapsed / (covered / SPLIT_METERS),
        average_hr: stream
          .heartrate
          .get(start..=i)
          .and_then(positive_mean),
        elevation_change_meters: stream
          .has_altitude_data()
          .then(|| stream.altitude[i] - stream.altitude[start]),
      });
    }

    start = i;
    next_boundary = next_kilometer(distance[i]);
  }

  result
}

fn next_kilometer(distance: f64) -> f64 {
  ((distance / SPLIT_METERS).floor() + 1.0) * SPLIT_METERS
}

/// ---------------------------------------------------------------------------
/// Cadence
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CadenceStats {
  pub average: f64,
  /// Coefficient of variation, stddev / mean x 100
  pub cv_pct: f64,
}

pub fn cadence_stats(cadence: &[f64]) -> Option<CadenceStats> {
  let valid: Vec<f64> = cadence.iter().copied().filter(|c| *c > 0.0).collect();
  if valid.len() < MIN_CADENCE_SAMPLES {
    return None;
  }

  let count = valid.len() as f64;
  let average = valid.iter().sum::<f64>() / count;
  let variance = valid.iter().map(|c| (c - average).powi(2)).sum::<f64>() / count;

  Some(CadenceStats {
    average,
    cv_pct: variance.sqrt() / average * 100.0,
  })
}

/// ---------------------------------------------------------------------------
/// Elevation
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationStats {
  pub ascent_meters: f64,
  pub descent_meters: f64,
}

/// Total ascent and descent after smoothing barometric/GPS noise.
///
/// Altitude is passed through a centred 5-point moving average. A change is
/// only counted once the smoothed value moves more than 1 m away from the
/// last counted point.
pub fn elevation(altitude: &[f64]) -> Option<ElevationStats> {
  if altitude.len() < 2 {
    return None;
  }

  let smoothed = moving_average(altitude, ELEVATION_SMOOTHING_WINDOW);
  let mut reference = smoothed[0];
  let mut stats = ElevationStats {
    ascent_meters: 0.0,
    descent_meters: 0.0,
  };

  for &value in &smoothed[1..] {
    let delta = value - reference;
    if delta > ELEVATION_NOISE_METERS {
      stats.ascent_meters += delta;
      reference = value;
    } else if delta < -ELEVATION_NOISE_METERS {
      stats.descent_meters -= delta;
      reference = value;
    }
  }

  Some(stats)
}

/// Centred moving average; the window shrinks at the edges
fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
  let half = window / 2;
  (0..values.len())
    .map(|i| {
      let lo = i.saturating_sub(half);
      let hi = (i + half + 1).min(values.len());
      values[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::run_stream;

  #[test]
  fn test_splits_every_kilometer() {
    // 3 m/s for 25 minutes = 4.5 km
    let stream = run_stream(1500, 3.0, 150.0, Some(10.0));
    let result = splits(&stream);

    assert_eq!(result.len(), 4);
    assert_eq!(result[0].km, 1);
    assert!((result[0].pace_sec_per_km - 333.333).abs() < 0.5);
    assert_eq!(result[0].average_hr, Some(150.0));
    assert_eq!(result[0].elevation_change_meters, Some(0.0));
  }

  #[test]
  fn test_splits_without_distance() {
    let mut stream = run_stream(600, 3.0, 150.0, None);
    stream.distance.clear();
    assert!(splits(&stream).is_empty());
  }

  #[test]
  fn test_splits_track_climb() {
    let mut stream = run_stream(700, 3.0, 0.0, Some(0.0));
    stream.altitude = stream.distance.iter().map(|d| d * 0.05).collect();
    let result = splits(&stream);

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].average_hr, None);
    assert!(result[0].elevation_change_meters.unwrap() > 49.0);
  }

  #[test]
  fn test_cadence_stats() {
    let cadence: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 170.0 } else { 180.0 }).collect();
    let stats = cadence_stats(&cadence).unwrap();
    assert!((stats.average - 175.0).abs() < 1e-9);
    assert!((stats.cv_pct - 5.0 / 175.0 * 100.0).abs() < 1e-9);
  }

  #[test]
  fn test_cadence_ignores_zeros_and_needs_samples() {
    let mut cadence = vec![0.0; 50];
    cadence.extend([90.0; 9]);
    assert_eq!(cadence_stats(&cadence), None);

    cadence.push(90.0);
    let stats = cadence_stats(&cadence).unwrap();
    assert_eq!(stats.average, 90.0);
    assert_eq!(stats.cv_pct, 0.0);
  }

  #[test]
  fn test_elevation_steady_climb() {
    let altitude: Vec<f64> = (0..=1000).map(|i| i as f64 * 0.1).collect();
    let stats = elevation(&altitude).unwrap();
    assert!(stats.ascent_meters > 98.0 && stats.ascent_meters < 100.1);
    assert_eq!(stats.descent_meters, 0.0);
  }

  #[test]
  fn test_elevation_ignores_noise() {
    let altitude: Vec<f64> = (0..500).map(|i| if i % 2 == 0 { 50.4 } else { 49.6 }).collect();
    let stats = elevation(&altitude).unwrap();
    assert_eq!(stats.ascent_meters, 0.0);
    assert_eq!(stats.descent_meters, 0.0);
  }

  #[test]
  fn test_elevation_out_and_back() {
    let mut altitude: Vec<f64> = (0..=500).map(|i| i as f64 * 0.2).collect();
    altitude.extend((0..=500).rev().map(|i| i as f64 * 0.2));
    let stats = elevation(&altitude).unwrap();
    assert!((stats.ascent_meters - stats.descent_meters).abs() < 2.0);
    assert!(stats.ascent_meters > 95.0);
  }
}
