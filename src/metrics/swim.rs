//! Swim interval segmentation and critical swim speed

use serde::{Deserialize, Serialize};

use super::sample_dt;
use crate::streams::StreamRecord;

/// Below this the swimmer is resting on the wall
const MOVING_VELOCITY: f64 = 0.3;
const MIN_INTERVAL_SECONDS: f64 = 20.0;
const CSS_MIN_INTERVAL_METERS: f64 = 100.0;
const CSS_FASTEST_INTERVALS: usize = 3;
const CSS_MIN_INTERVALS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimInterval {
  pub start_seconds: f64,
  pub duration_seconds: f64,
  pub distance_meters: f64,
  pub pace_sec_per_100m: f64,
  /// Rest before the next interval starts; `None` for the last one
  pub rest_after_seconds: Option<f64>,
}

/// Split a swim into moving intervals separated by rest.
///
/// A sample is moving when its velocity exceeds 0.3 m/s. Runs of moving
/// samples lasting 20 s or less are drills or push-offs and are dropped.
/// Distance comes from the distance channel when recorded, otherwise from
/// integrating velocity.
pub fn detect_intervals(stream: &StreamRecord) -> Vec<SwimInterval> {
  let velocity = stream.velocity_or_derived();
  let n = stream.len().min(velocity.len());
  if n < 2 {
    return Vec::new();
  }

  let mut runs: Vec<(usize, usize)> = Vec::new();
  let mut run_start: Option<usize> = None;

  for i in 0..n {
    let moving = velocity[i] > MOVING_VELOCITY;
    let contiguous = i > 0 && sample_dt(&stream.time, i).is_some();

    match (run_start, moving) {
      (Some(start), true) if !contiguous => {
        runs.push((start, i - 1));
        run_start = Some(i);
      }
      (Some(start), false) => {
        runs.push((start, i - 1));
        run_start = None;
      }
      (None, true) => run_start = Some(i),
      _ => {}
    }
  }
  if let Some(start) = run_start {
    runs.push((start, n - 1));
  }

  let mut intervals: Vec<SwimInterval> = Vec::new();
  let mut last_end: Option<usize> = None;

  for (start, end) in runs {
    let duration = stream.time[end] - stream.time[start];
    if duration <= MIN_INTERVAL_SECONDS {
      continue;
    }

    let distance = run_distance(stream, &velocity, start, end);
    if distance <= 0.0 {
      continue;
    }

    if let (Some(previous), Some(prev_end)) = (intervals.last_mut(), last_end) {
      previous.rest_after_seconds = Some(stream.time[start] - stream.time[prev_end]);
    }

    intervals.push(SwimInterval {
      start_seconds: stream.time[start],
      duration_seconds: duration,
      distance_meters: distance,
      pace_sec_per_100m: duration / (distance / 100.0),
      rest_after_seconds: None,
    });
    last_end = Some(end);
  }

  intervals
}

fn run_distance(stream: &StreamRecord, velocity: &[f64], start: usize, end: usize) -> f64 {
  if stream.has_distance_data() {
    return stream.distance[end] - stream.distance[start];
  }

  ((start + 1)..=end)
    .filter_map(|i| sample_dt(&stream.time, i).map(|dt| velocity[i] * dt))
    .sum()
}

/// Critical swim speed in sec/100m: mean pace of the (up to) three fastest
/// intervals of at least 100 m. Needs two qualifying intervals.
pub fn estimate_css(intervals: &[SwimInterval]) -> Option<f64> {
  let mut paces: Vec<f64> = intervals
    .iter()
    .filter(|i| i.distance_meters >= CSS_MIN_INTERVAL_METERS)
    .map(|i| i.pace_sec_per_100m)
    .collect();
  if paces.len() < CSS_MIN_INTERVALS {
    return None;
  }

  paces.sort_by(|a, b| a.total_cmp(b));
  let fastest = &paces[..paces.len().min(CSS_FASTEST_INTERVALS)];
  Some(fastest.iter().sum::<f64>() / fastest.len() as f64)
}

/// Pace across all swimming time, rest excluded
pub fn average_interval_pace(intervals: &[SwimInterval]) -> Option<f64> {
  let seconds: f64 = intervals.iter().map(|i| i.duration_seconds).sum();
  let meters: f64 = intervals.iter().map(|i| i.distance_meters).sum();
  (meters > 0.0).then(|| seconds / (meters / 100.0))
}
