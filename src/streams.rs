//! Activity stream normalisation
//!
//! Reshapes raw per-channel sample arrays (as delivered by a wearable API)
//! into one index-aligned `StreamRecord`. Every recognised channel is present
//! in the output, empty when the source did not supply it.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::warn;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StreamError {
  #[error("Stream is unusable: time channel is empty")]
  Unusable,

  #[error("Failed to parse streams: {0}")]
  Parse(#[from] serde_json::Error),
}

impl Serialize for StreamError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Channels
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
  Time,
  Distance,
  HeartRate,
  Velocity,
  Altitude,
  Power,
  Cadence,
}

impl Channel {
  /// Map a provider channel key onto a channel. Accepts both our own names
  /// and Strava's stream keys.
  pub fn from_key(key: &str) -> Option<Self> {
    match key {
      "time" => Some(Channel::Time),
      "distance" => Some(Channel::Distance),
      "heartrate" | "heart_rate" => Some(Channel::HeartRate),
      "velocity" | "velocity_smooth" => Some(Channel::Velocity),
      "altitude" => Some(Channel::Altitude),
      "power" | "watts" => Some(Channel::Power),
      "cadence" => Some(Channel::Cadence),
      _ => None,
    }
  }
}

/// Strava `key_by_type=true` stream entry
#[derive(Debug, Clone, Deserialize)]
struct KeyedStream {
  data: Vec<serde_json::Value>,
}

/// ---------------------------------------------------------------------------
/// Stream Record
/// ---------------------------------------------------------------------------

/// Canonical per-activity time series.
///
/// All non-empty channels have the same length as `time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
  /// Seconds from activity start
  pub time: Vec<f64>,
  /// Cumulative distance in meters
  #[serde(default)]
  pub distance: Vec<f64>,
  /// Beats per minute
  #[serde(default)]
  pub heartrate: Vec<f64>,
  /// Meters per second
  #[serde(default)]
  pub velocity: Vec<f64>,
  /// Meters above sea level
  #[serde(default)]
  pub altitude: Vec<f64>,
  /// Watts
  #[serde(default)]
  pub power: Vec<f64>,
  /// rpm (bike) or spm (run)
  #[serde(default)]
  pub cadence: Vec<f64>,
}

impl StreamRecord {
  /// Build a record from raw channel arrays keyed by channel name.
  ///
  /// Unknown keys are ignored. Channels longer than `time` are truncated.
  /// Shorter sample channels are zero-padded (zero is an invalid sample for
  /// every calculator); distance and altitude are padded with their last
  /// value so padding never shows up as movement or climbing.
  pub fn normalize(raw: &HashMap<String, Vec<f64>>) -> Result<Self, StreamError> {
    let mut by_channel: HashMap<Channel, &Vec<f64>> = HashMap::new();
    for (key, values) in raw {
      match Channel::from_key(key) {
        Some(channel) => {
          by_channel.entry(channel).or_insert(values);
        }
        None => tracing::debug!(key = %key, "Ignoring unrecognised stream channel"),
      }
    }

    let time = by_channel
      .get(&Channel::Time)
      .map(|v| v.to_vec())
      .unwrap_or_default();
    if time.is_empty() {
      return Err(StreamError::Unusable);
    }

    let n = time.len();
    let aligned = |channel: Channel| -> Vec<f64> {
      let Some(values) = by_channel.get(&channel) else {
        return Vec::new();
      };
      align_channel(channel, values, n)
    };

    Ok(Self {
      distance: aligned(Channel::Distance),
      heartrate: aligned(Channel::HeartRate),
      velocity: aligned(Channel::Velocity),
      altitude: aligned(Channel::Altitude),
      power: aligned(Channel::Power),
      cadence: aligned(Channel::Cadence),
      time,
    })
  }

  /// Parse a Strava streams payload requested with `key_by_type=true`:
  /// `{"time": {"data": [...]}, "heartrate": {"data": [...]}, ...}`.
  /// Null or non-numeric entries become 0.
  pub fn from_strava_json(json: &str) -> Result<Self, StreamError> {
    let keyed: HashMap<String, KeyedStream> = serde_json::from_str(json)?;
    let raw: HashMap<String, Vec<f64>> = keyed
      .into_iter()
      .map(|(key, stream)| {
        let values = stream
          .data
          .iter()
          .map(|v| v.as_f64().unwrap_or(0.0))
          .collect();
        (key, values)
      })
      .collect();
    Self::normalize(&raw)
  }

  pub fn len(&self) -> usize {
    self.time.len()
  }

  pub fn is_empty(&self) -> bool {
    self.time.is_empty()
  }

  /// Seconds between first and last sample
  pub fn duration_seconds(&self) -> f64 {
    match (self.time.first(), self.time.last()) {
      (Some(first), Some(last)) if last > first => last - first,
      _ => 0.0,
    }
  }

  pub fn has_heart_rate_data(&self) -> bool {
    self.heartrate.iter().any(|&hr| hr > 0.0)
  }

  pub fn has_power_data(&self) -> bool {
    self.power.iter().any(|&w| w > 0.0)
  }

  /// Zero is a valid altitude, so any samples count
  pub fn has_altitude_data(&self) -> bool {
    !self.altitude.is_empty()
  }

  pub fn has_cadence_data(&self) -> bool {
    self.cadence.iter().any(|&c| c > 0.0)
  }

  pub fn has_distance_data(&self) -> bool {
    self.distance.iter().any(|&d| d > 0.0)
  }

  pub fn has_velocity_data(&self) -> bool {
    self.velocity.iter().any(|&v| v > 0.0)
  }

  /// Velocity channel, or one derived from distance deltas when the device
  /// recorded distance only. Empty when neither is available.
  pub fn velocity_or_derived(&self) -> Cow<'_, [f64]> {
    if self.has_velocity_data() || !self.has_distance_data() {
      return Cow::Borrowed(&self.velocity);
    }

    let mut derived = vec![0.0; self.len()];
    for i in 1..self.len() {
      let dt = self.time[i] - self.time[i - 1];
      let dd = self.distance[i] - self.distance[i - 1];
      if dt > 0.0 && dd > 0.0 {
        derived[i] = dd / dt;
      }
    }
    Cow::Owned(derived)
  }

  /// Mean of positive heart-rate samples
  pub fn average_heart_rate(&self) -> Option<f64> {
    positive_mean(&self.heartrate)
  }

  /// Mean power over all samples (zeros included: coasting is real output)
  pub fn average_power(&self) -> Option<f64> {
    if !self.has_power_data() {
      return None;
    }
    let valid: Vec<f64> = self.power.iter().copied().filter(|w| *w >= 0.0).collect();
    Some(valid.iter().sum::<f64>() / valid.len() as f64)
  }

  /// Net distance covered in meters
  pub fn total_distance(&self) -> f64 {
    let max = self.distance.iter().copied().fold(0.0, f64::max);
    let first = self.distance.first().copied().unwrap_or(0.0);
    (max - first).max(0.0)
  }
}

fn align_channel(channel: Channel, values: &[f64], n: usize) -> Vec<f64> {
  if values.is_empty() {
    return Vec::new();
  }

  if values.len() != n {
    warn!(
      channel = ?channel,
      samples = values.len(),
      expected = n,
      "Stream channel length does not match time channel"
    );
  }

  let mut out: Vec<f64> = values.iter().take(n).copied().collect();
  let pad = match channel {
    Channel::Distance | Channel::Altitude => out.last().copied().unwrap_or(0.0),
    _ => 0.0,
  };
  out.resize(n, pad);
  out
}

pub(crate) fn positive_mean(values: &[f64]) -> Option<f64> {
  let (sum, count) = values
    .iter()
    .filter(|v| **v > 0.0)
    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
  (count > 0).then(|| sum / count as f64)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(channels: &[(&str, Vec<f64>)]) -> HashMap<String, Vec<f64>> {
    channels
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn test_empty_time_is_unusable() {
    let result = StreamRecord::normalize(&raw(&[("heartrate", vec![140.0; 10])]));
    assert!(matches!(result, Err(StreamError::Unusable)));

    let result = StreamRecord::normalize(&raw(&[("time", vec![])]));
    assert!(matches!(result, Err(StreamError::Unusable)));
  }

  #[test]
  fn test_missing_channels_default_to_empty() {
    let record = StreamRecord::normalize(&raw(&[("time", vec![0.0, 1.0, 2.0])])).unwrap();
    assert_eq!(record.len(), 3);
    assert!(record.heartrate.is_empty());
    assert!(record.power.is_empty());
    assert!(!record.has_heart_rate_data());
    assert!(!record.has_altitude_data());
  }

  #[test]
  fn test_presence_predicates() {
    let record = StreamRecord::normalize(&raw(&[
      ("time", vec![0.0, 1.0, 2.0]),
      ("heartrate", vec![0.0, 0.0, 0.0]),
      ("watts", vec![0.0, 150.0, 0.0]),
      ("altitude", vec![0.0, 0.0, 0.0]),
      ("cadence", vec![0.0, 0.0, 0.0]),
    ]))
    .unwrap();

    assert!(!record.has_heart_rate_data());
    assert!(record.has_power_data());
    assert!(record.has_altitude_data());
    assert!(!record.has_cadence_data());
    assert_eq!(record.average_heart_rate(), None);
  }

  #[test]
  fn test_misaligned_channels_are_repaired() {
    let record = StreamRecord::normalize(&raw(&[
      ("time", vec![0.0, 1.0, 2.0, 3.0]),
      ("heartrate", vec![120.0, 121.0]),
      ("distance", vec![0.0, 3.0]),
      ("cadence", vec![80.0, 81.0, 82.0, 83.0, 84.0, 85.0]),
    ]))
    .unwrap();

    assert_eq!(record.heartrate, vec![120.0, 121.0, 0.0, 0.0]);
    assert_eq!(record.distance, vec![0.0, 3.0, 3.0, 3.0]);
    assert_eq!(record.cadence.len(), 4);
  }

  #[test]
  fn test_from_strava_json() {
    let json = r#"{
      "time": {"data": [0, 1, 2], "series_type": "distance", "original_size": 3, "resolution": "high"},
      "heartrate": {"data": [130, null, 132]},
      "velocity_smooth": {"data": [2.5, 2.6, 2.7]}
    }"#;
    let record = StreamRecord::from_strava_json(json).unwrap();
    assert_eq!(record.time, vec![0.0, 1.0, 2.0]);
    assert_eq!(record.heartrate, vec![130.0, 0.0, 132.0]);
    assert_eq!(record.velocity, vec![2.5, 2.6, 2.7]);
    assert!((record.average_heart_rate().unwrap() - 131.0).abs() < 1e-9);
  }

  #[test]
  fn test_from_strava_json_rejects_garbage() {
    assert!(matches!(
      StreamRecord::from_strava_json("not json"),
      Err(StreamError::Parse(_))
    ));
  }

  #[test]
  fn test_velocity_derived_from_distance() {
    let record = StreamRecord::normalize(&raw(&[
      ("time", vec![0.0, 2.0, 4.0]),
      ("distance", vec![0.0, 6.0, 12.0]),
    ]))
    .unwrap();
    let velocity = record.velocity_or_derived();
    assert_eq!(&velocity[..], &[0.0, 3.0, 3.0]);
  }
}
