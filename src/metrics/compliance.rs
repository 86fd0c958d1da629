//! Zone compliance: how closely the time-in-zone profile matched what the
//! plan prescribed

use serde::{Deserialize, Serialize};

use crate::models::PrescribedIntensity;
use crate::zones::{Zone, ZoneDistribution};

/// Which distribution the score was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceSource {
  HeartRate,
  Pace,
  Power,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketCompliance {
  /// 1-5
  pub zone: u8,
  pub actual_pct: f64,
  pub expected_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScore {
  /// 0-100
  pub score: f64,
  pub intensity: PrescribedIntensity,
  pub source: ComplianceSource,
  pub buckets: Vec<BucketCompliance>,
}

/// Expected share of time in Z1..Z5 for each prescribed intensity
pub fn expected_distribution(intensity: PrescribedIntensity) -> [f64; 5] {
  match intensity {
    PrescribedIntensity::Easy => [20.0, 65.0, 12.0, 3.0, 0.0],
    PrescribedIntensity::Moderate => [10.0, 35.0, 40.0, 13.0, 2.0],
    PrescribedIntensity::Hard => [10.0, 20.0, 25.0, 35.0, 10.0],
    PrescribedIntensity::Max => [10.0, 15.0, 15.0, 30.0, 30.0],
  }
}

/// Score a distribution against the prescribed profile.
///
/// `100 - sum(|actual - expected|) / 2`, clamped to 0..=100. `None` when the
/// distribution holds no valid time.
pub fn score_distribution<Z: Zone>(
  distribution: &ZoneDistribution<Z>,
  intensity: PrescribedIntensity,
  source: ComplianceSource,
) -> Option<ComplianceScore> {
  distribution
    .has_time()
    .then(|| score_buckets(distribution.buckets(), intensity, source))
}

pub fn score_buckets(
  actual: [f64; 5],
  intensity: PrescribedIntensity,
  source: ComplianceSource,
) -> ComplianceScore {
  let expected = expected_distribution(intensity);
  let deviation: f64 = actual
    .iter()
    .zip(expected.iter())
    .map(|(a, e)| (a - e).abs())
    .sum();

  let buckets = actual
    .iter()
    .zip(expected.iter())
    .enumerate()
    .map(|(i, (&actual_pct, &expected_pct))| BucketCompliance {
      zone: i as u8 + 1,
      actual_pct,
      expected_pct,
    })
    .collect();

  ComplianceScore {
    score: (100.0 - deviation / 2.0).clamp(0.0, 100.0),
    intensity,
    source,
    buckets,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::zones::{hr_zone_distribution, power_zone_distribution};

  #[test]
  fn test_perfect_match_scores_100() {
    let score = score_buckets(
      [20.0, 65.0, 12.0, 3.0, 0.0],
      PrescribedIntensity::Easy,
      ComplianceSource::HeartRate,
    );
    assert_eq!(score.score, 100.0);
    assert_eq!(score.buckets.len(), 5);
    assert_eq!(score.buckets[1].expected_pct, 65.0);
  }

  #[test]
  fn test_opposite_profile_scores_0() {
    let score = score_buckets(
      [0.0, 0.0, 0.0, 0.0, 100.0],
      PrescribedIntensity::Easy,
      ComplianceSource::HeartRate,
    );
    assert_eq!(score.score, 0.0);
  }

  #[test]
  fn test_partial_deviation() {
    // all time in Z2 for an easy session: |20|+|35|+|12|+|3| = 70
    let score = score_buckets(
      [0.0, 100.0, 0.0, 0.0, 0.0],
      PrescribedIntensity::Easy,
      ComplianceSource::Pace,
    );
    assert!((score.score - 65.0).abs() < 1e-9);
  }

  #[test]
  fn test_hard_session_from_hr_stream() {
    let time: Vec<f64> = (0..600).map(|i| i as f64).collect();
    // 85% of 200 max HR is Z4
    let hr = vec![170.0; 600];
    let distribution = hr_zone_distribution(&time, &hr, 200.0);
    let score = score_distribution(&distribution, PrescribedIntensity::Hard, ComplianceSource::HeartRate)
      .unwrap();
    // |10|+|20|+|25|+|65|+|10| = 130
    assert!((score.score - 35.0).abs() < 1e-9);
  }

  #[test]
  fn test_power_z6_folds_into_top_bucket() {
    let time: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let power = vec![400.0; 100];
    let distribution = power_zone_distribution(&time, &power, 200.0);
    let score = score_distribution(&distribution, PrescribedIntensity::Max, ComplianceSource::Power)
      .unwrap();
    assert!((score.buckets[4].actual_pct - 100.0).abs() < 1e-9);
  }

  #[test]
  fn test_empty_distribution_has_no_score() {
    let distribution = hr_zone_distribution(&[0.0, 1.0], &[0.0, 0.0], 190.0);
    assert!(score_distribution(&distribution, PrescribedIntensity::Easy, ComplianceSource::HeartRate).is_none());
  }
}
