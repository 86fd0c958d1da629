//! Heart-rate driven metrics: TRIMP, efficiency factor, aerobic decoupling

use super::sample_dt;
use crate::models::Sex;

const TRIMP_WEIGHT: f64 = 0.64;
const TRIMP_K_MALE: f64 = 1.92;
const TRIMP_K_FEMALE: f64 = 1.67;

const MIN_HR_SAMPLES: usize = 10;
const MIN_DECOUPLING_SAMPLES: usize = 10;

/// Banister training impulse.
///
/// Sums `minutes x hrr x 0.64 x e^(k x hrr)` over every usable sample pair,
/// where `hrr` is the heart-rate-reserve fraction clamped to [0, 1].
pub fn trimp(time: &[f64], heartrate: &[f64], max_hr: f64, resting_hr: f64, sex: Sex) -> Option<f64> {
  let reserve = max_hr - resting_hr;
  if reserve <= 0.0 {
    return None;
  }

  let n = time.len().min(heartrate.len());
  let valid_samples = heartrate[..n].iter().filter(|hr| **hr > 0.0).count();
  if valid_samples < MIN_HR_SAMPLES {
    return None;
  }

  let k = match sex {
    Sex::Male => TRIMP_K_MALE,
    Sex::Female => TRIMP_K_FEMALE,
  };

  let mut total = 0.0;
  for i in 1..n {
    let hr = heartrate[i];
    if hr <= 0.0 {
      continue;
    }
    let Some(dt) = sample_dt(time, i) else {
      continue;
    };
    let hrr = ((hr - resting_hr) / reserve).clamp(0.0, 1.0);
    total += (dt / 60.0) * hrr * TRIMP_WEIGHT * (k * hrr).exp();
  }

  Some(total)
}

/// Output per heartbeat: NP for bike, speed (m/min) for run
pub fn efficiency_factor(output: f64, average_hr: f64) -> Option<f64> {
  (output > 0.0 && average_hr > 0.0).then(|| output / average_hr)
}

/// Pa:HR drift between the two halves of a workout, in percent.
///
/// `output` is power for bike or velocity for run. Positive values mean
/// heart rate rose relative to output in the second half.
pub fn aerobic_decoupling(time: &[f64], heartrate: &[f64], output: &[f64]) -> Option<f64> {
  let n = time.len().min(heartrate.len()).min(output.len());
  if n < 2 {
    return None;
  }

  let midpoint = (time[0] + time[n - 1]) / 2.0;

  // (output sum, hr sum, count) per half
  let mut halves = [(0.0, 0.0, 0usize); 2];
  for i in 0..n {
    if heartrate[i] <= 0.0 || output[i] <= 0.0 {
      continue;
    }
    let half = &mut halves[usize::from(time[i] >= midpoint)];
    half.0 += output[i];
    half.1 += heartrate[i];
    half.2 += 1;
  }

  if halves.iter().any(|h| h.2 < MIN_DECOUPLING_SAMPLES) {
    return None;
  }

  let first_ratio = halves[0].0 / halves[0].1;
  let second_ratio = halves[1].0 / halves[1].1;
  Some((first_ratio - second_ratio) / first_ratio * 100.0)
}
