//! Power-derived metrics: normalized power, variability, best efforts

use super::mean;

/// Rolling window for normalized power, in samples (1 Hz recordings)
pub const NP_WINDOW_SAMPLES: usize = 30;

/// Normalized Power.
///
/// 30-sample rolling average, raised to the 4th power, averaged, then the
/// 4th root taken. Requires at least 30 samples.
pub fn normalized_power(power: &[f64]) -> Option<f64> {
  if power.len() < NP_WINDOW_SAMPLES {
    return None;
  }

  let window = NP_WINDOW_SAMPLES as f64;
  let mut rolling_sum: f64 = power[..NP_WINDOW_SAMPLES].iter().map(|w| w.max(0.0)).sum();
  let mut fourth_power_sum = (rolling_sum / window).powi(4);
  let mut count = 1usize;

  for i in NP_WINDOW_SAMPLES..power.len() {
    rolling_sum += power[i].max(0.0) - power[i - NP_WINDOW_SAMPLES].max(0.0);
    fourth_power_sum += (rolling_sum / window).max(0.0).powi(4);
    count += 1;
  }

  let np = (fourth_power_sum / count as f64).powf(0.25);
  (np > 0.0).then_some(np)
}

/// NP / average power. ~1.0 for steady rides, higher when surgy.
pub fn variability_index(normalized_power: f64, average_power: f64) -> Option<f64> {
  (normalized_power > 0.0 && average_power > 0.0).then(|| normalized_power / average_power)
}

/// Highest mean of `values` over any `window_seconds` stretch of the
/// recording. `None` when the recording is shorter than the window.
pub fn best_average(time: &[f64], values: &[f64], window_seconds: f64) -> Option<f64> {
  let n = time.len().min(values.len());
  if n < 2 || time[n - 1] - time[0] < window_seconds {
    return None;
  }

  let mut start = 0;
  let mut sum = 0.0;
  let mut best: Option<f64> = None;

  for end in 0..n {
    sum += values[end].max(0.0);
    while time[end] - time[start] > window_seconds {
      sum -= values[start].max(0.0);
      start += 1;
    }

    if time[end] - time[0] >= window_seconds {
      let avg = sum / (end - start + 1) as f64;
      best = Some(best.map_or(avg, |b: f64| b.max(avg)));
    }
  }

  best
}

/// Kilojoules of work, assuming the samples span `duration_seconds`
pub fn work_kj(power: &[f64], duration_seconds: f64) -> Option<f64> {
  let avg = mean(power)?;
  (avg > 0.0 && duration_seconds > 0.0).then(|| avg * duration_seconds / 1000.0)
}
