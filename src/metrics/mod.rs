//! Metric calculators
//!
//! Independent numeric algorithms over a `StreamRecord` (or its channels)
//! plus threshold inputs. Every calculator returns `None` or an empty
//! collection when the data is insufficient; none of them fail.

pub mod compliance;
pub mod heart_rate;
pub mod load;
pub mod pace;
pub mod power;
pub mod swim;
pub mod terrain;

use crate::zones::MAX_SAMPLE_GAP_SECONDS;

/// Time delta between two samples when it is usable, `None` for
/// non-monotonic time or sensor gaps
pub(crate) fn sample_dt(time: &[f64], i: usize) -> Option<f64> {
  let dt = time[i] - time[i - 1];
  (dt > 0.0 && dt <= MAX_SAMPLE_GAP_SECONDS).then_some(dt)
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
  (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}
