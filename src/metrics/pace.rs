//! Running pace metrics: grade-adjusted (normalized graded) pace

use super::sample_dt;
use crate::streams::StreamRecord;
use crate::zones::MIN_PACE_VELOCITY;

/// Extra metabolic cost per unit of grade (Minetti-style linear fit)
const GRADE_COST_PER_UNIT: f64 = 3.5;

/// Floor on the cost factor so steep descents cannot blow up the pace
const MIN_COST_FACTOR: f64 = 0.3;

const MIN_SAMPLES: usize = 10;
const MIN_DISTANCE_METERS: f64 = 100.0;

/// Grade-adjusted pace in sec/km.
///
/// Each moving sample pair contributes its distance and its elapsed time
/// divided by the grade cost factor `max(1 + 3.5 x grade, 0.3)`, so climbs
/// shorten the adjusted time (an uphill effort is worth a faster flat pace)
/// and descents lengthen it. Without altitude every grade is 0 and the
/// result is the plain moving pace.
///
/// Requires 10 samples and 100 m of moving distance.
pub fn grade_adjusted_pace(stream: &StreamRecord) -> Option<f64> {
  accumulate_pace(stream, stream.has_altitude_data())
}

/// Moving pace in sec/km, ignoring terrain
pub fn moving_pace(stream: &StreamRecord) -> Option<f64> {
  accumulate_pace(stream, false)
}

fn accumulate_pace(stream: &StreamRecord, use_grade: bool) -> Option<f64> {
  let n = stream.len();
  if n < MIN_SAMPLES || stream.distance.len() != n {
    return None;
  }

  let mut adjusted_time = 0.0;
  let mut adjusted_distance = 0.0;

  for i in 1..n {
    let Some(dt) = sample_dt(&stream.time, i) else {
      continue;
    };
    let dd = stream.distance[i] - stream.distance[i - 1];
    if dd <= 0.0 || dd / dt <= MIN_PACE_VELOCITY {
      continue;
    }

    let cost = if use_grade {
      let grade = (stream.altitude[i] - stream.altitude[i - 1]) / dd;
      (1.0 + GRADE_COST_PER_UNIT * grade).max(MIN_COST_FACTOR)
    } else {
      1.0
    };

    adjusted_time += dt / cost;
    adjusted_distance += dd;
  }

  (adjusted_distance >= MIN_DISTANCE_METERS).then(|| adjusted_time / (adjusted_distance / 1000.0))
}

/// m/s -> sec/km
pub fn speed_to_pace(meters_per_second: f64) -> Option<f64> {
  (meters_per_second > 0.0).then(|| 1000.0 / meters_per_second)
}

/// sec/km -> m/s
pub fn pace_to_speed(sec_per_km: f64) -> Option<f64> {
  (sec_per_km > 0.0).then(|| 1000.0 / sec_per_km)
}
