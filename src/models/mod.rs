pub mod analytics;
pub mod breakthrough;
pub mod load;
pub mod profile;
pub mod workout;

pub use analytics::{TssMethod, WorkoutAnalytics};
pub use breakthrough::{Breakthrough, BreakthroughCandidate, Confidence, ZoneKind};
pub use load::TrainingLoadSnapshot;
pub use profile::{
  AthleteProfile, ExperienceLevel, PlanZoneConfig, Sex, UserZones, ZoneUpdate,
  PLAN_ZONE_CONFIG_VERSION, THRESHOLD_TO_EASY_PACE,
};
pub use workout::{ActivitySummary, Discipline, PrescribedIntensity};
