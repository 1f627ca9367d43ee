pub mod composite;
pub mod pillars;

pub use composite::{aggregate, Confidence, DiagnosticScore};
pub use pillars::{score_pillars, HealthLevel, Pillar, PillarScore};
