//! Core logic for the marathon fantasy league.
//!
//! This crate contains the fundamental types and logic for:
//! - Draft: snake-order allocation of athletes to participant rosters
//! - Scoring: placement, time-gap, pacing and record points for one race
//! - Projection: provisional placements for athletes still on the course
//! - Standings: ranking teams by the scores of their rostered athletes

pub mod draft;
mod field;
pub mod projection;
pub mod record;
pub mod scoring;
pub mod standings;
pub mod time;
pub mod types;

pub use draft::{
    DraftError, DraftOrder, DraftResult, PreferenceBook, Preferences, Roster, RosterQuota,
    TeamRoster, run_draft, validate_preferences,
};
pub use field::{RaceState, score_field};
pub use projection::{ProjectedScore, ProjectionConfig, ProjectionError, project_record};
pub use record::{RaceOutcome, RaceRecord, RecordStatus, RecordType, Split, SplitTimes};
pub use scoring::{FieldContext, ScoreBreakdown, ScoringConfig, score_record};
pub use standings::{AthleteScore, ScoreBoard, TeamStanding, aggregate_standings};
pub use time::{RaceTime, TimeFormat, TimeParseError};
pub use types::{Athlete, AthleteId, Gender, ParticipantId, ValidationError};
