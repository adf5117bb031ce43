//! Scoring a whole race field at once.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::projection::{ProjectedScore, ProjectionBasis, ProjectionConfig, ProjectionError};
use crate::record::RaceRecord;
use crate::scoring::{FieldContext, ScoreBreakdown, ScoringConfig, score_record};
use crate::standings::ScoreBoard;
use crate::types::Gender;

/// Whether results are still coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceState {
    /// Only finishers get final scores; runners on course are projected.
    InProgress,
    /// Every record is final, so non-finishers score as DNS or DNF.
    #[default]
    Final,
}

enum Scored {
    Final(ScoreBreakdown),
    Projected(ProjectedScore),
    Skipped,
}

/// Scores every record of a race, both categories.
///
/// Each category gets its own winner time and projection basis. Records are
/// scored in parallel; the resulting board is ordered by athlete ID.
pub fn score_field(
    records: &[RaceRecord],
    state: RaceState,
    scoring: &ScoringConfig,
    projection: &ProjectionConfig,
) -> ScoreBoard {
    let mut board = ScoreBoard::new();

    for gender in Gender::ALL {
        let field: Vec<&RaceRecord> = records.iter().filter(|r| r.gender == gender).collect();
        if field.is_empty() {
            continue;
        }

        let context = FieldContext::from_records(field.iter().copied(), gender);
        let basis = match state {
            RaceState::Final => None,
            RaceState::InProgress => Some(ProjectionBasis::from_field(
                field.iter().copied(),
                gender,
                projection,
            )),
        };

        let scored: Vec<(&RaceRecord, Scored)> = field
            .par_iter()
            .map(|&record| (record, score_one(record, state, &context, basis.as_ref(), scoring)))
            .collect();

        for (record, result) in scored {
            match result {
                Scored::Final(breakdown) => board.insert_final(record.athlete_id.clone(), breakdown),
                Scored::Projected(projected) => {
                    board.insert_projected(record.athlete_id.clone(), projected);
                }
                Scored::Skipped => {}
            }
        }

        tracing::debug!(%gender, athletes = field.len(), ?state, "scored field");
    }

    board
}

fn score_one(
    record: &RaceRecord,
    state: RaceState,
    context: &FieldContext,
    basis: Option<&Result<ProjectionBasis, ProjectionError>>,
    scoring: &ScoringConfig,
) -> Scored {
    if state == RaceState::Final || record.finish_time.is_some() {
        return Scored::Final(score_record(record, context, scoring));
    }
    if record.splits.is_empty() {
        return Scored::Skipped;
    }

    let projected = match basis {
        Some(Ok(basis)) => basis.project(record),
        Some(Err(err)) => Err(err.clone()),
        None => return Scored::Skipped,
    };

    match projected {
        Ok(projected) => Scored::Projected(projected),
        Err(err) => {
            tracing::debug!(athlete = %record.athlete_id, error = %err, "skipping projection");
            Scored::Skipped
        }
    }
}
