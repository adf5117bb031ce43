//! Provisional placement projection for athletes still on the course.
//!
//! # Algorithm Summary
//!
//! 1. Take the started field of one gender category
//! 2. Pick the furthest checkpoint reported by more than `quorum_percent` of it
//! 3. Rank athletes still running by elapsed time at that checkpoint, behind
//!    every athlete who has already finished
//! 4. Map the projected placement through the placement table; no other bonus
//!    applies before a finish
//!
//! Projections are advisory: a final score replaces them as soon as a finish
//! time exists.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{RaceRecord, Split};
use crate::scoring::placement_points;
use crate::time::RaceTime;
use crate::types::{AthleteId, Gender};

/// Configuration for live projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// A checkpoint anchors projections only when strictly more than this
    /// percentage of the started field has reported it. Default: 50 (majority).
    pub quorum_percent: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self { quorum_percent: 50 }
    }
}

/// Projection errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// No checkpoint has been reported by enough of the field.
    #[error("no split reported by enough of the {gender} field to project placements")]
    AmbiguousProjectionBasis { gender: Gender },

    /// The athlete has a finish time and must be scored instead.
    #[error("athlete {athlete_id} has finished; score the finish instead")]
    AlreadyFinished { athlete_id: AthleteId },

    /// The athlete has not reached any checkpoint.
    #[error("athlete {athlete_id} has no split times")]
    NoSplits { athlete_id: AthleteId },

    /// The record belongs to the other category.
    #[error("athlete {athlete_id} races in the {actual} field, not {expected}")]
    WrongCategory {
        athlete_id: AthleteId,
        expected: Gender,
        actual: Gender,
    },
}

/// Placement-only score estimate for an athlete still racing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectedScore {
    checkpoint: Split,
    projected_placement: u32,
    placement_points: u32,
    is_temporary: bool,
}

impl ProjectedScore {
    /// Checkpoint the projection was ranked at.
    pub const fn checkpoint(&self) -> Split {
        self.checkpoint
    }

    pub const fn projected_placement(&self) -> u32 {
        self.projected_placement
    }

    /// Points counted while the race is in progress.
    pub const fn temporary_points(&self) -> u32 {
        self.placement_points
    }

    /// Always equal to the placement points; projections carry no bonuses.
    pub const fn total_points(&self) -> u32 {
        self.placement_points
    }

    /// Always `true`.
    pub const fn is_temporary(&self) -> bool {
        self.is_temporary
    }
}

/// Checkpoint times of one category, ready to rank individual athletes.
#[derive(Debug, Clone)]
pub struct ProjectionBasis {
    gender: Gender,
    checkpoint: Split,
    /// Elapsed times at `checkpoint` of athletes still running, fastest first.
    times: Vec<RaceTime>,
    /// Athletes with a finish time; they rank ahead of anyone on the course.
    finished: usize,
    field_size: usize,
}

impl ProjectionBasis {
    /// Chooses the anchoring checkpoint for a category.
    ///
    /// Records of the other category and athletes with no timing data are
    /// ignored.
    pub fn from_field<'a, I>(
        records: I,
        gender: Gender,
        config: &ProjectionConfig,
    ) -> Result<Self, ProjectionError>
    where
        I: IntoIterator<Item = &'a RaceRecord>,
    {
        let field: Vec<&RaceRecord> = records
            .into_iter()
            .filter(|r| r.gender == gender && r.has_started())
            .collect();
        let field_size = field.len();

        let quorum = u64::from(config.quorum_percent);
        let checkpoint = Split::ALL.into_iter().rev().find(|&split| {
            let reported = field.iter().filter(|r| r.splits.get(split).is_some()).count();
            reported > 0 && (reported as u64) * 100 > (field_size as u64) * quorum
        });

        let Some(checkpoint) = checkpoint else {
            tracing::warn!(%gender, field_size, "no checkpoint reached quorum");
            return Err(ProjectionError::AmbiguousProjectionBasis { gender });
        };

        let (done, running): (Vec<&RaceRecord>, Vec<&RaceRecord>) =
            field.iter().copied().partition(|r| r.finish_time.is_some());
        let mut times: Vec<RaceTime> = running
            .iter()
            .filter_map(|r| r.splits.get(checkpoint))
            .collect();
        times.sort_unstable();

        tracing::debug!(
            %gender,
            %checkpoint,
            reported = times.len(),
            finished = done.len(),
            field_size,
            "selected projection checkpoint"
        );

        Ok(Self {
            gender,
            checkpoint,
            times,
            finished: done.len(),
            field_size,
        })
    }

    pub const fn checkpoint(&self) -> Split {
        self.checkpoint
    }

    pub const fn field_size(&self) -> usize {
        self.field_size
    }

    /// Projects one in-progress athlete.
    ///
    /// Finishers hold the leading placements. Among athletes still running,
    /// ties share the better placement and an athlete without a time at the
    /// checkpoint is placed behind everyone who has one.
    pub fn project(&self, record: &RaceRecord) -> Result<ProjectedScore, ProjectionError> {
        if record.gender != self.gender {
            return Err(ProjectionError::WrongCategory {
                athlete_id: record.athlete_id.clone(),
                expected: self.gender,
                actual: record.gender,
            });
        }
        if record.finish_time.is_some() {
            return Err(ProjectionError::AlreadyFinished {
                athlete_id: record.athlete_id.clone(),
            });
        }
        if record.splits.is_empty() {
            return Err(ProjectionError::NoSplits {
                athlete_id: record.athlete_id.clone(),
            });
        }

        let ahead = self.finished
            + match record.splits.get(self.checkpoint) {
                Some(time) => self.times.partition_point(|&t| t < time),
                None => self.times.len(),
            };
        let projected_placement = u32::try_from(ahead + 1).unwrap_or(u32::MAX);

        Ok(ProjectedScore {
            checkpoint: self.checkpoint,
            projected_placement,
            placement_points: placement_points(Some(projected_placement)),
            is_temporary: true,
        })
    }
}

/// Projects one athlete against the split data of its field.
pub fn project_record(
    record: &RaceRecord,
    field: &[RaceRecord],
    config: &ProjectionConfig,
) -> Result<ProjectedScore, ProjectionError> {
    ProjectionBasis::from_field(field, record.gender, config)?.project(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(text: &str) -> RaceTime {
        RaceTime::parse(text).unwrap()
    }

    fn runner(id: &str, splits: &[(Split, &str)]) -> RaceRecord {
        splits.iter().fold(
            RaceRecord::new(AthleteId::new(id).unwrap(), Gender::Men),
            |record, (split, time)| record.with_split(*split, t(time)),
        )
    }

    fn field() -> Vec<RaceRecord> {
        vec![
            runner("a", &[(Split::FiveK, "0:14:40"), (Split::TenK, "0:29:30")]),
            runner("b", &[(Split::FiveK, "0:14:41"), (Split::TenK, "0:29:20")]),
            runner("c", &[(Split::FiveK, "0:14:45"), (Split::TenK, "0:29:50")]),
            runner("d", &[(Split::FiveK, "0:14:50"), (Split::TenK, "0:29:25")]),
            // Only this runner is past halfway
            runner(
                "e",
                &[
                    (Split::FiveK, "0:14:30"),
                    (Split::TenK, "0:29:00"),
                    (Split::Half, "1:02:00"),
                ],
            ),
            runner("f", &[(Split::FiveK, "0:15:30")]),
        ]
    }

    #[test]
    fn uses_furthest_checkpoint_with_majority() {
        let field = field();
        let basis = ProjectionBasis::from_field(&field, Gender::Men, &ProjectionConfig::default())
            .unwrap();
        assert_eq!(basis.checkpoint(), Split::TenK);
        assert_eq!(basis.field_size(), 6);
    }

    #[test]
    fn ranks_by_checkpoint_time() {
        let field = field();
        let config = ProjectionConfig::default();

        let e = project_record(&field[4], &field, &config).unwrap();
        assert_eq!(e.projected_placement(), 1);
        assert_eq!(e.temporary_points(), 10);

        let b = project_record(&field[1], &field, &config).unwrap();
        assert_eq!(b.projected_placement(), 2);
        assert_eq!(b.temporary_points(), 9);

        let c = project_record(&field[2], &field, &config).unwrap();
        assert_eq!(c.projected_placement(), 5);
        assert_eq!(c.checkpoint(), Split::TenK);
        assert!(c.is_temporary());
    }

    #[test]
    fn athlete_missing_checkpoint_is_placed_last() {
        let field = field();
        let f = project_record(&field[5], &field, &ProjectionConfig::default()).unwrap();
        assert_eq!(f.projected_placement(), 6);
        assert_eq!(f.total_points(), 5);
    }

    #[test]
    fn ties_share_the_better_placement() {
        let field = vec![
            runner("a", &[(Split::TenK, "0:29:30")]),
            runner("b", &[(Split::TenK, "0:29:30")]),
            runner("c", &[(Split::TenK, "0:29:10")]),
        ];
        let config = ProjectionConfig::default();
        let a = project_record(&field[0], &field, &config).unwrap();
        let b = project_record(&field[1], &field, &config).unwrap();
        assert_eq!(a.projected_placement(), 2);
        assert_eq!(b.projected_placement(), 2);
    }

    #[test]
    fn finishers_without_splits_rank_ahead_of_runners() {
        let mut field: Vec<RaceRecord> = (1..=3)
            .map(|p| {
                RaceRecord::new(AthleteId::new(&format!("f{p}")).unwrap(), Gender::Men)
                    .with_finish(t(&format!("2:0{p}:00")))
                    .with_placement(p)
            })
            .collect();
        field.extend([
            runner("r0", &[(Split::TenK, "0:29:00")]),
            runner("r1", &[(Split::TenK, "0:29:10")]),
            runner("r2", &[(Split::TenK, "0:29:20")]),
            runner("r3", &[(Split::TenK, "0:29:30")]),
        ]);
        let config = ProjectionConfig::default();

        let leader = project_record(&field[3], &field, &config).unwrap();
        assert_eq!(leader.checkpoint(), Split::TenK);
        assert_eq!(leader.projected_placement(), 4);
        assert_eq!(leader.temporary_points(), 7);

        let last = project_record(&field[6], &field, &config).unwrap();
        assert_eq!(last.projected_placement(), 7);
    }

    #[test]
    fn finisher_slower_at_checkpoint_still_ranks_ahead() {
        let field = vec![
            runner("a", &[(Split::TenK, "0:30:00")]).with_finish(t("2:06:00")),
            runner("b", &[(Split::TenK, "0:29:00")]),
        ];
        let b = project_record(&field[1], &field, &ProjectionConfig::default()).unwrap();
        assert_eq!(b.projected_placement(), 2);
    }

    #[test]
    fn no_majority_checkpoint_is_ambiguous() {
        let field = vec![
            runner("a", &[(Split::FiveK, "0:14:40")]),
            runner("b", &[(Split::TenK, "0:29:20")]),
            RaceRecord::new(AthleteId::new("c").unwrap(), Gender::Men)
                .with_finish(t("2:06:00")),
            RaceRecord::new(AthleteId::new("d").unwrap(), Gender::Men)
                .with_finish(t("2:07:00")),
        ];
        let result = project_record(&field[0], &field, &ProjectionConfig::default());
        assert_eq!(
            result,
            Err(ProjectionError::AmbiguousProjectionBasis { gender: Gender::Men })
        );
    }

    #[test]
    fn empty_field_is_ambiguous() {
        let empty: Vec<RaceRecord> = Vec::new();
        let result =
            ProjectionBasis::from_field(&empty, Gender::Women, &ProjectionConfig::default());
        assert!(matches!(
            result,
            Err(ProjectionError::AmbiguousProjectionBasis { gender: Gender::Women })
        ));
    }

    #[test]
    fn finished_athlete_is_not_projected() {
        let mut field = field();
        field[0].finish_time = Some(t("2:05:00"));
        let result = project_record(&field[0], &field, &ProjectionConfig::default());
        assert!(matches!(result, Err(ProjectionError::AlreadyFinished { .. })));
    }

    #[test]
    fn athlete_without_splits_is_not_projected() {
        let field = field();
        let idle = RaceRecord::new(AthleteId::new("z").unwrap(), Gender::Men);
        let result = project_record(&idle, &field, &ProjectionConfig::default());
        assert!(matches!(result, Err(ProjectionError::NoSplits { .. })));
    }

    #[test]
    fn basis_rejects_other_category() {
        let field = field();
        let basis = ProjectionBasis::from_field(&field, Gender::Men, &ProjectionConfig::default())
            .unwrap();
        let woman = RaceRecord::new(AthleteId::new("w").unwrap(), Gender::Women)
            .with_split(Split::TenK, t("0:33:00"));
        assert!(matches!(
            basis.project(&woman),
            Err(ProjectionError::WrongCategory { .. })
        ));
    }

    #[test]
    fn lower_quorum_reaches_further_checkpoints() {
        let field = field();
        let config = ProjectionConfig { quorum_percent: 10 };
        let basis = ProjectionBasis::from_field(&field, Gender::Men, &config).unwrap();
        assert_eq!(basis.checkpoint(), Split::Half);
    }

    #[test]
    fn projection_serializes_temporary_marker() {
        let field = field();
        let projected = project_record(&field[4], &field, &ProjectionConfig::default()).unwrap();
        let json = serde_json::to_value(projected).unwrap();
        assert_eq!(json["is_temporary"], true);
        assert_eq!(json["checkpoint"], "10K");
        assert_eq!(json["projected_placement"], 1);
    }
}
