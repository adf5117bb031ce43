//! Team standings from rosters and per-athlete scores.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::draft::Roster;
use crate::projection::ProjectedScore;
use crate::scoring::{RecordKind, ScoreBreakdown};
use crate::types::{AthleteId, ParticipantId};

/// The current score of one athlete: final, or projected while racing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AthleteScore {
    Final(ScoreBreakdown),
    Projected(ProjectedScore),
}

impl AthleteScore {
    /// Points this athlete contributes to a team total.
    pub const fn points(&self) -> u32 {
        match self {
            Self::Final(breakdown) => breakdown.total_points(),
            Self::Projected(projected) => projected.temporary_points(),
        }
    }

    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Projected(_))
    }

    /// Official placement; projections have none.
    pub const fn placement(&self) -> Option<u32> {
        match self {
            Self::Final(breakdown) => breakdown.placement(),
            Self::Projected(_) => None,
        }
    }
}

/// Scores keyed by athlete, where a final score always wins over a projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScoreBoard(BTreeMap<AthleteId, AthleteScore>);

impl ScoreBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a final score, replacing any projection.
    pub fn insert_final(&mut self, athlete: AthleteId, breakdown: ScoreBreakdown) {
        self.0.insert(athlete, AthleteScore::Final(breakdown));
    }

    /// Records a projection unless a final score already exists.
    ///
    /// Returns `false` when the projection was discarded.
    pub fn insert_projected(&mut self, athlete: AthleteId, projected: ProjectedScore) -> bool {
        match self.0.get(&athlete) {
            Some(AthleteScore::Final(_)) => false,
            _ => {
                self.0.insert(athlete, AthleteScore::Projected(projected));
                true
            }
        }
    }

    pub fn get(&self, athlete: &AthleteId) -> Option<&AthleteScore> {
        self.0.get(athlete)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AthleteId, &AthleteScore)> {
        self.0.iter()
    }
}

/// Aggregated result for one team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStanding {
    /// 1-based position after sorting.
    pub rank: usize,
    pub participant: ParticipantId,
    pub total_points: u32,
    /// Share of `total_points` that comes from projections.
    pub temporary_points: u32,
    pub wins: u32,
    pub top3: u32,
    pub world_records: u32,
    pub course_records: u32,
    /// Roster athletes with any score, final or projected.
    pub races_count: u32,
    pub average_points: f64,
}

impl TeamStanding {
    fn empty(participant: ParticipantId) -> Self {
        Self {
            rank: 0,
            participant,
            total_points: 0,
            temporary_points: 0,
            wins: 0,
            top3: 0,
            world_records: 0,
            course_records: 0,
            races_count: 0,
            average_points: 0.0,
        }
    }

    fn add(&mut self, score: &AthleteScore) {
        self.races_count += 1;
        self.total_points += score.points();

        match score {
            AthleteScore::Projected(projected) => {
                self.temporary_points += projected.temporary_points();
            }
            AthleteScore::Final(breakdown) => {
                match breakdown.placement() {
                    Some(1) => {
                        self.wins += 1;
                        self.top3 += 1;
                    }
                    Some(2 | 3) => self.top3 += 1,
                    _ => {}
                }
                for record in breakdown.record_bonuses() {
                    match record.kind {
                        RecordKind::World => self.world_records += 1,
                        RecordKind::Course => self.course_records += 1,
                    }
                }
            }
        }
    }
}

/// Combine rosters with athlete scores into ranked standings.
///
/// Teams are ordered by total points, then wins, then top-3 finishes, then
/// participant ID, so equal teams always come out in the same order. Athletes
/// without a score do not count towards `races_count`.
pub fn aggregate_standings(roster: &Roster, scores: &ScoreBoard) -> Vec<TeamStanding> {
    let mut standings: Vec<TeamStanding> = roster
        .iter()
        .map(|(participant, team)| {
            let mut standing = TeamStanding::empty(participant.clone());
            for score in team.athletes().filter_map(|athlete| scores.get(athlete)) {
                standing.add(score);
            }
            if standing.races_count > 0 {
                standing.average_points =
                    f64::from(standing.total_points) / f64::from(standing.races_count);
            }
            standing
        })
        .collect();

    standings.sort_by(|a, b| {
        (Reverse(a.total_points), Reverse(a.wins), Reverse(a.top3), &a.participant).cmp(&(
            Reverse(b.total_points),
            Reverse(b.wins),
            Reverse(b.top3),
            &b.participant,
        ))
    });

    for (idx, standing) in standings.iter_mut().enumerate() {
        standing.rank = idx + 1;
    }

    tracing::debug!(teams = standings.len(), scored = scores.len(), "aggregated standings");
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::TeamRoster;
    use crate::projection::{ProjectionConfig, project_record};
    use crate::record::{RaceRecord, RecordStatus, RecordType, Split};
    use crate::scoring::{FieldContext, ScoringConfig, score_record};
    use crate::time::RaceTime;
    use crate::types::Gender;

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id).unwrap()
    }

    fn aid(id: &str) -> AthleteId {
        AthleteId::new(id).unwrap()
    }

    fn t(text: &str) -> RaceTime {
        RaceTime::parse(text).unwrap()
    }

    fn team(men: &[&str], women: &[&str]) -> TeamRoster {
        TeamRoster {
            men: men.iter().copied().map(aid).collect(),
            women: women.iter().copied().map(aid).collect(),
        }
    }

    fn final_score(id: &str, finish: &str, placement: u32, winner: Option<&str>) -> ScoreBreakdown {
        let record = RaceRecord::new(aid(id), Gender::Men)
            .with_finish(t(finish))
            .with_placement(placement);
        let field = FieldContext {
            winner_time: winner.map(t),
        };
        score_record(&record, &field, &ScoringConfig::default())
    }

    #[test]
    fn runner_up_with_gap_bonus_outranks_bare_winner() {
        let mut roster = Roster::new();
        roster.insert(pid("team-a"), team(&["winner"], &[]));
        roster.insert(pid("team-b"), team(&["second"], &[]));

        let mut scores = ScoreBoard::new();
        // No winner time known for this one, so placement points only
        scores.insert_final(aid("winner"), final_score("winner", "2:05:00", 1, None));
        scores.insert_final(
            aid("second"),
            final_score("second", "2:05:40", 2, Some("2:05:00")),
        );

        let standings = aggregate_standings(&roster, &scores);
        assert_eq!(standings[0].participant, pid("team-b"));
        assert_eq!(standings[0].total_points, 14);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[1].participant, pid("team-a"));
        assert_eq!(standings[1].total_points, 10);
        assert_eq!(standings[1].wins, 1);
        assert_eq!(standings[1].rank, 2);
    }

    #[test]
    fn counts_wins_top3_and_records() {
        let mut roster = Roster::new();
        roster.insert(pid("p1"), team(&["m1", "m2"], &["w1"]));

        let mut scores = ScoreBoard::new();
        scores.insert_final(aid("m1"), final_score("m1", "2:05:00", 1, Some("2:05:00")));
        scores.insert_final(aid("m2"), final_score("m2", "2:06:30", 3, Some("2:05:00")));
        let record = RaceRecord::new(aid("w1"), Gender::Women)
            .with_finish(t("2:09:56"))
            .with_placement(1)
            .with_record(RecordType::Both, RecordStatus::Provisional);
        let field = FieldContext {
            winner_time: Some(t("2:09:56")),
        };
        scores.insert_final(aid("w1"), score_record(&record, &field, &ScoringConfig::default()));

        let standings = aggregate_standings(&roster, &scores);
        let p1 = &standings[0];
        assert_eq!(p1.wins, 2);
        assert_eq!(p1.top3, 3);
        assert_eq!(p1.world_records, 1);
        assert_eq!(p1.course_records, 1);
        assert_eq!(p1.races_count, 3);
        // m1: 10 + 5, m2: 8 + 4, w1: 10 + 5 + 15 + 5
        assert_eq!(p1.total_points, 62);
        assert!((p1.average_points - 62.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_roster_averages_zero() {
        let mut roster = Roster::new();
        roster.insert(pid("idle"), TeamRoster::default());
        let standings = aggregate_standings(&roster, &ScoreBoard::new());

        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].races_count, 0);
        assert!(standings[0].average_points.abs() < f64::EPSILON);
        assert_eq!(standings[0].rank, 1);
    }

    #[test]
    fn unscored_athletes_do_not_count_as_races() {
        let mut roster = Roster::new();
        roster.insert(pid("p1"), team(&["m1", "m2"], &["w1"]));
        let mut scores = ScoreBoard::new();
        scores.insert_final(aid("m1"), final_score("m1", "2:07:00", 4, Some("2:05:00")));

        let standings = aggregate_standings(&roster, &scores);
        assert_eq!(standings[0].races_count, 1);
        assert!((standings[0].average_points - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_break_on_wins_then_participant() {
        let mut roster = Roster::new();
        roster.insert(pid("bravo"), team(&["m1"], &[]));
        roster.insert(pid("alpha"), team(&["m2"], &[]));
        roster.insert(pid("charlie"), team(&["m3"], &[]));

        let mut scores = ScoreBoard::new();
        // 10 points, one win
        scores.insert_final(aid("m1"), final_score("m1", "2:05:00", 1, None));
        // 8 + 2 = 10 points, no win
        scores.insert_final(aid("m2"), final_score("m2", "2:09:00", 3, Some("2:05:00")));
        scores.insert_final(aid("m3"), final_score("m3", "2:09:00", 3, Some("2:05:00")));

        let standings = aggregate_standings(&roster, &scores);
        let order: Vec<&str> = standings.iter().map(|s| s.participant.as_str()).collect();
        assert_eq!(order, vec!["bravo", "alpha", "charlie"]);
        let ranks: Vec<usize> = standings.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn projections_count_as_temporary_points() {
        let field = vec![
            RaceRecord::new(aid("m1"), Gender::Men).with_split(Split::TenK, t("0:29:00")),
            RaceRecord::new(aid("m2"), Gender::Men).with_split(Split::TenK, t("0:29:10")),
        ];
        let projected = project_record(&field[0], &field, &ProjectionConfig::default()).unwrap();

        let mut roster = Roster::new();
        roster.insert(pid("p1"), team(&["m1"], &[]));
        let mut scores = ScoreBoard::new();
        assert!(scores.insert_projected(aid("m1"), projected));

        let standings = aggregate_standings(&roster, &scores);
        assert_eq!(standings[0].total_points, 10);
        assert_eq!(standings[0].temporary_points, 10);
        assert_eq!(standings[0].wins, 0);
        assert_eq!(standings[0].races_count, 1);
    }

    #[test]
    fn final_score_supersedes_projection() {
        let field = vec![
            RaceRecord::new(aid("m1"), Gender::Men).with_split(Split::TenK, t("0:29:00")),
        ];
        let projected = project_record(&field[0], &field, &ProjectionConfig::default()).unwrap();

        let mut scores = ScoreBoard::new();
        scores.insert_final(aid("m1"), final_score("m1", "2:08:00", 6, Some("2:05:00")));
        assert!(!scores.insert_projected(aid("m1"), projected));

        let score = scores.get(&aid("m1")).unwrap();
        assert!(!score.is_temporary());
        assert_eq!(score.points(), 5 + 3);

        let mut scores = ScoreBoard::new();
        assert!(scores.insert_projected(aid("m1"), projected));
        scores.insert_final(aid("m1"), final_score("m1", "2:08:00", 6, Some("2:05:00")));
        assert!(!scores.get(&aid("m1")).unwrap().is_temporary());
    }

    #[test]
    fn score_board_serializes_kind_tag() {
        let mut scores = ScoreBoard::new();
        scores.insert_final(aid("m1"), final_score("m1", "2:05:00", 1, Some("2:05:00")));
        let json = serde_json::to_value(&scores).unwrap();
        assert_eq!(json["m1"]["kind"], "final");
        assert_eq!(json["m1"]["total_points"], 15);
    }
}
