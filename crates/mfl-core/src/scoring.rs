//! Final scoring of a single athlete's race.
//!
//! # Point Components
//!
//! 1. Placement points: 10 for the winner down to 1 for tenth, 0 otherwise
//! 2. Time-gap bonus: up to 5 points for finishing close to the category winner
//!    (only for athletes who earned placement points)
//! 3. Performance bonuses: negative split (+2) or even pace (+1), plus a
//!    fast-finish kick (+1)
//! 4. Record bonuses: world record (+15), course record (+5)
//!
//! Every bonus is itemized and [`ScoreBreakdown::total_points`] is always the
//! exact sum of the components.

use serde::{Deserialize, Serialize};

use crate::record::{Finish, MARATHON_KM, RaceOutcome, RaceRecord, RecordStatus, Split, SplitMark};
use crate::time::RaceTime;
use crate::types::Gender;

/// Points for placements 1 through 10.
const PLACEMENT_POINTS: [u32; 10] = [10, 9, 8, 7, 6, 5, 4, 3, 2, 1];

/// Time-gap bonus tiers: (maximum gap behind the winner in ms, points).
/// Bounds are inclusive.
const GAP_BONUS_TIERS: [(u64, u32); 5] = [
    (60_000, 5),
    (120_000, 4),
    (180_000, 3),
    (300_000, 2),
    (600_000, 1),
];

const NEGATIVE_SPLIT_POINTS: u32 = 2;
const EVEN_PACE_POINTS: u32 = 1;
const FAST_FINISH_KICK_POINTS: u32 = 1;
const WORLD_RECORD_POINTS: u32 = 15;
const COURSE_RECORD_POINTS: u32 = 5;

/// Basis points in one whole.
const BPS_SCALE: f64 = 10_000.0;

/// Parameters of the fast-finish kick bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KickConfig {
    /// Checkpoint where the closing segment starts. Default: 40K (the final 2.195 km).
    pub segment_start: Split,

    /// How much faster, in basis points, the closing segment pace must be than
    /// the pace up to `segment_start`. Default: 0 (any strictly faster pace).
    pub min_pace_gain_bps: u32,
}

impl Default for KickConfig {
    fn default() -> Self {
        Self {
            segment_start: Split::FortyK,
            min_pace_gain_bps: 0,
        }
    }
}

/// Configuration for final scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Largest difference between the two halves that still counts as even pace.
    /// Default: 30000 (30 seconds).
    pub even_pace_tolerance_ms: u64,

    pub kick: KickConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            even_pace_tolerance_ms: 30_000, // 30 seconds
            kick: KickConfig::default(),
        }
    }
}

/// Category-wide facts needed to score one athlete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldContext {
    /// Finish time of the category winner, if anyone has finished.
    pub winner_time: Option<RaceTime>,
}

impl FieldContext {
    /// Derives the context for one gender category from its records.
    ///
    /// The winner is the placement-1 finisher; if no finisher carries that
    /// placement yet, the fastest finish time is used.
    pub fn from_records<'a, I>(records: I, gender: Gender) -> Self
    where
        I: IntoIterator<Item = &'a RaceRecord>,
    {
        let mut placed_winner = None;
        let mut fastest: Option<RaceTime> = None;

        for record in records.into_iter().filter(|r| r.gender == gender) {
            let Some(time) = record.finish_time else {
                continue;
            };
            if record.placement == Some(1) {
                placed_winner = Some(placed_winner.map_or(time, |t: RaceTime| t.min(time)));
            }
            fastest = Some(fastest.map_or(time, |t| t.min(time)));
        }

        Self {
            winner_time: placed_winner.or(fastest),
        }
    }
}

/// How the athlete's race ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    Finished,
    DidNotStart,
    DidNotFinish,
}

/// Pacing bonuses derived from split times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceBonus {
    NegativeSplit,
    EvenPace,
    FastFinishKick,
}

impl PerformanceBonus {
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Self::NegativeSplit => NEGATIVE_SPLIT_POINTS,
            Self::EvenPace => EVEN_PACE_POINTS,
            Self::FastFinishKick => FAST_FINISH_KICK_POINTS,
        }
    }
}

/// Kind of record broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    World,
    Course,
}

impl RecordKind {
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Self::World => WORLD_RECORD_POINTS,
            Self::Course => COURSE_RECORD_POINTS,
        }
    }
}

/// One itemized performance bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusItem {
    #[serde(rename = "type")]
    pub kind: PerformanceBonus,
    pub points: u32,
}

impl From<PerformanceBonus> for BonusItem {
    fn from(kind: PerformanceBonus) -> Self {
        Self {
            kind,
            points: kind.points(),
        }
    }
}

/// One itemized record bonus.
///
/// Provisional records carry their points immediately; confirmation only
/// changes `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBonus {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub status: RecordStatus,
    pub points: u32,
}

/// Point breakdown for one athlete's finalized race.
///
/// Fields are private so `total_points` can only be produced from the
/// components it sums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    status: ScoreStatus,
    placement: Option<u32>,
    finish_time: Option<RaceTime>,
    gap_to_winner: Option<RaceTime>,
    last_split: Option<SplitMark>,
    placement_points: u32,
    time_gap_points: u32,
    performance_bonuses: Vec<BonusItem>,
    record_bonuses: Vec<RecordBonus>,
    total_points: u32,
}

impl ScoreBreakdown {
    /// A zero score for an athlete who did not start or did not finish.
    fn without_finish(status: ScoreStatus, last_split: Option<SplitMark>) -> Self {
        Self {
            status,
            placement: None,
            finish_time: None,
            gap_to_winner: None,
            last_split,
            placement_points: 0,
            time_gap_points: 0,
            performance_bonuses: Vec::new(),
            record_bonuses: Vec::new(),
            total_points: 0,
        }
    }

    fn with_total(mut self) -> Self {
        self.total_points = self.placement_points
            + self.time_gap_points
            + self.performance_bonus_points()
            + self.record_bonus_points();
        self
    }

    pub const fn status(&self) -> ScoreStatus {
        self.status
    }

    pub const fn placement(&self) -> Option<u32> {
        self.placement
    }

    pub const fn finish_time(&self) -> Option<RaceTime> {
        self.finish_time
    }

    pub const fn gap_to_winner(&self) -> Option<RaceTime> {
        self.gap_to_winner
    }

    /// Last split reached, retained for reporting on non-finishers.
    pub const fn last_split(&self) -> Option<SplitMark> {
        self.last_split
    }

    pub const fn placement_points(&self) -> u32 {
        self.placement_points
    }

    pub const fn time_gap_points(&self) -> u32 {
        self.time_gap_points
    }

    pub fn performance_bonuses(&self) -> &[BonusItem] {
        &self.performance_bonuses
    }

    pub fn record_bonuses(&self) -> &[RecordBonus] {
        &self.record_bonuses
    }

    pub fn performance_bonus_points(&self) -> u32 {
        self.performance_bonuses.iter().map(|b| b.points).sum()
    }

    pub fn record_bonus_points(&self) -> u32 {
        self.record_bonuses.iter().map(|b| b.points).sum()
    }

    pub const fn total_points(&self) -> u32 {
        self.total_points
    }

    /// Whether any record bonus still awaits ratification.
    pub fn has_provisional_records(&self) -> bool {
        self.record_bonuses
            .iter()
            .any(|r| r.status == RecordStatus::Provisional)
    }

    /// Marks every record bonus as confirmed. Points are unchanged.
    #[must_use]
    pub fn with_records_confirmed(mut self) -> Self {
        for record in &mut self.record_bonuses {
            record.status = RecordStatus::Confirmed;
        }
        self
    }
}

/// Points for a finishing placement.
pub fn placement_points(placement: Option<u32>) -> u32 {
    placement
        .and_then(|p| usize::try_from(p).ok())
        .and_then(|p| p.checked_sub(1))
        .and_then(|idx| PLACEMENT_POINTS.get(idx).copied())
        .unwrap_or(0)
}

/// Bonus for finishing within a gap of the category winner.
pub fn time_gap_points(gap: RaceTime) -> u32 {
    GAP_BONUS_TIERS
        .iter()
        .find(|(max_gap_ms, _)| gap.as_millis() <= *max_gap_ms)
        .map_or(0, |(_, points)| *points)
}

/// Score one athlete's race record.
///
/// The record is resolved into a [`RaceOutcome`] first. Athletes who did not
/// start or did not finish score zero in every component.
pub fn score_record(record: &RaceRecord, field: &FieldContext, config: &ScoringConfig) -> ScoreBreakdown {
    score_outcome(&record.outcome(), field, config)
}

/// Score an already resolved outcome.
pub fn score_outcome(outcome: &RaceOutcome, field: &FieldContext, config: &ScoringConfig) -> ScoreBreakdown {
    match outcome {
        RaceOutcome::DidNotStart => ScoreBreakdown::without_finish(ScoreStatus::DidNotStart, None),
        RaceOutcome::DidNotFinish { last_split } => {
            ScoreBreakdown::without_finish(ScoreStatus::DidNotFinish, *last_split)
        }
        RaceOutcome::Finished(finish) => score_finish(finish, field, config),
    }
}

fn score_finish(finish: &Finish, field: &FieldContext, config: &ScoringConfig) -> ScoreBreakdown {
    let placement_points = placement_points(finish.placement);

    // A finish ahead of the recorded winner clamps to a zero gap
    let gap_to_winner = field.winner_time.map(|winner| {
        if finish.time < winner {
            tracing::warn!(
                finish = %finish.time,
                winner = %winner,
                "finish time faster than category winner"
            );
        }
        finish.time.gap_to(winner)
    });

    let time_gap_points = match gap_to_winner {
        Some(gap) if placement_points > 0 => time_gap_points(gap),
        _ => 0,
    };

    ScoreBreakdown {
        status: ScoreStatus::Finished,
        placement: finish.placement,
        finish_time: Some(finish.time),
        gap_to_winner,
        last_split: finish.splits.last(),
        placement_points,
        time_gap_points,
        performance_bonuses: performance_bonuses(finish, config),
        record_bonuses: record_bonuses(finish),
        total_points: 0,
    }
    .with_total()
}

/// Pacing bonuses for a finisher.
///
/// Negative split and even pace compare the two halves of the race at the
/// half-marathon split and never both apply. The kick bonus stacks with either.
fn performance_bonuses(finish: &Finish, config: &ScoringConfig) -> Vec<BonusItem> {
    let mut bonuses = Vec::new();

    if let Some(half) = finish.splits.get(Split::Half).filter(|&h| h < finish.time) {
        let first_half = half.as_millis();
        let second_half = finish.time.as_millis() - first_half;
        if second_half < first_half {
            bonuses.push(PerformanceBonus::NegativeSplit.into());
        } else if second_half - first_half <= config.even_pace_tolerance_ms {
            bonuses.push(PerformanceBonus::EvenPace.into());
        }
    }

    if has_fast_finish_kick(finish, &config.kick) {
        bonuses.push(PerformanceBonus::FastFinishKick.into());
    }

    bonuses
}

#[allow(clippy::cast_precision_loss)]
fn has_fast_finish_kick(finish: &Finish, kick: &KickConfig) -> bool {
    let Some(start) = finish
        .splits
        .get(kick.segment_start)
        .filter(|&t| t > RaceTime::ZERO && t < finish.time)
    else {
        return false;
    };

    let start_km = kick.segment_start.distance_km();
    let closing_km = MARATHON_KM - start_km;

    let pace_before = start.as_millis() as f64 / start_km;
    let closing_pace = finish.time.gap_to(start).as_millis() as f64 / closing_km;
    let required = pace_before * (1.0 - f64::from(kick.min_pace_gain_bps) / BPS_SCALE);

    closing_pace < required
}

fn record_bonuses(finish: &Finish) -> Vec<RecordBonus> {
    let kind = finish.record.kind;
    let status = finish.record.status;

    [
        (kind.includes_world(), RecordKind::World),
        (kind.includes_course(), RecordKind::Course),
    ]
    .into_iter()
    .filter(|(applies, _)| *applies)
    .map(|(_, kind)| RecordBonus {
        kind,
        status,
        points: kind.points(),
    })
    .collect()
}
