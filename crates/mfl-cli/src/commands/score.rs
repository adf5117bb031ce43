//! Score command for per-athlete results.
//!
//! Prints each category sorted by points, with the point components of every
//! final score and the checkpoint behind every projection.

use std::cmp::Reverse;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use mfl_core::scoring::{PerformanceBonus, RecordKind, ScoreStatus};
use mfl_core::{
    AthleteScore, Gender, RaceRecord, RaceState, RecordStatus, ScoreBoard, ScoreBreakdown,
    score_field,
};

use super::util::{format_split, heading, read_results};
use crate::Config;

#[derive(Debug, Serialize)]
struct JsonScores<'a> {
    state: RaceState,
    scores: &'a ScoreBoard,
}

/// Runs the score command.
pub fn run<W: Write>(
    writer: &mut W,
    results: &Path,
    config: &Config,
    state: RaceState,
    json: bool,
) -> Result<()> {
    let records = read_results(results)?;
    let board = score_field(&records, state, &config.scoring, &config.projection);

    if json {
        let output = JsonScores {
            state,
            scores: &board,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        write_scores(writer, &records, &board, state)?;
    }

    Ok(())
}

/// Writes the per-category result tables.
pub fn write_scores<W: Write>(
    writer: &mut W,
    records: &[RaceRecord],
    board: &ScoreBoard,
    state: RaceState,
) -> Result<()> {
    let label = match state {
        RaceState::Final => "final",
        RaceState::InProgress => "live",
    };
    writeln!(writer, "Results ({label})")?;

    for gender in Gender::ALL {
        let mut field: Vec<(&RaceRecord, Option<&AthleteScore>)> = records
            .iter()
            .filter(|r| r.gender == gender)
            .map(|r| (r, board.get(&r.athlete_id)))
            .collect();
        if field.is_empty() {
            continue;
        }
        field.sort_by(|(a, a_score), (b, b_score)| {
            let a_points = a_score.map_or(0, AthleteScore::points);
            let b_points = b_score.map_or(0, AthleteScore::points);
            (Reverse(a_points), &a.athlete_id).cmp(&(Reverse(b_points), &b.athlete_id))
        });

        writeln!(writer)?;
        writeln!(writer, "{}", heading(gender))?;
        for (record, score) in field {
            writeln!(writer, "  {}  {}", record.athlete_id, describe(score))?;
            if !record.splits.is_empty() {
                let splits: Vec<String> = record
                    .splits
                    .iter()
                    .map(|mark| format!("{} {}", mark.split, format_split(mark.time)))
                    .collect();
                writeln!(writer, "    splits: {}", splits.join(", "))?;
            }
        }
    }

    Ok(())
}

fn describe(score: Option<&AthleteScore>) -> String {
    match score {
        None => "not scored".to_string(),
        Some(AthleteScore::Projected(projected)) => format!(
            "projected #{} at {}  {} pts (temporary)",
            projected.projected_placement(),
            projected.checkpoint(),
            projected.temporary_points()
        ),
        Some(AthleteScore::Final(breakdown)) => describe_final(breakdown),
    }
}

fn describe_final(breakdown: &ScoreBreakdown) -> String {
    match breakdown.status() {
        ScoreStatus::DidNotStart => "DNS  0 pts".to_string(),
        ScoreStatus::DidNotFinish => match breakdown.last_split() {
            Some(mark) => format!("DNF after {}  0 pts", mark.split),
            None => "DNF  0 pts".to_string(),
        },
        ScoreStatus::Finished => {
            let finish = breakdown
                .finish_time()
                .map_or_else(|| "-".to_string(), |t| t.to_string());
            let placement = breakdown
                .placement()
                .map_or_else(|| "-".to_string(), |p| format!("#{p}"));
            format!(
                "{finish}  {placement}  {} pts  ({})",
                breakdown.total_points(),
                components(breakdown).join(", ")
            )
        }
    }
}

fn components(breakdown: &ScoreBreakdown) -> Vec<String> {
    let mut parts = vec![format!("placement {}", breakdown.placement_points())];
    if breakdown.time_gap_points() > 0 {
        parts.push(format!("gap {}", breakdown.time_gap_points()));
    }
    for bonus in breakdown.performance_bonuses() {
        let name = match bonus.kind {
            PerformanceBonus::NegativeSplit => "negative split",
            PerformanceBonus::EvenPace => "even pace",
            PerformanceBonus::FastFinishKick => "kick",
        };
        parts.push(format!("{name} {}", bonus.points));
    }
    for record in breakdown.record_bonuses() {
        let name = match record.kind {
            RecordKind::World => "world record",
            RecordKind::Course => "course record",
        };
        match record.status {
            RecordStatus::Provisional => parts.push(format!("{name} {} provisional", record.points)),
            RecordStatus::Confirmed => parts.push(format!("{name} {}", record.points)),
        }
    }
    parts
}
