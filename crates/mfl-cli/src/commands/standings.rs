//! Standings command: ranks teams by their drafted athletes' scores.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use mfl_core::{DraftResult, RaceState, TeamStanding, aggregate_standings, score_field};

use super::util::{read_json, read_results};
use crate::Config;

/// JSON standings structure.
#[derive(Debug, Serialize)]
pub struct JsonStandings<'a> {
    pub generated_at: String,
    pub state: RaceState,
    pub standings: &'a [TeamStanding],
}

/// Computes standings from a saved draft and a results file.
pub fn compute(
    draft: &Path,
    results: &Path,
    config: &Config,
    state: RaceState,
) -> Result<Vec<TeamStanding>> {
    let draft: DraftResult = read_json(draft)?;
    let records = read_results(results)?;

    let board = score_field(&records, state, &config.scoring, &config.projection);
    Ok(aggregate_standings(&draft.roster, &board))
}

/// Runs the standings command.
pub fn run<W: Write>(
    writer: &mut W,
    draft: &Path,
    results: &Path,
    config: &Config,
    state: RaceState,
    json: bool,
) -> Result<()> {
    let standings = compute(draft, results, config, state)?;

    if json {
        let output = format_standings_json(&standings, state, Utc::now())?;
        writeln!(writer, "{output}")?;
    } else {
        write_standings(writer, &standings, state)?;
    }

    Ok(())
}

/// Formats standings as JSON.
pub fn format_standings_json(
    standings: &[TeamStanding],
    state: RaceState,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    let output = JsonStandings {
        generated_at: generated_at.to_rfc3339(),
        state,
        standings,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Writes the human-readable standings table.
pub fn write_standings<W: Write>(
    writer: &mut W,
    standings: &[TeamStanding],
    state: RaceState,
) -> Result<()> {
    match state {
        RaceState::Final => writeln!(writer, "Standings (final)")?,
        RaceState::InProgress => writeln!(writer, "Standings (live, includes projections)")?,
    }

    if standings.is_empty() {
        writeln!(writer, "No teams drafted.")?;
        return Ok(());
    }

    for team in standings {
        let temporary = if team.temporary_points > 0 {
            format!(" ({} temporary)", team.temporary_points)
        } else {
            String::new()
        };
        writeln!(
            writer,
            "{:>3}. {}  {} pts{temporary}",
            team.rank, team.participant, team.total_points
        )?;
        writeln!(
            writer,
            "     wins {}, top 3 {}, world records {}, course records {}, races {}, avg {:.2}",
            team.wins,
            team.top3,
            team.world_records,
            team.course_records,
            team.races_count,
            team.average_points
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use insta::assert_snapshot;

    const DRAFT: &str = r#"{
        "roster": {
            "alice": { "men": ["m1"], "women": ["w2"] },
            "bob": { "men": ["m2", "m3"], "women": ["w1"] },
            "carol": {}
        }
    }"#;

    const RESULTS: &str = r#"[
        {
            "athlete_id": "m1",
            "gender": "men",
            "finish_time": "2:05:00",
            "placement": 1,
            "splits": { "10K": "0:29:30" }
        },
        {
            "athlete_id": "m2",
            "gender": "men",
            "finish_time": "2:07:30",
            "placement": 2,
            "splits": { "10K": "0:29:35" }
        },
        {
            "athlete_id": "m3",
            "gender": "men",
            "splits": { "10K": "0:29:40", "HALF": "1:03:00" }
        },
        {
            "athlete_id": "w1",
            "gender": "women",
            "finish_time": "2:14:00",
            "placement": 1,
            "splits": { "10K": "0:32:00" },
            "record": { "kind": "world", "status": "confirmed" }
        },
        { "athlete_id": "w2", "gender": "women", "splits": { "10K": "0:33:00" } }
    ]"#;

    fn compute_fixture(state: RaceState) -> Vec<TeamStanding> {
        let temp = tempfile::tempdir().unwrap();
        let draft = temp.path().join("draft.json");
        let results = temp.path().join("results.json");
        std::fs::write(&draft, DRAFT).unwrap();
        std::fs::write(&results, RESULTS).unwrap();
        compute(&draft, &results, &Config::default(), state).unwrap()
    }

    #[test]
    fn final_standings_table() {
        // alice: m1 10 + 5; w2 DNF
        // bob: m2 9 + 3; m3 DNF; w1 10 + 5 + 15
        let standings = compute_fixture(RaceState::Final);

        let mut output = Vec::new();
        write_standings(&mut output, &standings, RaceState::Final).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Standings (final)
          1. bob  42 pts
             wins 1, top 3 2, world records 1, course records 0, races 3, avg 14.00
          2. alice  15 pts
             wins 1, top 3 1, world records 0, course records 0, races 2, avg 7.50
          3. carol  0 pts
             wins 0, top 3 0, world records 0, course records 0, races 0, avg 0.00
        ");
    }

    #[test]
    fn live_standings_count_projections() {
        let standings = compute_fixture(RaceState::InProgress);

        let bob = &standings[0];
        assert_eq!(bob.participant.as_str(), "bob");
        // m3 ranks third of the field at 10K
        assert_eq!(bob.temporary_points, 8);
        assert_eq!(bob.total_points, 12 + 8 + 30);

        // w2 ranks second at 10K
        let alice = &standings[1];
        assert_eq!(alice.temporary_points, 9);
        assert_eq!(alice.total_points, 15 + 9);
        assert_eq!(alice.races_count, 2);
    }

    #[test]
    fn standings_json_output() {
        let standings = compute_fixture(RaceState::Final);
        let generated_at = Utc.with_ymd_and_hms(2026, 4, 20, 14, 30, 0).unwrap();
        let json = format_standings_json(&standings[2..], RaceState::Final, generated_at).unwrap();

        assert_snapshot!(json, @r#"
        {
          "generated_at": "2026-04-20T14:30:00+00:00",
          "state": "final",
          "standings": [
            {
              "rank": 3,
              "participant": "carol",
              "total_points": 0,
              "temporary_points": 0,
              "wins": 0,
              "top3": 0,
              "world_records": 0,
              "course_records": 0,
              "races_count": 0,
              "average_points": 0.0
            }
          ]
        }
        "#);
    }

    #[test]
    fn empty_roster_prints_placeholder() {
        let mut output = Vec::new();
        write_standings(&mut output, &[], RaceState::InProgress).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Standings (live, includes projections)
        No teams drafted.
        ");
    }
}
