//! Draft command: snake-drafts athletes onto participant rosters.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use mfl_core::draft::DraftPick;
use mfl_core::{
    Athlete, DraftOrder, DraftResult, Gender, ParticipantId, PreferenceBook, RosterQuota,
    run_draft, validate_preferences,
};

use super::util::{heading, read_json};

/// Contents of a draft input file.
#[derive(Debug, Deserialize)]
pub struct DraftInput {
    pub order: PickOrder,
    pub preferences: PreferenceBook,
}

/// Either one order for both categories or one per category.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PickOrder {
    Shared(Vec<ParticipantId>),
    PerCategory(DraftOrder),
}

impl PickOrder {
    fn into_draft_order(self) -> DraftOrder {
        match self {
            Self::Shared(order) => DraftOrder::same(order),
            Self::PerCategory(order) => order,
        }
    }
}

/// Runs the draft command.
pub fn run<W: Write>(
    writer: &mut W,
    input: &Path,
    athletes: Option<&Path>,
    quota: &RosterQuota,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let DraftInput { order, preferences } = read_json(input)?;

    if let Some(path) = athletes {
        let registry: Vec<Athlete> = read_json(path)?;
        validate_preferences(&registry, &preferences)
            .context("preferences reference invalid athletes")?;
        tracing::debug!(athletes = registry.len(), "validated preferences");
    }

    let result = run_draft(&order.into_draft_order(), &preferences, quota)
        .context("draft could not be run")?;

    if let Some(path) = output {
        let content = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "saved draft result");
    }

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&result)?)?;
    } else {
        write_draft(writer, &result)?;
    }

    Ok(())
}

/// Writes the human-readable pick log, rosters and shortfalls.
pub fn write_draft<W: Write>(writer: &mut W, result: &DraftResult) -> Result<()> {
    writeln!(
        writer,
        "Draft: {} teams, {} picks",
        result.roster.len(),
        result.picks.len()
    )?;

    for gender in Gender::ALL {
        writeln!(writer)?;
        writeln!(writer, "{}", heading(gender))?;

        let picks: Vec<&DraftPick> = result.picks.iter().filter(|p| p.gender == gender).collect();
        if picks.is_empty() {
            writeln!(writer, "  no picks")?;
            continue;
        }
        for round in picks.chunk_by(|a, b| a.round == b.round) {
            let selections: Vec<String> = round
                .iter()
                .map(|p| format!("{} -> {}", p.participant, p.athlete))
                .collect();
            writeln!(writer, "  round {}: {}", round[0].round, selections.join(", "))?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "Rosters")?;
    for (participant, team) in &result.roster {
        let men = join_or_dash(team.for_gender(Gender::Men));
        let women = join_or_dash(team.for_gender(Gender::Women));
        writeln!(writer, "  {participant}: men {men}; women {women}")?;
    }

    if !result.shortfalls.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Shortfalls")?;
        for shortfall in &result.shortfalls {
            writeln!(
                writer,
                "  {}: {} {}/{}",
                shortfall.participant, shortfall.gender, shortfall.filled, shortfall.quota
            )?;
        }
    }

    Ok(())
}

fn join_or_dash<T: ToString>(items: &[T]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}
