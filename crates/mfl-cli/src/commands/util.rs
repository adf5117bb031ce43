//! Shared utilities for CLI commands.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use mfl_core::{Gender, RaceRecord, RaceTime, TimeFormat};

const ONE_HOUR: RaceTime = RaceTime::from_millis(3_600_000);

/// Reads and deserializes a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Reads a results file: a JSON list of race records.
pub fn read_results(path: &Path) -> Result<Vec<RaceRecord>> {
    let records: Vec<RaceRecord> = read_json(path)?;
    tracing::debug!(records = records.len(), path = %path.display(), "loaded results");
    Ok(records)
}

/// Formats a split for tables: `MM:SS` under an hour, `H:MM:SS` beyond.
pub fn format_split(time: RaceTime) -> String {
    if time < ONE_HOUR {
        time.format(TimeFormat::MinutesSeconds)
    } else {
        time.format(TimeFormat::Full)
    }
}

/// Section heading for a category.
pub const fn heading(gender: Gender) -> &'static str {
    match gender {
        Gender::Men => "Men",
        Gender::Women => "Women",
    }
}
