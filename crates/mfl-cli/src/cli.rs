//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Marathon fantasy league.
///
/// Runs the snake draft, scores race results and ranks the teams.
#[derive(Debug, Parser)]
#[command(name = "mfl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the snake draft from submitted preference lists.
    Draft {
        /// JSON file with the pick order and every participant's preferences.
        input: PathBuf,

        /// JSON list of known athletes to check preferences against.
        #[arg(long)]
        athletes: Option<PathBuf>,

        /// Write the draft result as JSON to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Score every athlete in a results file.
    Score {
        /// JSON list of race records.
        results: PathBuf,

        /// Treat the race as in progress and project unfinished athletes.
        #[arg(long)]
        live: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Rank teams by the scores of their drafted athletes.
    Standings {
        /// Draft result JSON, as written by `mfl draft --output`.
        #[arg(long)]
        draft: PathBuf,

        /// JSON list of race records.
        #[arg(long)]
        results: PathBuf,

        /// Treat the race as in progress and project unfinished athletes.
        #[arg(long)]
        live: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
