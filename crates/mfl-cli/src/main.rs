use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mfl_cli::commands::{draft, score, standings};
use mfl_cli::{Cli, Commands, Config};
use mfl_core::RaceState;

const fn race_state(live: bool) -> RaceState {
    if live {
        RaceState::InProgress
    } else {
        RaceState::Final
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so JSON output on stdout stays parseable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout().lock();
    match command {
        Commands::Draft {
            input,
            athletes,
            output,
            json,
        } => draft::run(
            &mut stdout,
            input,
            athletes.as_deref(),
            &config.roster,
            output.as_deref(),
            *json,
        )?,
        Commands::Score {
            results,
            live,
            json,
        } => score::run(&mut stdout, results, &config, race_state(*live), *json)?,
        Commands::Standings {
            draft,
            results,
            live,
            json,
        } => standings::run(
            &mut stdout,
            draft,
            results,
            &config,
            race_state(*live),
            *json,
        )?,
    }

    Ok(())
}
