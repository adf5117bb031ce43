//! CLI subcommand implementations.

pub mod draft;
pub mod score;
pub mod standings;
mod util;
