//! Marathon fantasy league CLI library.
//!
//! This crate provides the CLI interface for the fantasy league.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
