//! Command-line interface for bloodbank.
//!
//! This module provides the CLI structure for the `bbalert` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AlertCommand, AlertsCommand, AnalyzeCommand, ConfigCommand, DonorsCommand, StatusCommand,
    WorkerCommand,
};

use crate::logging::Verbosity;

/// bbalert - Blood inventory analysis and donor alerts
///
/// Analyzes the blood group mix of registered donors against the expected
/// population distribution and selects alerts for donors.
#[derive(Debug, Parser)]
#[command(name = "bbalert")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze the stored donors against expected demand
    Analyze(AnalyzeCommand),

    /// Select one alert for the current moment
    Alert(AlertCommand),

    /// Manage registered donors
    #[command(subcommand)]
    Donors(DonorsCommand),

    /// Manage stored alerts
    #[command(subcommand)]
    Alerts(AlertsCommand),

    /// Run the periodic alert worker
    Worker(WorkerCommand),

    /// Show store statistics
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
