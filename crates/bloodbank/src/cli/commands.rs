//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::blood_group::BloodGroup;
use crate::sample::DEFAULT_SAMPLE_COUNT;

/// Analyze command arguments.
#[derive(Debug, Args)]
pub struct AnalyzeCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Seasonal factor to use instead of the current month's
    #[arg(long, value_name = "FACTOR")]
    pub factor: Option<f64>,
}

/// Alert command arguments.
#[derive(Debug, Args)]
pub struct AlertCommand {
    /// Seed the random source for a reproducible selection
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Store the selected alert
    #[arg(long)]
    pub store: bool,
}

/// Donor management commands.
#[derive(Debug, Subcommand)]
pub enum DonorsCommand {
    /// List registered donors
    List {
        /// Only donors of this blood group
        #[arg(short, long)]
        group: Option<BloodGroup>,

        /// Maximum number of donors
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Register a donor
    Add {
        /// Full name
        #[arg(long)]
        name: String,

        /// Blood group, e.g. "O+" or "AB neg"
        #[arg(long)]
        group: BloodGroup,

        /// Contact phone number
        #[arg(long, default_value = "")]
        phone: String,

        /// City
        #[arg(long, default_value = "")]
        city: String,

        /// Register as currently unavailable
        #[arg(long)]
        unavailable: bool,
    },

    /// Insert randomly generated donors
    Seed {
        /// Number of donors
        #[arg(short = 'n', long, default_value_t = DEFAULT_SAMPLE_COUNT)]
        count: usize,

        /// Seed the random source for reproducible donors
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Remove a donor
    Remove {
        /// Donor id
        id: i64,
    },

    /// Remove every donor
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Stored alert commands.
#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts
    List {
        /// Include read, dismissed and expired alerts
        #[arg(short, long)]
        all: bool,

        /// Maximum number of alerts
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Mark an alert as read
    Read {
        /// Alert id
        id: i64,
    },

    /// Dismiss an alert
    Dismiss {
        /// Alert id
        id: i64,
    },

    /// Delete expired alerts and apply the retention limit
    Cleanup,

    /// Print the number of unread active alerts
    Unread,
}

/// Worker command arguments.
#[derive(Debug, Args)]
pub struct WorkerCommand {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Override the configured interval, in minutes
    #[arg(short, long, value_name = "MINUTES")]
    pub interval: Option<u64>,

    /// Seed the random source
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donors_command_debug() {
        let cmd = DonorsCommand::Seed {
            count: 10,
            seed: Some(1),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Seed"));
        assert!(debug_str.contains("count"));
    }

    #[test]
    fn test_alert_command_debug() {
        let cmd = AlertCommand {
            seed: None,
            json: true,
            store: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("json"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
