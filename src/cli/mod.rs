//! Command line entry point: parses arguments, loads config, sets up
//! logging and dispatches to a command.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use plant_classifier::config::AppConfig;
use plant_classifier::logging::setup_logging;

pub use commands::{SplitArgs, StatsArgs, VerifyLabelsArgs};

/// Dataset tools for plant species classifiers
#[derive(Parser, Debug)]
#[command(name = "plant-classifier")]
#[command(version)]
#[command(about = "Split plant image datasets into train/val and check them against a label table")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (JSON). Defaults to the per-user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for log files, overrides the config
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy a class-per-directory dataset into train/ and val/ subsets
    Split(SplitArgs),
    /// Show per-class train/val counts of an existing split
    Stats(StatsArgs),
    /// Check a label table against the class directories of a training tree
    VerifyLabels(VerifyLabelsArgs),
}

impl Cli {
    /// Run the selected command and return the process exit code.
    pub fn run(self) -> Result<i32> {
        let loaded = AppConfig::load(self.config.as_deref()).context("failed to load configuration")?;

        let log_dir = self.log_dir.clone().or_else(|| loaded.config.log_dir.clone());
        setup_logging(log_dir.as_deref(), self.verbose).context("failed to set up logging")?;
        loaded.log_outcome();
        let config = loaded.config;
        debug!("Effective config: {:?}", config);

        match self.command {
            Commands::Split(args) => commands::run_split(args, &config),
            Commands::Stats(args) => commands::run_stats(args, &config),
            Commands::VerifyLabels(args) => commands::run_verify_labels(args, &config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_split_args() {
        let cli = Cli::parse_from([
            "plant-classifier",
            "-v",
            "split",
            "data/plants",
            "data/plants_split",
            "--val-ratio",
            "0.25",
            "--seed",
            "42",
            "--extensions",
            "jpg,png",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Split(args) => {
                assert_eq!(args.source, PathBuf::from("data/plants"));
                assert_eq!(args.val_ratio, Some(0.25));
                assert_eq!(args.seed, Some(42));
                assert_eq!(args.extensions, Some(vec!["jpg".to_string(), "png".to_string()]));
                assert!(args.workers.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_verify_labels() {
        let cli = Cli::parse_from([
            "plant-classifier",
            "verify-labels",
            "--labels",
            "labels.json",
            "split/train",
        ]);
        match cli.command {
            Commands::VerifyLabels(args) => {
                assert_eq!(args.labels, Some(PathBuf::from("labels.json")));
                assert_eq!(args.train_dir, PathBuf::from("split/train"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
