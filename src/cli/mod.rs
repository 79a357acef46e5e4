pub mod run;
pub mod scan;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// A3S Govern - PII-aware document routing and lineage publication
#[derive(Debug, Parser)]
#[command(name = "a3s-govern", version, about)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify, route, store, and govern every document in the data directory
    Run {
        /// Data directory to scan (overrides config and environment)
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Documents processed in parallel
        #[arg(long)]
        concurrency: Option<usize>,

        /// Write the JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Classify and route a single file without writing anything
    Scan {
        /// File to scan
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "a3s-govern",
            "--config",
            "govern.toml",
            "run",
            "--data-dir",
            "/srv/docs",
            "--concurrency",
            "4",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("govern.toml")));
        match cli.command {
            Commands::Run {
                data_dir,
                concurrency,
                report,
            } => {
                assert_eq!(data_dir, Some(PathBuf::from("/srv/docs")));
                assert_eq!(concurrency, Some(4));
                assert!(report.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::parse_from(["a3s-govern", "scan", "notes.txt"]);
        assert!(matches!(cli.command, Commands::Scan { file } if file == PathBuf::from("notes.txt")));
    }
}
