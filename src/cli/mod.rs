//! CLI command definitions and handlers

mod analyze;
mod init;
mod watch;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Codesight - local-first code quality analysis
///
/// Runs entirely on your machine unless `--ai` is given.
#[derive(Parser, Debug)]
#[command(name = "codesight")]
#[command(
    version,
    about = "Local-first code quality analysis: pattern detectors, optional AI review, weighted category scores",
    after_help = "\
Examples:
  codesight analyze .                          Analyze current directory
  codesight analyze src --format json          JSON output for scripting
  codesight analyze . --min-severity high      Only show high/critical findings
  codesight analyze . --fail-under 80          Exit code 1 below score 80 (CI mode)
  codesight watch .                            Re-analyze files as you save them
  codesight init                               Write a codesight.toml"
)]
pub struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze files or directories and print a scored report
    #[command(after_help = "\
Examples:
  codesight analyze .                                  Analyze current directory
  codesight analyze src/app.ts src/util.ts             Analyze specific files
  codesight analyze . --format markdown -o REPORT.md   Markdown report
  codesight analyze . --ai                             Add AI review (needs an API key)
  codesight analyze . --profile review                 Strict file-wide duplication")]
    Analyze {
        /// Files or directories to analyze
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md"])]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Ask the configured model for additional findings
        #[arg(long)]
        ai: bool,

        /// Detector profile (overrides codesight.toml)
        #[arg(long, value_parser = ["standard", "review"])]
        profile: Option<String>,

        /// Minimum severity to report (info, low, medium, high, critical)
        #[arg(long, value_parser = ["info", "low", "medium", "high", "critical"])]
        min_severity: Option<String>,

        /// Exit with code 1 if the overall score is below this value
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        fail_under: Option<u32>,

        /// Skip a detector by name (repeatable)
        #[arg(long = "skip-detector")]
        skip_detector: Vec<String>,
    },

    /// Watch a directory and re-analyze files as they change
    Watch {
        /// Directory to watch
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Quiet period before a changed file is re-analyzed (overrides codesight.toml)
        #[arg(long)]
        debounce_ms: Option<u64>,

        /// Ask the configured model for additional findings
        #[arg(long)]
        ai: bool,
    },

    /// Write a codesight.toml with the default settings
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing codesight.toml
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            paths,
            format,
            output,
            ai,
            profile,
            min_severity,
            fail_under,
            skip_detector,
        } => analyze::run(analyze::AnalyzeOptions {
            paths,
            format,
            output,
            ai,
            profile,
            min_severity,
            fail_under,
            skip_detectors: skip_detector,
        }),
        Commands::Watch {
            path,
            debounce_ms,
            ai,
        } => watch::run(&path, debounce_ms, ai),
        Commands::Init { path, force } => init::run(&path, force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::try_parse_from(["codesight", "analyze"]).unwrap();
        assert_eq!(cli.log_level, "warn");
        match cli.command {
            Commands::Analyze {
                paths,
                format,
                ai,
                fail_under,
                ..
            } => {
                assert_eq!(paths, vec![PathBuf::from(".")]);
                assert!(format.is_none());
                assert!(!ai);
                assert!(fail_under.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from([
            "codesight",
            "analyze",
            "src",
            "lib",
            "-f",
            "json",
            "--min-severity",
            "high",
            "--skip-detector",
            "todo-scanner",
            "--skip-detector",
            "magic-numbers",
            "--fail-under",
            "75",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                paths,
                format,
                min_severity,
                skip_detector,
                fail_under,
                ..
            } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(format.as_deref(), Some("json"));
                assert_eq!(min_severity.as_deref(), Some("high"));
                assert_eq!(skip_detector, vec!["todo-scanner", "magic-numbers"]);
                assert_eq!(fail_under, Some(75));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["codesight", "analyze", "-f", "sarif"]).is_err());
        assert!(Cli::try_parse_from(["codesight", "analyze", "--fail-under", "101"]).is_err());
        assert!(Cli::try_parse_from(["codesight", "analyze", "--profile", "lax"]).is_err());
        assert!(Cli::try_parse_from(["codesight"]).is_err());
    }

    #[test]
    fn test_global_log_level() {
        let cli = Cli::try_parse_from(["codesight", "init", "--log-level", "debug", "--force"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Init { force: true, .. }));
    }
}
