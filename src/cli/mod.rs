//! CLI command definitions and handlers

mod analyze;
mod init;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use techhealth::reporters::OutputFormat;

/// Parse an output format, rejecting unknown ones before any work starts
fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

/// Parse and validate a timeout in seconds (1-3600)
fn parse_timeout(s: &str) -> Result<u64, String> {
    let n: u64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("timeout must be at least 1 second".to_string())
    } else if n > 3600 {
        Err("timeout cannot exceed 3600 seconds".to_string())
    } else {
        Ok(n)
    }
}

/// techhealth - repository technical-health scoring
#[derive(Parser, Debug)]
#[command(name = "techhealth")]
#[command(
    version,
    about = "Technical health of a repository: code quality, commit activity, debt, peer benchmarks and a 0-100 score",
    after_help = "\
Examples:
  techhealth analyze rust-lang/regex                 Analyze a GitHub repository
  techhealth analyze acme/api --format json -o h.json
  techhealth analyze --local .                       Analyze a local checkout
  techhealth init                                    Write an example techhealth.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a techhealth.toml config file with the default settings
    Init {
        /// Directory to write the config into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing techhealth.toml
        #[arg(long)]
        force: bool,
    },

    /// Analyze a repository and print its health report
    #[command(after_help = "\
The GitHub token is read from --token, then $GITHUB_TOKEN, then
github_token in ~/.config/techhealth/config.toml.

Examples:
  techhealth analyze acme/widgets
  techhealth analyze acme/widgets --timeout 120 --config ci/techhealth.toml
  techhealth analyze --local ../widgets --format json")]
    Analyze {
        /// Repository as owner/repo. With --local, only names the report.
        slug: Option<String>,

        /// GitHub access token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Analyze a checkout on disk instead of fetching from GitHub
        #[arg(long, value_name = "PATH")]
        local: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = parse_format)]
        format: OutputFormat,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Fetch budget in seconds (overrides the config file)
        #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
        timeout: Option<u64>,

        /// Config file (default: ./techhealth.toml if present)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { path, force } => init::run(&path, force),
        Commands::Analyze {
            slug,
            token,
            local,
            format,
            output,
            timeout,
            config,
        } => analyze::run(analyze::AnalyzeArgs {
            slug,
            token,
            local,
            format,
            output,
            timeout,
            config,
        }),
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
    fn test_unknown_format_rejected_at_parse_time() {
        let result = Cli::try_parse_from(["techhealth", "analyze", "a/b", "--format", "sarif"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_analyze_arguments() {
        let cli = Cli::try_parse_from([
            "techhealth",
            "analyze",
            "--local",
            ".",
            "--format",
            "json",
            "--timeout",
            "30",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                local,
                format,
                timeout,
                ..
            } => {
                assert_eq!(local, Some(PathBuf::from(".")));
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(timeout, Some(30));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_timeout_bounds() {
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("abc").is_err());
        assert!(parse_timeout("3601").is_err());
        assert_eq!(parse_timeout("45"), Ok(45));
    }
}
