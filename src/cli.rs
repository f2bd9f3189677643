use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failing channels
    Quiet,
    /// Show one summary per channel
    #[default]
    Normal,
    /// Also list failing containers
    Verbose,
}

/// Validate catalog XML feeds against element specifications
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-feed")]
#[command(about = "Validate catalog XML feeds against declarative element specifications")]
#[command(version)]
pub struct Cli {
    /// Channel to test, or `all`
    #[arg(short = 'c', long = "channel")]
    pub channel: Option<String>,

    /// Number of records to request: a number, or `all` for no limit
    #[arg(short = 'l', long = "limit", value_parser = parse_limit)]
    pub limit: Option<u32>,

    /// Domain name of the feed API
    #[arg(short = 'd', long = "domain")]
    pub domain: Option<String>,

    /// API key for the feed API
    #[arg(short = 'k', long = "api-key")]
    pub api_key: Option<String>,

    /// Local XML file to validate instead of fetching from the API
    #[arg(short = 'i', long = "input-file")]
    pub input_file: Option<PathBuf>,

    /// Expectation file for a channel
    #[arg(
        long = "spec",
        value_name = "CHANNEL=PATH",
        value_parser = parse_channel_spec,
        action = clap::ArgAction::Append
    )]
    pub specs: Vec<(String, PathBuf)>,

    /// Directory for report files
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Directory for run log files
    #[arg(long = "log-dir")]
    pub log_dir: Option<PathBuf>,

    /// Configuration file (TOML or JSON)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Validate containers in parallel
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Number of retry attempts for failed requests
    #[arg(long = "retry-attempts")]
    pub retry_attempts: Option<u32>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Only report failing channels
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

fn parse_limit(value: &str) -> Result<u32, String> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|_| format!("expected a number or 'all', got '{}'", value))
}

fn parse_channel_spec(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((channel, path)) if !channel.trim().is_empty() && !path.trim().is_empty() => {
            Ok((channel.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected CHANNEL=PATH, got '{}'", value)),
    }
}
