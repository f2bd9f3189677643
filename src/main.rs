use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;
use tracing_subscriber::EnvFilter;

use validate_feed::cli::{Cli, VerbosityLevel};
use validate_feed::config::{Config, ConfigManager};
use validate_feed::output::Output;
use validate_feed::runner::{ChannelRunner, ChannelSpec, exit_code};
use validate_feed::sink::FileSink;
use validate_feed::source::{DocumentSource, FileDocumentSource, HttpDocumentSource};

fn init_tracing(verbosity: VerbosityLevel) {
    let default_level = match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn build_source(config: &Config) -> Result<Arc<dyn DocumentSource>> {
    if let Some(input_file) = &config.source.input_file {
        return Ok(Arc::new(FileDocumentSource::new(input_file)));
    }

    // validate_config guarantees both are present when there is no input file
    let domain = config.source.domain.clone().unwrap_or_default();
    let api_key = config.source.api_key.clone().unwrap_or_default();
    let source = HttpDocumentSource::new(domain, api_key, config.http_client_config())
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(source))
}

/// Expectation files of the configured channels, read as each channel runs
fn channel_specs(config: &Config) -> Vec<ChannelSpec> {
    config
        .effective_channels()
        .into_iter()
        .map(|channel| ChannelSpec::from_file(channel.name, channel.spec))
        .collect()
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = ConfigManager::load_config(&cli)
        .await
        .context("Failed to load configuration")?;
    init_tracing(config.verbosity());

    let started_at = Local::now();
    let channels = channel_specs(&config);
    let source = build_source(&config)?;
    let log_sink = Arc::new(FileSink::log(&config.output.log_dir, started_at));

    info!(log = %log_sink.path().display(), "writing run log");
    if config.verbosity() != VerbosityLevel::Quiet {
        println!("Test in progress...");
    }

    let runner = ChannelRunner::new(source, channels, config.output.report_dir.clone(), log_sink)
        .with_limit(config.run.limit)
        .with_parallel(config.validation.parallel)
        .with_output(Output::new(config.verbosity()));

    let outcomes = runner
        .run(&config.run.channel)
        .await
        .context("Failed to write run log")?;

    if config.verbosity() != VerbosityLevel::Quiet {
        println!("Test completed!");
    }

    Ok(ExitCode::from(exit_code(&outcomes) as u8))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            ExitCode::from(2)
        }
    }
}
