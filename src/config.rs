use crate::cli::{Cli, VerbosityLevel};
use crate::http_client::HttpClientConfig;
use crate::runner::ALL_CHANNELS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Channels tested when no configuration names any
const DEFAULT_CHANNELS: [&str; 6] = ["movie", "game", "website", "tv", "book", "music"];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub run: RunConfig,
    pub source: SourceConfig,
    pub channels: Vec<ChannelConfig>,
    pub output: OutputConfig,
    pub validation: ValidationConfig,
}

/// Which channels to test and how many records to request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// A channel name or `all`
    pub channel: String,
    /// Records requested per channel; 0 means no limit
    pub limit: u32,
}

/// Where feed documents come from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Domain of the feed API, e.g. `example.com` for `api.example.com`
    pub domain: Option<String>,
    pub api_key: Option<String>,
    /// Local XML file used instead of the API
    pub input_file: Option<PathBuf>,
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Number of retry attempts for failed requests
    pub retry_attempts: u32,
    /// Retry delay in milliseconds
    pub retry_delay_ms: u64,
}

/// Expectation file for one channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelConfig {
    pub name: String,
    pub spec: PathBuf,
}

/// Report, log and console settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub report_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Verbose output
    pub verbose: bool,
    /// Quiet mode (failures only)
    pub quiet: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ValidationConfig {
    /// Validate containers on the rayon pool
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            channel: ALL_CHANNELS.to_string(),
            limit: 0,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            domain: None,
            api_key: None,
            input_file: None,
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: PathBuf::from("reports"),
            log_dir: PathBuf::from("log"),
            verbose: false,
            quiet: false,
        }
    }
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>, spec: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
        }
    }

    /// The conventional `etc/{name}_element.json` location
    pub fn conventional(name: &str) -> Self {
        Self::new(name, Path::new("etc").join(format!("{}_element.json", name)))
    }
}

impl Config {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.output.quiet {
            VerbosityLevel::Quiet
        } else if self.output.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout_seconds: self.source.timeout_seconds,
            retry_attempts: self.source.retry_attempts,
            retry_delay_ms: self.source.retry_delay_ms,
            ..Default::default()
        }
    }

    /// Configured channels, or the conventional defaults when none are configured
    pub fn effective_channels(&self) -> Vec<ChannelConfig> {
        if self.channels.is_empty() {
            DEFAULT_CHANNELS
                .iter()
                .map(|name| ChannelConfig::conventional(name))
                .collect()
        } else {
            self.channels.clone()
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    /// [`load_config`](Self::load_config) with a custom environment provider
    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in the current directory or the user config directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        let config_names = [
            "validate-feed.toml",
            "validate-feed.json",
            ".validate-feed.toml",
            ".validate-feed.json",
        ];

        for name in &config_names {
            let path = PathBuf::from(name);
            if path.exists() {
                return Ok(Some(Self::load_from_file(&path).await?));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let app_config_dir = config_dir.join("validate-feed");
            for name in &config_names {
                let path = app_config_dir.join(name);
                if path.exists() {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(domain) = env.get("VALIDATE_FEED_DOMAIN") {
            config.source.domain = Some(domain);
        }
        if let Some(api_key) = env.get("VALIDATE_FEED_API_KEY") {
            config.source.api_key = Some(api_key);
        }
        if let Some(timeout) = parse_env(env, "VALIDATE_FEED_TIMEOUT")? {
            config.source.timeout_seconds = timeout;
        }
        if let Some(retry_attempts) = parse_env(env, "VALIDATE_FEED_RETRY_ATTEMPTS")? {
            config.source.retry_attempts = retry_attempts;
        }

        if let Some(channel) = env.get("VALIDATE_FEED_CHANNEL") {
            config.run.channel = channel;
        }
        if let Some(limit) = env.get("VALIDATE_FEED_LIMIT") {
            config.run.limit = if limit.eq_ignore_ascii_case("all") {
                0
            } else {
                limit.parse().map_err(|_| {
                    ConfigError::Environment(format!("Invalid VALIDATE_FEED_LIMIT value: {}", limit))
                })?
            };
        }

        if let Some(output_dir) = env.get("VALIDATE_FEED_OUTPUT_DIR") {
            config.output.report_dir = PathBuf::from(output_dir);
        }
        if let Some(log_dir) = env.get("VALIDATE_FEED_LOG_DIR") {
            config.output.log_dir = PathBuf::from(log_dir);
        }
        if let Some(verbose) = parse_env(env, "VALIDATE_FEED_VERBOSE")? {
            config.output.verbose = verbose;
        }
        if let Some(quiet) = parse_env(env, "VALIDATE_FEED_QUIET")? {
            config.output.quiet = quiet;
        }

        if let Some(parallel) = parse_env(env, "VALIDATE_FEED_PARALLEL")? {
            config.validation.parallel = parallel;
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(channel) = &cli.channel {
            config.run.channel = channel.clone();
        }
        if let Some(limit) = cli.limit {
            config.run.limit = limit;
        }

        if let Some(domain) = &cli.domain {
            config.source.domain = Some(domain.clone());
        }
        if let Some(api_key) = &cli.api_key {
            config.source.api_key = Some(api_key.clone());
        }
        if let Some(input_file) = &cli.input_file {
            config.source.input_file = Some(input_file.clone());
        }
        if let Some(timeout) = cli.timeout {
            config.source.timeout_seconds = timeout;
        }
        if let Some(retry_attempts) = cli.retry_attempts {
            config.source.retry_attempts = retry_attempts;
        }

        // A --spec for a known channel replaces its file; new channels are appended
        if !cli.specs.is_empty() && config.channels.is_empty() {
            config.channels = config.effective_channels();
        }
        for (name, spec) in &cli.specs {
            match config.channels.iter_mut().find(|c| &c.name == name) {
                Some(channel) => channel.spec = spec.clone(),
                None => config.channels.push(ChannelConfig::new(name.clone(), spec.clone())),
            }
        }

        if let Some(output_dir) = &cli.output_dir {
            config.output.report_dir = output_dir.clone();
        }
        if let Some(log_dir) = &cli.log_dir {
            config.output.log_dir = log_dir.clone();
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        if cli.parallel {
            config.validation.parallel = true;
        }

        config
    }

    /// Merge two configurations (second takes precedence)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        base.run = override_config.run;

        if override_config.source.domain.is_some() {
            base.source.domain = override_config.source.domain;
        }
        if override_config.source.api_key.is_some() {
            base.source.api_key = override_config.source.api_key;
        }
        if override_config.source.input_file.is_some() {
            base.source.input_file = override_config.source.input_file;
        }
        base.source.timeout_seconds = override_config.source.timeout_seconds;
        base.source.retry_attempts = override_config.source.retry_attempts;
        base.source.retry_delay_ms = override_config.source.retry_delay_ms;

        if !override_config.channels.is_empty() {
            base.channels = override_config.channels;
        }

        base.output = override_config.output;
        base.validation = override_config.validation;

        base
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        let channels = config.effective_channels();

        for (index, channel) in channels.iter().enumerate() {
            if channel.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "Channel names cannot be empty".to_string(),
                ));
            }
            if channel.name == ALL_CHANNELS {
                return Err(ConfigError::Validation(format!(
                    "'{}' is reserved and cannot be used as a channel name",
                    ALL_CHANNELS
                )));
            }
            if channels[..index].iter().any(|c| c.name == channel.name) {
                return Err(ConfigError::Validation(format!(
                    "Channel '{}' is configured more than once",
                    channel.name
                )));
            }
        }

        if config.run.channel != ALL_CHANNELS
            && !channels.iter().any(|c| c.name == config.run.channel)
        {
            return Err(ConfigError::Validation(format!(
                "Unknown channel '{}', expected one of: {}, {}",
                config.run.channel,
                ALL_CHANNELS,
                channels
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        if config.source.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if config.source.retry_attempts > 10 {
            return Err(ConfigError::Validation(
                "Retry attempts cannot exceed 10".to_string(),
            ));
        }

        if config.source.input_file.is_none()
            && (config.source.domain.is_none() || config.source.api_key.is_none())
        {
            return Err(ConfigError::Validation(
                "Either an input file or both a domain and an API key must be given".to_string(),
            ));
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T: FromStr>(env: &impl EnvProvider, key: &str) -> Result<Option<T>> {
    env.get(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Mock environment variable provider for testing
    #[derive(Default)]
    struct MockEnvProvider {
        vars: HashMap<String, String>,
    }

    impl MockEnvProvider {
        fn new() -> Self {
            Self::default()
        }

        fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
            self.vars.insert(key.into(), value.into());
        }
    }

    impl EnvProvider for MockEnvProvider {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).cloned()
        }
    }

    fn file_source_config() -> Config {
        let mut config = Config::default();
        config.source.input_file = Some(PathBuf::from("feed.xml"));
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.run.channel, "all");
        assert_eq!(config.run.limit, 0);
        assert_eq!(config.source.domain, None);
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.source.retry_attempts, 3);
        assert!(config.channels.is_empty());
        assert_eq!(config.output.report_dir, PathBuf::from("reports"));
        assert_eq!(config.output.log_dir, PathBuf::from("log"));
        assert!(!config.validation.parallel);
        assert_eq!(config.verbosity(), VerbosityLevel::Normal);

        let channels: Vec<String> = config
            .effective_channels()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(channels, vec!["movie", "game", "website", "tv", "book", "music"]);
        assert_eq!(
            config.effective_channels()[0].spec,
            PathBuf::from("etc/movie_element.json")
        );
    }

    #[tokio::test]
    async fn test_load_toml_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("validate-feed.toml");

        let toml_content = r#"
[run]
channel = "game"
limit = 50

[source]
domain = "example.com"
api_key = "k3y"
timeout_seconds = 60
retry_attempts = 5

[[channels]]
name = "movie"
spec = "specs/movie.json"

[[channels]]
name = "game"
spec = "specs/game.json"

[output]
report_dir = "/tmp/reports"
verbose = true

[validation]
parallel = true
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = ConfigManager::load_from_file(&config_path).await.unwrap();

        assert_eq!(config.run.channel, "game");
        assert_eq!(config.run.limit, 50);
        assert_eq!(config.source.domain.as_deref(), Some("example.com"));
        assert_eq!(config.source.timeout_seconds, 60);
        assert_eq!(config.source.retry_attempts, 5);
        assert_eq!(config.source.retry_delay_ms, 1000);
        assert_eq!(
            config.channels,
            vec![
                ChannelConfig::new("movie", "specs/movie.json"),
                ChannelConfig::new("game", "specs/game.json"),
            ]
        );
        assert_eq!(config.output.report_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(config.output.log_dir, PathBuf::from("log"));
        assert!(config.output.verbose);
        assert!(config.validation.parallel);
    }

    #[tokio::test]
    async fn test_load_json_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("validate-feed.json");

        let json_content = r#"{
  "source": { "input_file": "fixtures/feed.xml" },
  "channels": [ { "name": "book", "spec": "etc/book_element.json" } ],
  "output": { "quiet": true }
}"#;
        fs::write(&config_path, json_content).unwrap();

        let config = ConfigManager::load_from_file(&config_path).await.unwrap();

        assert_eq!(
            config.source.input_file,
            Some(PathBuf::from("fixtures/feed.xml"))
        );
        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.verbosity(), VerbosityLevel::Quiet);
        assert_eq!(config.run.channel, "all");
    }

    #[tokio::test]
    async fn test_unsupported_file_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        fs::write(&config_path, "invalid: yaml").unwrap();

        match ConfigManager::load_from_file(&config_path).await {
            Err(ConfigError::UnsupportedFormat(ext)) => assert_eq!(ext, "yaml"),
            other => panic!("Expected UnsupportedFormat error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_toml_and_json() {
        let temp_dir = TempDir::new().unwrap();

        let toml_path = temp_dir.path().join("config.toml");
        fs::write(&toml_path, "invalid toml [[[").unwrap();
        assert!(matches!(
            ConfigManager::load_from_file(&toml_path).await,
            Err(ConfigError::TomlParsing(_))
        ));

        let json_path = temp_dir.path().join("config.json");
        fs::write(&json_path, "{ invalid json }").unwrap();
        assert!(matches!(
            ConfigManager::load_from_file(&json_path).await,
            Err(ConfigError::JsonParsing(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let mut mock_env = MockEnvProvider::new();
        mock_env.set("VALIDATE_FEED_DOMAIN", "env.example.com");
        mock_env.set("VALIDATE_FEED_API_KEY", "env-key");
        mock_env.set("VALIDATE_FEED_CHANNEL", "tv");
        mock_env.set("VALIDATE_FEED_LIMIT", "all");
        mock_env.set("VALIDATE_FEED_OUTPUT_DIR", "/env/reports");
        mock_env.set("VALIDATE_FEED_TIMEOUT", "120");
        mock_env.set("VALIDATE_FEED_PARALLEL", "true");
        mock_env.set("VALIDATE_FEED_QUIET", "true");

        let mut base = Config::default();
        base.run.limit = 10;
        let config = ConfigManager::apply_environment_overrides_with(&mock_env, base).unwrap();

        assert_eq!(config.source.domain.as_deref(), Some("env.example.com"));
        assert_eq!(config.source.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.run.channel, "tv");
        assert_eq!(config.run.limit, 0);
        assert_eq!(config.output.report_dir, PathBuf::from("/env/reports"));
        assert_eq!(config.source.timeout_seconds, 120);
        assert!(config.validation.parallel);
        assert!(config.output.quiet);
    }

    #[test]
    fn test_invalid_environment_values() {
        for (key, value) in [
            ("VALIDATE_FEED_TIMEOUT", "soon"),
            ("VALIDATE_FEED_LIMIT", "-1"),
            ("VALIDATE_FEED_PARALLEL", "yes please"),
        ] {
            let mut mock_env = MockEnvProvider::new();
            mock_env.set(key, value);

            let result = ConfigManager::apply_environment_overrides_with(&mock_env, Config::default());
            assert!(
                matches!(result, Err(ConfigError::Environment(ref msg)) if msg.contains(key)),
                "{} = {:?}",
                key,
                value
            );
        }
    }

    #[test]
    fn test_merge_with_cli() {
        use clap::Parser;

        let cli = Cli::try_parse_from([
            "validate-feed",
            "--channel",
            "movie",
            "--limit",
            "5",
            "--timeout",
            "90",
            "--spec",
            "movie=custom/movie.json",
            "--spec",
            "show=custom/show.json",
            "--verbose",
        ])
        .unwrap();

        let mut base = Config::default();
        base.output.quiet = true;
        base.source.retry_attempts = 7;
        let config = ConfigManager::merge_with_cli(base, &cli);

        assert_eq!(config.run.channel, "movie");
        assert_eq!(config.run.limit, 5);
        assert_eq!(config.source.timeout_seconds, 90);
        assert_eq!(config.source.retry_attempts, 7);
        assert!(config.output.verbose);
        assert!(!config.output.quiet);

        assert_eq!(config.channels.len(), 7);
        assert_eq!(config.channels[0], ChannelConfig::new("movie", "custom/movie.json"));
        assert_eq!(config.channels[1], ChannelConfig::conventional("game"));
        assert_eq!(config.channels[6], ChannelConfig::new("show", "custom/show.json"));
    }

    #[test]
    fn test_merge_configs() {
        let mut base = Config::default();
        base.source.domain = Some("base.example.com".to_string());
        base.channels = vec![ChannelConfig::new("movie", "a.json")];

        let mut override_config = Config::default();
        override_config.source.timeout_seconds = 60;

        let merged = ConfigManager::merge_configs(base, override_config);

        assert_eq!(merged.source.domain.as_deref(), Some("base.example.com"));
        assert_eq!(merged.source.timeout_seconds, 60);
        assert_eq!(merged.channels, vec![ChannelConfig::new("movie", "a.json")]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = file_source_config();
        assert!(ConfigManager::validate_config(&config).is_ok());

        config.run.channel = "radio".to_string();
        assert!(ConfigManager::validate_config(&config).is_err());
        config.run.channel = "book".to_string();
        assert!(ConfigManager::validate_config(&config).is_ok());

        config.source.timeout_seconds = 0;
        assert!(ConfigManager::validate_config(&config).is_err());
        config.source.timeout_seconds = 30;

        config.source.retry_attempts = 11;
        assert!(ConfigManager::validate_config(&config).is_err());
        config.source.retry_attempts = 3;

        config.output.verbose = true;
        config.output.quiet = true;
        assert!(ConfigManager::validate_config(&config).is_err());
        config.output.quiet = false;

        config.channels = vec![
            ChannelConfig::new("movie", "a.json"),
            ChannelConfig::new("movie", "b.json"),
        ];
        config.run.channel = "all".to_string();
        assert!(ConfigManager::validate_config(&config).is_err());

        config.channels = vec![ChannelConfig::new("all", "a.json")];
        assert!(ConfigManager::validate_config(&config).is_err());
    }

    #[test]
    fn test_source_is_required() {
        let mut config = Config::default();
        assert!(ConfigManager::validate_config(&config).is_err());

        config.source.domain = Some("example.com".to_string());
        assert!(ConfigManager::validate_config(&config).is_err());

        config.source.api_key = Some("k3y".to_string());
        assert!(ConfigManager::validate_config(&config).is_ok());
    }

    #[test]
    fn test_http_client_config() {
        let mut config = Config::default();
        config.source.timeout_seconds = 5;
        config.source.retry_attempts = 1;

        let http = config.http_client_config();
        assert_eq!(http.timeout_seconds, 5);
        assert_eq!(http.retry_attempts, 1);
        assert_eq!(http.retry_delay_ms, 1000);
    }

    #[tokio::test]
    async fn test_load_config_precedence() {
        use clap::Parser;

        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        fs::write(
            &config_path,
            r#"
[run]
limit = 20

[source]
input_file = "feed.xml"
timeout_seconds = 45
retry_attempts = 2

[output]
log_dir = "file-logs"
"#,
        )
        .unwrap();

        let mut env = MockEnvProvider::new();
        env.set("VALIDATE_FEED_RETRY_ATTEMPTS", "4");
        env.set("VALIDATE_FEED_LOG_DIR", "env-logs");

        let cli = Cli::try_parse_from([
            "validate-feed",
            "--config",
            config_path.to_str().unwrap(),
            "--log-dir",
            "cli-logs",
        ])
        .unwrap();

        let config = ConfigManager::load_config_with(&cli, &env).await.unwrap();

        assert_eq!(config.run.limit, 20);
        assert_eq!(config.source.timeout_seconds, 45);
        assert_eq!(config.source.retry_attempts, 4);
        assert_eq!(config.output.log_dir, PathBuf::from("cli-logs"));
        assert_eq!(config.output.report_dir, PathBuf::from("reports"));
    }
}
