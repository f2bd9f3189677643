//! Container and channel orchestration
//!
//! The container runner selects the repeating record nodes of a document and
//! validates each one against the element expectations of a [`ContainerSpec`].
//! The channel runner drives one or all configured channels: fetch, parse,
//! validate, and write the report and run log. A structural failure aborts only
//! the channel it happened in.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Local};
use rayon::prelude::*;
use regex::Regex;
use roxmltree::Document;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::document::{Selection, Selector, parse_document};
use crate::error::{FeedError, Result};
use crate::expectation::ContainerSpec;
use crate::output::Output;
use crate::report;
use crate::run_log::RunLog;
use crate::sink::{FileSink, LineSink};
use crate::source::DocumentSource;
use crate::validator::{TestStatus, ValidationResult, validate_elements};

/// Channel selection that runs every configured channel
pub const ALL_CHANNELS: &str = "all";

/// Timestamp format for human-readable start and finish lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cached regex for the numeric part of a container id
static CONTAINER_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_container_id_regex() -> &'static Regex {
    CONTAINER_ID_REGEX
        .get_or_init(|| Regex::new(r"[0-9]+").expect("Failed to compile container id regex"))
}

/// Validation results for one container node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub container_id: String,
    pub results: Vec<ValidationResult>,
}

impl RunSummary {
    pub fn status(&self) -> TestStatus {
        TestStatus::aggregate(self.results.iter().map(|r| r.status))
    }
}

/// A container's results together with the log lines produced while validating it
#[derive(Debug, Clone)]
pub struct ContainerRun {
    pub summary: RunSummary,
    pub log: RunLog,
}

/// First run of ASCII digits in the text of the container's `id` descendants
pub fn container_id(container: &Selection) -> String {
    let text = Selector::parse("id")
        .and_then(|selector| container.select(&selector))
        .map(|ids| ids.text())
        .unwrap_or_default();

    get_container_id_regex()
        .find(&text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Select the container nodes for `spec`, failing if there are none
pub fn select_containers<'a, 'input>(
    document: &'a Document<'input>,
    spec: &ContainerSpec,
) -> Result<Vec<Selection<'a, 'input>>> {
    let selector = Selector::parse(&spec.container_selector)?;
    let containers = Selection::document(document).select(&selector)?;

    if containers.is_empty() {
        return Err(FeedError::ContainerNotFound {
            selector: spec.container_selector.clone(),
        });
    }

    Ok(containers.split().collect())
}

/// Validate one container node against every top-level expectation
pub fn validate_container(container: &Selection, spec: &ContainerSpec) -> ContainerRun {
    let container_id = container_id(container);

    let mut log = RunLog::new();
    log.blank();
    log.rule('=');
    log.line(format!("Test element id is {}", container_id));
    log.rule('=');

    let results = validate_elements(container, &spec.elements, &mut log);

    ContainerRun {
        summary: RunSummary {
            container_id,
            results,
        },
        log,
    }
}

/// Validate every container in document order.
///
/// With `parallel`, containers are validated on the rayon pool; the returned
/// runs (and their logs) are still in document order.
pub fn run_containers(
    document: &Document,
    spec: &ContainerSpec,
    parallel: bool,
) -> Result<Vec<ContainerRun>> {
    let containers = select_containers(document, spec)?;

    let runs = if parallel {
        containers
            .par_iter()
            .map(|container| validate_container(container, spec))
            .collect()
    } else {
        containers
            .iter()
            .map(|container| validate_container(container, spec))
            .collect()
    };

    Ok(runs)
}

/// Validate every container of `document` against `spec`
pub fn run_container(document: &Document, spec: &ContainerSpec) -> Result<Vec<RunSummary>> {
    Ok(run_containers(document, spec, false)?
        .into_iter()
        .map(|run| run.summary)
        .collect())
}

/// Expectations for one channel
#[derive(Debug, Clone)]
pub struct ChannelSpec {
    pub channel: String,
    pub source: SpecSource,
}

/// Where a channel's expectations come from
#[derive(Debug, Clone)]
pub enum SpecSource {
    Loaded(ContainerSpec),
    /// Read when the channel runs, so a bad file aborts only that channel
    File(PathBuf),
}

impl ChannelSpec {
    pub fn new(channel: impl Into<String>, spec: ContainerSpec) -> Self {
        Self {
            channel: channel.into(),
            source: SpecSource::Loaded(spec),
        }
    }

    pub fn from_file(channel: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            channel: channel.into(),
            source: SpecSource::File(path.into()),
        }
    }

    pub async fn load(&self) -> Result<Cow<'_, ContainerSpec>> {
        match &self.source {
            SpecSource::Loaded(spec) => Ok(Cow::Borrowed(spec)),
            SpecSource::File(path) => ContainerSpec::load(path).await.map(Cow::Owned),
        }
    }
}

/// Summary of a channel that ran to completion
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub summaries: Vec<RunSummary>,
    /// Element expectations checked per container
    pub node_count: usize,
    pub report_path: PathBuf,
}

impl ChannelReport {
    pub fn containers(&self) -> usize {
        self.summaries.len()
    }

    pub fn count(&self, status: TestStatus) -> usize {
        self.summaries
            .iter()
            .filter(|summary| summary.status() == status)
            .count()
    }

    pub fn status(&self) -> TestStatus {
        TestStatus::aggregate(self.summaries.iter().map(RunSummary::status))
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// Result of running one channel
#[derive(Debug)]
pub enum ChannelOutcome {
    Completed(ChannelReport),
    Aborted { channel: String, error: FeedError },
}

impl ChannelOutcome {
    pub fn channel(&self) -> &str {
        match self {
            ChannelOutcome::Completed(report) => &report.channel,
            ChannelOutcome::Aborted { channel, .. } => channel,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, ChannelOutcome::Aborted { .. })
    }
}

/// Process exit code for a set of outcomes: 0 when everything passed, 1 when
/// any container failed or blocked, 2 when any channel aborted
pub fn exit_code(outcomes: &[ChannelOutcome]) -> i32 {
    if outcomes.iter().any(ChannelOutcome::is_aborted) {
        2
    } else if outcomes.iter().any(|outcome| match outcome {
        ChannelOutcome::Completed(report) => !report.status().is_pass(),
        ChannelOutcome::Aborted { .. } => false,
    }) {
        1
    } else {
        0
    }
}

/// Runs configured channels against a document source
pub struct ChannelRunner {
    source: Arc<dyn DocumentSource>,
    channels: Vec<ChannelSpec>,
    report_dir: PathBuf,
    log_sink: Arc<dyn LineSink>,
    limit: u32,
    parallel: bool,
    output: Option<Output>,
}

impl ChannelRunner {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        channels: Vec<ChannelSpec>,
        report_dir: PathBuf,
        log_sink: Arc<dyn LineSink>,
    ) -> Self {
        Self {
            source,
            channels,
            report_dir,
            log_sink,
            limit: 0,
            parallel: false,
            output: None,
        }
    }

    /// Maximum number of records requested from the source; 0 means no limit
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Print a console summary after each channel
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.channel.as_str()).collect()
    }

    /// Run `selection`: a single channel name, or [`ALL_CHANNELS`].
    ///
    /// Errors only when the run log itself cannot be written; every channel
    /// failure is reported as [`ChannelOutcome::Aborted`].
    pub async fn run(&self, selection: &str) -> Result<Vec<ChannelOutcome>> {
        self.log_line(format!(
            "Test started at {}",
            Local::now().format(TIMESTAMP_FORMAT)
        ))
        .await?;

        let selected: Vec<std::result::Result<&ChannelSpec, String>> =
            if selection == ALL_CHANNELS {
                self.log_line("Selected all channels for test").await?;
                self.channels.iter().map(Ok).collect()
            } else {
                self.log_line(format!("Selected '{}' channel for test", selection))
                    .await?;
                vec![
                    self.channels
                        .iter()
                        .find(|c| c.channel == selection)
                        .ok_or_else(|| selection.to_string()),
                ]
            };

        let mut outcomes = Vec::with_capacity(selected.len());
        for channel_spec in selected {
            let outcome = match channel_spec {
                Ok(channel_spec) => match self.run_channel(channel_spec).await {
                    Ok(report) => ChannelOutcome::Completed(report),
                    Err(error) => ChannelOutcome::Aborted {
                        channel: channel_spec.channel.clone(),
                        error,
                    },
                },
                Err(channel) => ChannelOutcome::Aborted {
                    error: FeedError::UnknownChannel {
                        channel: channel.clone(),
                    },
                    channel,
                },
            };

            if let ChannelOutcome::Aborted { channel, error } = &outcome {
                warn!(channel = %channel, %error, "channel aborted");
                self.log_line(error.to_string()).await?;
            }
            if let Some(output) = &self.output {
                output.print_outcome(&outcome);
            }
            outcomes.push(outcome);
        }

        self.log_line(format!(
            "Test finished at {}",
            Local::now().format(TIMESTAMP_FORMAT)
        ))
        .await?;

        Ok(outcomes)
    }

    async fn run_channel(&self, channel_spec: &ChannelSpec) -> Result<ChannelReport> {
        let channel = channel_spec.channel.as_str();
        let started_at = Local::now();

        info!(channel, "starting channel");
        self.log_line(format!("Starting test for channel '{}'", channel))
            .await?;

        let spec = channel_spec.load().await?;
        let spec: &ContainerSpec = &spec;
        debug!(channel, nodes = spec.node_count(), "spec loaded");

        let text = self.source.fetch(channel, self.limit).await?;
        let document = parse_document(channel, &text)?;
        self.log_line("XML is loaded!").await?;

        let containers = select_containers(&document, spec)?;
        debug!(channel, containers = containers.len(), "containers selected");

        let report_sink = FileSink::report(&self.report_dir, channel, started_at);
        report_sink
            .create(&report::render_header(channel, started_at))
            .await?;

        let mut summaries = Vec::with_capacity(containers.len());
        if self.parallel {
            let runs: Vec<ContainerRun> = containers
                .par_iter()
                .map(|container| validate_container(container, spec))
                .collect();
            for run in runs {
                self.flush_container(&report_sink, &run).await?;
                summaries.push(run.summary);
            }
        } else {
            for container in &containers {
                let run = validate_container(container, spec);
                self.flush_container(&report_sink, &run).await?;
                summaries.push(run.summary);
            }
        }

        let report = ChannelReport {
            channel: channel.to_string(),
            started_at,
            finished_at: Local::now(),
            summaries,
            node_count: spec.node_count(),
            report_path: report_sink.path().to_path_buf(),
        };

        report_sink.append(&report::render_footer(&report)).await?;
        self.log_line(format!(
            "Finished test for channel '{}', Test result: {}",
            channel,
            report.status()
        ))
        .await?;
        info!(
            channel,
            containers = report.containers(),
            status = %report.status(),
            report = %report.report_path.display(),
            "channel finished"
        );

        Ok(report)
    }

    async fn flush_container(&self, report_sink: &FileSink, run: &ContainerRun) -> Result<()> {
        self.log_sink.append(run.log.lines()).await?;
        report_sink
            .append(&report::render_summary(&run.summary))
            .await
    }

    async fn log_line(&self, line: impl Into<String>) -> Result<()> {
        self.log_sink.append(&[line.into()]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::{AttributeSpec, ElementSpec};

    const FEED: &str = r#"<reviews>
  <review>
    <id>review-101-a7</id>
    <title>Up</title>
    <rating scheme="urn:mpaa">PG</rating>
  </review>
  <review>
    <id>no digits</id>
    <title></title>
  </review>
  <review>
    <meta><id>x-303</id></meta>
    <title>Cars</title>
    <rating scheme="urn:none">G</rating>
  </review>
</reviews>"#;

    fn spec() -> ContainerSpec {
        ContainerSpec::new(
            "review",
            vec![
                ElementSpec::new("1", "title").with_value("*"),
                ElementSpec::new("2", "rating")
                    .with_attributes(vec![AttributeSpec::new("1", "scheme", "urn:mpaa")]),
            ],
        )
    }

    #[test]
    fn test_container_ids() {
        let doc = parse_document("feed", FEED).unwrap();
        let containers = select_containers(&doc, &spec()).unwrap();
        let ids: Vec<String> = containers.iter().map(container_id).collect();
        assert_eq!(ids, vec!["101", "", "303"]);
    }

    #[test]
    fn test_run_container_document_order() {
        let doc = parse_document("feed", FEED).unwrap();
        let summaries = run_container(&doc, &spec()).unwrap();

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].status(), TestStatus::Pass);

        assert_eq!(summaries[1].results[0].status, TestStatus::Fail);
        assert_eq!(
            summaries[1].results[0].message.as_deref(),
            Some("Element value is empty!")
        );
        assert_eq!(summaries[1].results[1].message.as_deref(), Some("Element not exist!"));

        assert_eq!(summaries[2].results[0].status, TestStatus::Pass);
        assert_eq!(summaries[2].results[1].status, TestStatus::Fail);
    }

    #[test]
    fn test_missing_container_is_structural() {
        let doc = parse_document("feed", FEED).unwrap();
        let result = run_container(&doc, &ContainerSpec::new("item", spec().elements));
        assert!(matches!(
            result,
            Err(FeedError::ContainerNotFound { ref selector }) if selector == "item"
        ));

        let invalid = run_container(&doc, &ContainerSpec::new("re view", vec![]));
        assert!(matches!(invalid, Err(FeedError::InvalidContainerSelector(_))));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let doc = parse_document("feed", FEED).unwrap();
        let sequential = run_containers(&doc, &spec(), false).unwrap();
        let parallel = run_containers(&doc, &spec(), true).unwrap();

        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.summary, b.summary);
            assert_eq!(a.log, b.log);
        }
    }

    #[test]
    fn test_container_log_header() {
        let doc = parse_document("feed", FEED).unwrap();
        let runs = run_containers(&doc, &spec(), false).unwrap();
        assert!(runs[0].log.contains("Test element id is 101"));
        assert!(runs[2].log.contains("Test element id is 303"));
    }

    #[test]
    fn test_exit_code() {
        let make_report = |status_value: &str| ChannelReport {
            channel: "movie".to_string(),
            started_at: Local::now(),
            finished_at: Local::now(),
            summaries: vec![RunSummary {
                container_id: "1".to_string(),
                results: vec![ValidationResult {
                    id: "1".to_string(),
                    name: "title".to_string(),
                    status: if status_value == "pass" {
                        TestStatus::Pass
                    } else {
                        TestStatus::Block
                    },
                    message: None,
                    value_result: None,
                    attributes_result: None,
                    children_result: None,
                }],
            }],
            node_count: 1,
            report_path: PathBuf::from("report.txt"),
        };

        assert_eq!(exit_code(&[]), 0);
        assert_eq!(exit_code(&[ChannelOutcome::Completed(make_report("pass"))]), 0);
        assert_eq!(
            exit_code(&[
                ChannelOutcome::Completed(make_report("pass")),
                ChannelOutcome::Completed(make_report("block")),
            ]),
            1
        );
        assert_eq!(
            exit_code(&[
                ChannelOutcome::Completed(make_report("block")),
                ChannelOutcome::Aborted {
                    channel: "game".to_string(),
                    error: FeedError::UnknownChannel {
                        channel: "game".to_string()
                    },
                },
            ]),
            2
        );
    }
}
