//! # validate-feed Library
//!
//! Validates catalog XML feeds against declarative element specifications.
//! A recursive engine walks each expectation tree alongside the document,
//! producing PASS / FAIL / BLOCK results per element, attribute and value,
//! and the channel runner turns them into text reports and a run log.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod expectation;
pub mod http_client;
pub mod matcher;
pub mod output;
pub mod report;
pub mod run_log;
pub mod runner;
pub mod sink;
pub mod source;
pub mod validator;

pub use cli::{Cli, VerbosityLevel};
pub use config::{ChannelConfig, Config, ConfigError, ConfigManager};
pub use document::{Selection, Selector, parse_document};
pub use error::{EvaluationFault, FeedError};
pub use expectation::{AttributeSpec, ContainerSpec, ElementSpec, ValueExpr};
pub use http_client::{AsyncHttpClient, HttpClientConfig};
pub use matcher::{Mismatch, match_value};
pub use output::Output;
pub use run_log::RunLog;
pub use runner::{
    ChannelOutcome, ChannelReport, ChannelRunner, ChannelSpec, RunSummary, SpecSource, exit_code,
    run_container,
};
pub use sink::{FileSink, LineSink, MemorySink};
pub use source::{DocumentSource, FileDocumentSource, HttpDocumentSource};
pub use validator::{
    AttributeResult, AttributesResult, ChildrenResult, TestStatus, ValidationResult, ValueResult,
    validate_attributes, validate_element,
};
