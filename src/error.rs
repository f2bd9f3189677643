use std::path::PathBuf;

use thiserror::Error;

/// Structural and I/O failures.
///
/// Any of these aborts the run of a single channel. The channel runner catches
/// them so sibling channels keep going.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status error: {status} for {url} - {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Request timeout: {url} after {timeout_seconds} seconds")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("Document parsing error: {source_name} - {details}")]
    DocumentParse {
        source_name: String,
        details: String,
    },

    #[error("Unable to locate container element '{selector}'")]
    ContainerNotFound { selector: String },

    #[error("Invalid container selector: {0}")]
    InvalidContainerSelector(#[from] EvaluationFault),

    #[error("Spec loading error: {path} - {details}")]
    SpecLoad { path: PathBuf, details: String },

    #[error("No spec configured for channel '{channel}'")]
    UnknownChannel { channel: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Internal error while attempting a single comparison.
///
/// Never escapes the element or attribute being evaluated: the validator turns
/// it into a `BLOCK` result whose message is the `Display` text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationFault {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Unbound namespace prefix '{prefix}' in selector '{selector}'")]
    UnboundPrefix { prefix: String, selector: String },
}

impl From<crate::config::ConfigError> for FeedError {
    fn from(err: crate::config::ConfigError) -> Self {
        FeedError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FeedError>;

/// Result type for a single comparison
pub type EvalResult<T> = std::result::Result<T, EvaluationFault>;
