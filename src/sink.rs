//! Append-only text sinks for reports and run logs.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Timestamp format shared by report and log file names
const FILE_STAMP_FORMAT: &str = "%Y_%m_%d_%H_%M";

/// Append-only line writer.
///
/// Callers pass complete blocks of lines; an implementation must write a block
/// without interleaving it with other blocks.
#[async_trait]
pub trait LineSink: Send + Sync {
    async fn append(&self, lines: &[String]) -> Result<()>;
}

/// Appends to a file, creating it (and its directory) on first write
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `{dir}/{stamp}_{channel}_channel.txt`
    pub fn report(dir: &Path, channel: &str, started_at: DateTime<Local>) -> Self {
        Self::new(dir.join(format!(
            "{}_{}_channel.txt",
            started_at.format(FILE_STAMP_FORMAT),
            channel
        )))
    }

    /// `{dir}/{stamp}.log`
    pub fn log(dir: &Path, started_at: DateTime<Local>) -> Self {
        Self::new(dir.join(format!("{}.log", started_at.format(FILE_STAMP_FORMAT))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start the file afresh with `lines`, replacing any earlier content
    pub async fn create(&self, lines: &[String]) -> Result<()> {
        self.write(lines, true).await
    }

    async fn write(&self, lines: &[String], truncate: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut block = String::new();
        for line in lines {
            block.push_str(line);
            block.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(!truncate)
            .truncate(truncate)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl LineSink for FileSink {
    async fn append(&self, lines: &[String]) -> Result<()> {
        self.write(lines, false).await
    }
}

/// In-memory sink, used when output is not persisted
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }
}

#[async_trait]
impl LineSink for MemorySink {
    async fn append(&self, lines: &[String]) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(lines);
        Ok(())
    }
}
