//! Narrative log of every comparison made during a run.
//!
//! The validator writes into a [`RunLog`] owned by the caller instead of a
//! shared global; the runner flushes each container's buffer through a
//! [`LineSink`](crate::sink::LineSink) in document order.

/// Width of separator rules in logs and reports
pub const RULE_WIDTH: usize = 120;

/// A full-width separator made of `ch`
pub fn rule_line(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn rule(&mut self, ch: char) {
        self.lines.push(rule_line(ch));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Move the buffered lines out, leaving the log empty
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}
