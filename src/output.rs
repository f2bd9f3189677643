//! Console Output
//!
//! Per-channel summary lines for the terminal.

use std::time::Duration;

use crate::cli::VerbosityLevel;
use crate::runner::{ChannelOutcome, ChannelReport};
use crate::validator::TestStatus;

/// Human-readable console formatter
#[derive(Debug, Clone)]
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Formatter that never emits colour codes
    pub fn plain(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: false,
        }
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn status_label(&self, status: TestStatus) -> String {
        match status {
            TestStatus::Pass => self.colorize("✓ PASS", "32"),
            TestStatus::Fail => self.colorize("✗ FAIL", "31"),
            TestStatus::Block => self.colorize("⚠ BLOCK", "33"),
        }
    }

    pub fn print_outcome(&self, outcome: &ChannelOutcome) {
        let text = self.format_outcome(outcome);
        if !text.is_empty() {
            println!("{}", text);
        }
    }

    /// Summary of one channel; empty when there is nothing to show at this verbosity
    pub fn format_outcome(&self, outcome: &ChannelOutcome) -> String {
        match outcome {
            ChannelOutcome::Completed(report) => self.format_report(report),
            ChannelOutcome::Aborted { channel, error } => format!(
                "{}  channel '{}' - {}",
                self.colorize("⚠ ABORTED", "35"),
                channel,
                error
            ),
        }
    }

    fn format_report(&self, report: &ChannelReport) -> String {
        let status = report.status();
        if self.verbosity == VerbosityLevel::Quiet && status.is_pass() {
            return String::new();
        }

        let mut output = format!(
            "{}  channel '{}' ({})",
            self.status_label(status),
            report.channel,
            format_duration(report.duration())
        );

        if self.verbosity >= VerbosityLevel::Normal {
            output.push_str(&format!(
                "\n  Containers: {}  {} {}  {} {}  {} {}",
                report.containers(),
                self.colorize("Passed:", "32"),
                report.count(TestStatus::Pass),
                self.colorize("Failed:", "31"),
                report.count(TestStatus::Fail),
                self.colorize("Blocked:", "33"),
                report.count(TestStatus::Block)
            ));
            output.push_str(&format!("\n  Report: {}", report.report_path.display()));
        }

        if self.verbosity >= VerbosityLevel::Verbose {
            for summary in report.summaries.iter().filter(|s| !s.status().is_pass()) {
                output.push_str(&format!(
                    "\n    {} container {}",
                    self.status_label(summary.status()),
                    summary.container_id
                ));
            }
        }

        output
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
