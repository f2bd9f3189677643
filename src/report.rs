//! Text rendering of channel reports.
//!
//! Only failing and blocked nodes are written out. Every container keeps its
//! header block so the report shows which records were tested.

use chrono::{DateTime, Local};

use crate::runner::{ChannelReport, RunSummary, TIMESTAMP_FORMAT};
use crate::run_log::rule_line;
use crate::validator::{TestStatus, ValidationResult};

pub fn render_header(channel: &str, started_at: DateTime<Local>) -> Vec<String> {
    vec![
        format!("Report for channel '{}'", channel),
        format!("Test started at {}", started_at.format(TIMESTAMP_FORMAT)),
        String::new(),
    ]
}

/// One block per container
pub fn render_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![
        rule_line('='),
        format!("Tested element ID: {}", summary.container_id),
        format!("Test result: {}", summary.status()),
        rule_line('='),
    ];

    for result in &summary.results {
        render_element(result, 0, &mut lines);
    }

    lines.extend([String::new(), String::new(), String::new()]);
    lines
}

pub fn render_footer(report: &ChannelReport) -> Vec<String> {
    vec![
        rule_line('='),
        format!(
            "Test finished at {}",
            report.finished_at.format(TIMESTAMP_FORMAT)
        ),
        format!("Duration: {:.2}s", report.duration().as_secs_f64()),
        format!(
            "Containers tested: {}, passed: {}, failed: {}, blocked: {}",
            report.containers(),
            report.count(TestStatus::Pass),
            report.count(TestStatus::Fail),
            report.count(TestStatus::Block)
        ),
        format!("Element checks per container: {}", report.node_count),
        format!("Channel result: {}", report.status()),
        rule_line('='),
    ]
}

fn render_element(result: &ValidationResult, depth: usize, lines: &mut Vec<String>) {
    if result.status.is_pass() {
        return;
    }

    let indent = "  ".repeat(depth);
    let label = if depth == 0 { "Element" } else { "Child element" };
    lines.push(format!(
        "{}{} #{}: <{}> {}",
        indent, label, result.id, result.name, result.status
    ));

    // Not found, or blocked before any sub-check ran
    if result.sub_statuses().is_empty() {
        lines.push(format!(
            "{}{} - {}",
            indent,
            result.status,
            result.message.as_deref().unwrap_or_default()
        ));
        lines.push(rule_line('-'));
        return;
    }

    if let Some(value) = &result.value_result
        && !value.status.is_pass()
    {
        lines.push(String::new());
        lines.push(format!("{}Element value validation", indent));
        lines.push(format!(
            "{}{} - {}",
            indent,
            value.status,
            value.message.as_deref().unwrap_or_default()
        ));
        lines.push(format!("{}Expected value: {}", indent, value.expected));
        lines.push(format!("{}Actual value: {}", indent, value.actual));
        lines.push(rule_line('-'));
    }

    if let Some(attributes) = &result.attributes_result
        && !attributes.status.is_pass()
    {
        lines.push(String::new());
        lines.push(format!("{}Attribute validation:", indent));
        for attribute in attributes
            .per_attribute
            .iter()
            .filter(|a| !a.status.is_pass())
        {
            lines.push(format!(
                "{}{} - Attribute #{}: {}",
                indent, attribute.status, attribute.id, attribute.name
            ));
            lines.push(format!("{}Expected value: {}", indent, attribute.expected));
            lines.push(format!("{}Actual value: {}", indent, attribute.actual));
            lines.push(format!(
                "{}Test message: {}",
                indent,
                attribute.message.as_deref().unwrap_or_default()
            ));
            lines.push(rule_line('-'));
        }
    }

    if let Some(children) = &result.children_result
        && !children.status.is_pass()
    {
        lines.push(String::new());
        lines.push(format!("{}Child elements validation:", indent));
        for child in &children.children {
            render_element(child, depth + 1, lines);
        }
    }
}
