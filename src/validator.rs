//! Recursive Validation Engine
//!
//! Walks an expectation tree alongside a document tree:
//! - **Existence**: the named element must be present below the context
//! - **Value**: element text against a literal, wildcard or enumeration
//! - **Attributes**: each expected attribute, evaluated independently
//! - **Children**: nested expectations, validated against the matched element
//!
//! Every check produces a typed result instead of raising. Expectation
//! mismatches become `FAIL`; internal faults (bad selectors, unbound
//! namespace prefixes) become `BLOCK` at the node that produced them, and siblings
//! keep being validated.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::{Selection, Selector};
use crate::error::{EvalResult, EvaluationFault};
use crate::expectation::{AttributeSpec, ElementSpec, ValueExpr};
use crate::matcher::{Mismatch, match_value};
use crate::run_log::RunLog;

/// Message for an element missing from the document
pub const ELEMENT_NOT_EXIST: &str = "Element not exist!";

/// Outcome of a single check.
///
/// Variants are ordered by precedence, so the aggregate of several statuses is
/// their maximum: any `Fail` wins, then any `Block`, otherwise `Pass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestStatus {
    /// Expectation satisfied
    Pass,
    /// Could not be evaluated because of an internal fault
    Block,
    /// Document differs from the expectation
    Fail,
}

impl TestStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestStatus::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, TestStatus::Fail)
    }

    pub fn is_block(&self) -> bool {
        matches!(self, TestStatus::Block)
    }

    /// Aggregate statuses by precedence; an empty set passes
    pub fn aggregate<I>(statuses: I) -> TestStatus
    where
        I: IntoIterator<Item = TestStatus>,
    {
        statuses.into_iter().max().unwrap_or(TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestStatus::Pass => "PASS",
            TestStatus::Block => "BLOCK",
            TestStatus::Fail => "FAIL",
        })
    }
}

/// Result of comparing an element's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueResult {
    pub status: TestStatus,
    pub message: Option<String>,
    pub expected: String,
    pub actual: String,
}

/// Result of comparing one attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeResult {
    pub id: String,
    pub name: String,
    pub status: TestStatus,
    pub message: Option<String>,
    pub expected: String,
    pub actual: String,
}

/// Result of comparing an element's attribute list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributesResult {
    pub status: TestStatus,
    /// Comma-joined messages of failing and blocked attributes
    pub message: Option<String>,
    pub per_attribute: Vec<AttributeResult>,
}

/// Result of validating nested expectations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildrenResult {
    pub status: TestStatus,
    pub children: Vec<ValidationResult>,
}

/// Result of validating one element expectation.
///
/// Sub-results are present only for the checks the expectation asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub id: String,
    pub name: String,
    pub status: TestStatus,
    pub message: Option<String>,
    pub value_result: Option<ValueResult>,
    pub attributes_result: Option<AttributesResult>,
    pub children_result: Option<ChildrenResult>,
}

impl ValidationResult {
    fn bare(spec: &ElementSpec, status: TestStatus, message: String) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            status,
            message: Some(message),
            value_result: None,
            attributes_result: None,
            children_result: None,
        }
    }

    /// Statuses of the sub-checks that were performed
    pub fn sub_statuses(&self) -> Vec<TestStatus> {
        [
            self.value_result.as_ref().map(|r| r.status),
            self.attributes_result.as_ref().map(|r| r.status),
            self.children_result.as_ref().map(|r| r.status),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Compare the concatenated text of `selection` with `expected`.
pub fn validate_value(selection: &Selection, expected: &ValueExpr, log: &mut RunLog) -> ValueResult {
    let actual = selection.text();

    log.blank();
    log.line(format!(
        "Value validation, Actual value: {}, Expected value: {}",
        actual, expected
    ));

    let (status, message) = match match_value(&actual, expected) {
        None => (TestStatus::Pass, None),
        Some(mismatch) => (
            TestStatus::Fail,
            Some(format!("Element {}!", mismatch.describe())),
        ),
    };

    log.line(format!("Value validation, Test result: {}", status));
    if let Some(message) = &message {
        log.line(format!("Value validation, Test message: {}", message));
    }

    ValueResult {
        status,
        message,
        expected: expected.to_string(),
        actual,
    }
}

fn evaluate_attribute(
    selection: &Selection,
    spec: &AttributeSpec,
) -> EvalResult<(String, Option<Mismatch>)> {
    let selector = Selector::parse(&spec.name)?;
    let actual = selection.attribute(&selector)?.unwrap_or_default();
    let mismatch = match_value(&actual, &spec.expected_value);
    Ok((actual, mismatch))
}

fn validate_attribute(selection: &Selection, spec: &AttributeSpec, log: &mut RunLog) -> AttributeResult {
    log.blank();
    log.line(format!(
        "Test of attribute, Attribute id: {}, Attribute name: {}",
        spec.id, spec.name
    ));

    let (status, message, actual) = match evaluate_attribute(selection, spec) {
        Ok((actual, None)) => (TestStatus::Pass, None, actual),
        Ok((actual, Some(mismatch))) => (
            TestStatus::Fail,
            Some(format!(
                "For attribute '{}' {}!",
                spec.name,
                mismatch.describe()
            )),
            actual,
        ),
        Err(fault) => (
            TestStatus::Block,
            Some(format!("For attribute '{}': {}", spec.name, fault)),
            String::new(),
        ),
    };

    log.line(format!(
        "Test of attribute, Actual result: {}, Expected result: {}",
        actual, spec.expected_value
    ));
    log.line(format!("Test of attribute, Test result: {}", status));
    if let Some(message) = &message {
        log.line(format!("Test of attribute, Test message: {}", message));
    }

    AttributeResult {
        id: spec.id.clone(),
        name: spec.name.clone(),
        status,
        message,
        expected: spec.expected_value.to_string(),
        actual,
    }
}

/// Validate every attribute in `specs` against the first node of `selection`.
///
/// A fault on one attribute blocks only that attribute.
pub fn validate_attributes(
    selection: &Selection,
    specs: &[AttributeSpec],
    log: &mut RunLog,
) -> AttributesResult {
    let per_attribute: Vec<AttributeResult> = specs
        .iter()
        .map(|spec| validate_attribute(selection, spec, log))
        .collect();

    let status = TestStatus::aggregate(per_attribute.iter().map(|a| a.status));
    let messages: Vec<&str> = per_attribute
        .iter()
        .filter(|a| !a.status.is_pass())
        .filter_map(|a| a.message.as_deref())
        .filter(|m| !m.is_empty())
        .collect();

    AttributesResult {
        status,
        message: (!messages.is_empty()).then(|| messages.join(", ")),
        per_attribute,
    }
}

fn validate_children(
    selection: &Selection,
    specs: &[ElementSpec],
    log: &mut RunLog,
) -> ChildrenResult {
    log.blank();
    log.rule('-');
    log.line("Child element validation:");

    let children = validate_elements(selection, specs, log);
    let status = TestStatus::aggregate(children.iter().map(|c| c.status));

    log.blank();
    log.line(format!("Child element validation, Test result: {}", status));
    log.rule('-');

    ChildrenResult { status, children }
}

fn select_element<'a, 'input>(
    context: &Selection<'a, 'input>,
    name: &str,
) -> EvalResult<Selection<'a, 'input>> {
    let selector = Selector::parse(name)?;
    context.select(&selector)
}

/// Validate one element expectation against `context`.
pub fn validate_element(context: &Selection, spec: &ElementSpec, log: &mut RunLog) -> ValidationResult {
    log.blank();
    log.line(format!(
        "******** Test element id: {}, Test element name: {} ********",
        spec.id, spec.name
    ));

    let selection = match select_element(context, &spec.name) {
        Ok(selection) => selection,
        Err(fault) => return blocked(spec, fault, log),
    };

    if selection.is_empty() {
        log.line("Element not exist");
        return ValidationResult::bare(spec, TestStatus::Fail, ELEMENT_NOT_EXIST.to_string());
    }
    log.line(format!(
        "Selector '{}' resolved to {} node(s)",
        spec.name,
        selection.len()
    ));

    let value_result = spec
        .expected_value
        .as_ref()
        .map(|expected| validate_value(&selection, expected, log));
    let attributes_result = spec
        .attributes
        .as_deref()
        .map(|attributes| validate_attributes(&selection, attributes, log));
    let children_result = spec
        .children
        .as_deref()
        .map(|children| validate_children(&selection, children, log));

    let mut result = ValidationResult {
        id: spec.id.clone(),
        name: spec.name.clone(),
        status: TestStatus::Pass,
        message: None,
        value_result,
        attributes_result,
        children_result,
    };
    result.status = TestStatus::aggregate(result.sub_statuses());
    result.message = summary_message(&result);

    log.blank();
    log.line(format!("Test summary result: {}", result.status));

    result
}

/// Validate a sequence of sibling expectations; each is isolated from the others
pub fn validate_elements(
    context: &Selection,
    specs: &[ElementSpec],
    log: &mut RunLog,
) -> Vec<ValidationResult> {
    specs
        .iter()
        .map(|spec| validate_element(context, spec, log))
        .collect()
}

fn blocked(spec: &ElementSpec, fault: EvaluationFault, log: &mut RunLog) -> ValidationResult {
    let message = fault.to_string();
    log.line(format!("Element blocked: {}", message));
    ValidationResult::bare(spec, TestStatus::Block, message)
}

fn summary_message(result: &ValidationResult) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(value) = &result.value_result
        && !value.status.is_pass()
        && let Some(message) = &value.message
    {
        parts.push(message.clone());
    }
    if let Some(attributes) = &result.attributes_result
        && !attributes.status.is_pass()
        && let Some(message) = &attributes.message
    {
        parts.push(message.clone());
    }
    if let Some(children) = &result.children_result
        && !children.status.is_pass()
    {
        parts.push(format!("Child elements validation is {}", children.status));
    }

    (!parts.is_empty()).then(|| parts.join(" "))
}
