//! Expectation model
//!
//! Declarative description of what a feed must contain: a container selector
//! for the repeating record nodes, and a tree of expected elements with
//! optional values, attributes and nested children.
//!
//! Files use the legacy key layout (`element_name`, `child_elements`,
//! `attribute_value`, ...); the shorter field names are accepted as aliases.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{FeedError, Result};

/// Expected value of an element text or an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueExpr {
    /// `*`: any non-empty value
    Wildcard,
    /// Comma-separated set of accepted literals
    Enumeration { raw: String, members: Vec<String> },
    /// Exact match
    Literal(String),
}

impl ValueExpr {
    pub fn parse(text: &str) -> Self {
        if text == "*" {
            ValueExpr::Wildcard
        } else if text.contains(',') {
            let mut members: Vec<String> = text.split(',').map(|m| m.trim().to_string()).collect();
            // Trailing commas add no members; interior empty members are kept.
            while members.last().is_some_and(String::is_empty) {
                members.pop();
            }
            ValueExpr::Enumeration {
                raw: text.to_string(),
                members,
            }
        } else {
            ValueExpr::Literal(text.to_string())
        }
    }

    /// The expression as written in the expectation file
    pub fn as_str(&self) -> &str {
        match self {
            ValueExpr::Wildcard => "*",
            ValueExpr::Enumeration { raw, .. } => raw,
            ValueExpr::Literal(value) => value,
        }
    }
}

impl From<String> for ValueExpr {
    fn from(text: String) -> Self {
        ValueExpr::parse(&text)
    }
}

impl From<&str> for ValueExpr {
    fn from(text: &str) -> Self {
        ValueExpr::parse(text)
    }
}

impl From<ValueExpr> for String {
    fn from(expr: ValueExpr) -> Self {
        expr.as_str().to_string()
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ids appear both as strings and as bare numbers in existing files.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// One expected attribute on an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    #[serde(alias = "attribute_id", default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "attribute_name")]
    pub name: String,
    #[serde(alias = "attribute_value")]
    pub expected_value: ValueExpr,
}

impl AttributeSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>, expected: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            expected_value: ValueExpr::parse(expected),
        }
    }
}

/// One expected element; `children` nests to any depth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    #[serde(alias = "element_id", default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(alias = "element_name")]
    pub name: String,
    #[serde(
        alias = "element_value",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_value: Option<ValueExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeSpec>>,
    #[serde(
        alias = "child_elements",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub children: Option<Vec<ElementSpec>>,
}

impl ElementSpec {
    /// An existence-only expectation
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            expected_value: None,
            attributes: None,
            children: None,
        }
    }

    pub fn with_value(mut self, expected: &str) -> Self {
        self.expected_value = Some(ValueExpr::parse(expected));
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<AttributeSpec>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    pub fn with_children(mut self, children: Vec<ElementSpec>) -> Self {
        self.children = Some(children);
        self
    }

    /// Number of element expectations in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(ElementSpec::node_count)
            .sum::<usize>()
    }
}

/// Top-level unit of an expectation file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(alias = "container")]
    pub container_selector: String,
    pub elements: Vec<ElementSpec>,
}

impl ContainerSpec {
    pub fn new(container_selector: impl Into<String>, elements: Vec<ElementSpec>) -> Self {
        Self {
            container_selector: container_selector.into(),
            elements,
        }
    }

    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Load an expectation file from disk
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FeedError::SpecLoad {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;

        Self::from_json_str(&content).map_err(|e| FeedError::SpecLoad {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    /// Number of element expectations across the whole tree
    pub fn node_count(&self) -> usize {
        self.elements.iter().map(ElementSpec::node_count).sum()
    }
}
