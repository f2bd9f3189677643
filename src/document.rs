//! Document model
//!
//! A thin, read-only view over a parsed `roxmltree` document. The validator
//! only needs three operations: select descendants by (optionally prefixed)
//! name, read an attribute and read the concatenated text content.
//!
//! Names coming from expectation files use `:` between namespace prefix and
//! local name (`media:rating`). They are translated to the internal `|`
//! delimiter before lookup, and the prefix is resolved against the namespace
//! declarations in scope at the context node.

use roxmltree::{Document, ExpandedName, Node};

use crate::error::{EvalResult, EvaluationFault, FeedError, Result};

/// Delimiter between namespace prefix and local name inside a [`Selector`]
pub const PREFIX_DELIMITER: char = '|';

/// Namespace bound to the reserved `xml` prefix, which is never declared
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parse raw XML text into a document.
///
/// `source_name` is only used to label parse errors.
pub fn parse_document<'input>(source_name: &str, text: &'input str) -> Result<Document<'input>> {
    Document::parse(text).map_err(|e| FeedError::DocumentParse {
        source_name: source_name.to_string(),
        details: e.to_string(),
    })
}

/// A validated element or attribute name, optionally namespace-prefixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    raw: String,
    prefix: Option<String>,
    local: String,
}

impl Selector {
    /// Parse a name as written in an expectation file.
    pub fn parse(name: &str) -> EvalResult<Self> {
        let invalid = |reason: &str| EvaluationFault::InvalidSelector {
            selector: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '|')))
        {
            return Err(invalid(&format!("unsupported character '{}'", c)));
        }

        let translated = name.replace(':', &PREFIX_DELIMITER.to_string());
        let parts: Vec<&str> = translated.split(PREFIX_DELIMITER).collect();

        let (prefix, local) = match parts.as_slice() {
            [local] => (None, *local),
            [prefix, local] => (Some(*prefix), *local),
            _ => return Err(invalid("more than one namespace prefix")),
        };

        if local.is_empty() || prefix.is_some_and(str::is_empty) {
            return Err(invalid("empty prefix or local name"));
        }

        Ok(Self {
            raw: name.to_string(),
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
        })
    }

    /// The name as written in the expectation file
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The name with the internal prefix delimiter, e.g. `media|rating`
    pub fn translated(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}{}", prefix, PREFIX_DELIMITER, self.local),
            None => self.local.clone(),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Resolve the prefix to a namespace URI in the scope of `scope`.
    ///
    /// Returns `Ok(None)` for unprefixed names.
    fn namespace_in<'a>(&self, scope: Node<'a, '_>) -> EvalResult<Option<&'a str>> {
        let Some(prefix) = &self.prefix else {
            return Ok(None);
        };
        if prefix == "xml" {
            return Ok(Some(XML_NAMESPACE));
        }

        // The document node carries no declarations of its own.
        let scope = if scope.is_root() {
            scope.document().root_element()
        } else {
            scope
        };

        scope
            .lookup_namespace_uri(Some(prefix.as_str()))
            .map(Some)
            .ok_or_else(|| EvaluationFault::UnboundPrefix {
                prefix: prefix.clone(),
                selector: self.raw.clone(),
            })
    }

    fn matches_element(&self, node: Node<'_, '_>, namespace: Option<&str>) -> bool {
        if !node.is_element() {
            return false;
        }
        let tag = node.tag_name();
        tag.name() == self.local && (namespace.is_none() || tag.namespace() == namespace)
    }
}

/// Zero or more element nodes, in document order.
#[derive(Debug, Clone)]
pub struct Selection<'a, 'input> {
    nodes: Vec<Node<'a, 'input>>,
}

impl<'a, 'input> Selection<'a, 'input> {
    /// A selection holding the document node, so that `select` searches the whole tree
    pub fn document(document: &'a Document<'input>) -> Self {
        Self {
            nodes: vec![document.root()],
        }
    }

    pub fn from_node(node: Node<'a, 'input>) -> Self {
        Self { nodes: vec![node] }
    }

    /// Select all descendants (excluding the context nodes themselves) matching `selector`.
    pub fn select(&self, selector: &Selector) -> EvalResult<Selection<'a, 'input>> {
        let mut found = Vec::new();

        for context in &self.nodes {
            let namespace = selector.namespace_in(*context)?;
            found.extend(
                context
                    .descendants()
                    .skip(1)
                    .filter(|node| selector.matches_element(*node, namespace)),
            );
        }

        // Nested contexts can reach the same node twice.
        found.sort_by_key(|node| node.id().get());
        found.dedup_by_key(|node| node.id().get());

        Ok(Selection { nodes: found })
    }

    /// Concatenated text content of every node in the selection
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .flat_map(|node| node.descendants())
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect()
    }

    /// Attribute value of the first node in the selection.
    pub fn attribute(&self, selector: &Selector) -> EvalResult<Option<String>> {
        let Some(node) = self.nodes.first() else {
            return Ok(None);
        };

        let value = match selector.namespace_in(*node)? {
            Some(uri) => node.attribute(ExpandedName::from((uri, selector.local_name()))),
            None => node.attribute(selector.local_name()),
        };

        Ok(value.map(str::to_string))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// One single-node selection per matched node, in document order
    pub fn split(&self) -> impl Iterator<Item = Selection<'a, 'input>> + '_ {
        self.nodes.iter().map(|node| Selection::from_node(*node))
    }
}
