//! Stack outputs
//!
//! An [`OutputAggregator`] collects named values that are only known after a
//! stack graph is resolved: resource ids, endpoint addresses, URLs built from
//! them. Values are declared up front as [`OutputValue`]s and rendered to
//! plain strings once the graph reaches [`Phase::Resolved`].
//!
//! [`Phase::Resolved`]: crate::types::Phase::Resolved

use crate::error::{CompositionError, Result};
use crate::graph::StackGraph;
use crate::types::{value_to_string, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Deferred reference to a node's exported attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeRef {
    /// Referenced node
    pub node: NodeId,
    /// Attribute name
    pub attribute: String,
}

impl AttributeRef {
    /// Create a reference
    #[must_use]
    pub fn new(node: impl Into<NodeId>, attribute: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            attribute: attribute.into(),
        }
    }
}

/// Value of an output entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputValue {
    /// Passed through unchanged
    Literal(String),
    /// Replaced by the attribute's string form
    Attribute(AttributeRef),
    /// Parts rendered and joined without separator
    Concat(Vec<OutputValue>),
}

impl OutputValue {
    /// Literal value
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Reference to `node`'s `attribute`
    #[must_use]
    pub fn attribute(node: impl Into<NodeId>, attribute: impl Into<String>) -> Self {
        Self::Attribute(AttributeRef::new(node, attribute))
    }

    /// Every attribute reference inside this value
    #[must_use]
    pub fn references(&self) -> Vec<&AttributeRef> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::Attribute(reference) => vec![reference],
            Self::Concat(parts) => parts.iter().flat_map(Self::references).collect(),
        }
    }

    fn render(&self, graph: &StackGraph) -> Result<String> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Attribute(reference) => graph
                .export_attribute(reference.node.as_str(), &reference.attribute)
                .map(value_to_string),
            Self::Concat(parts) => parts.iter().map(|part| part.render(graph)).collect(),
        }
    }
}

impl From<AttributeRef> for OutputValue {
    fn from(value: AttributeRef) -> Self {
        Self::Attribute(value)
    }
}

impl From<&str> for OutputValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for OutputValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// One registered output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    /// Output key
    pub key: String,
    /// Deferred value
    pub value: OutputValue,
    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Rendered outputs in registration order
pub type RenderedOutputs = IndexMap<String, String>;

/// Named outputs of one stack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputAggregator {
    entries: Vec<OutputEntry>,
}

impl OutputAggregator {
    /// Create an empty aggregator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an output
    ///
    /// # Errors
    /// `DuplicateKey` if `key` is already registered.
    pub fn add_output(&mut self, key: impl Into<String>, value: impl Into<OutputValue>) -> Result<()> {
        self.push(key.into(), value.into(), None)
    }

    /// Register an output with a description
    ///
    /// # Errors
    /// `DuplicateKey` if `key` is already registered.
    pub fn add_output_with_description(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OutputValue>,
        description: impl Into<String>,
    ) -> Result<()> {
        self.push(key.into(), value.into(), Some(description.into()))
    }

    fn push(&mut self, key: String, value: OutputValue, description: Option<String>) -> Result<()> {
        if self.contains(&key) {
            return Err(CompositionError::DuplicateKey(key));
        }
        self.entries.push(OutputEntry {
            key,
            value,
            description,
        });
        Ok(())
    }

    /// Check if `key` is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Registered entries in order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[OutputEntry] {
        &self.entries
    }

    /// Number of outputs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no outputs are registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key/description pairs for display
    #[must_use]
    pub fn describe(&self) -> Vec<(&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|entry| (entry.key.as_str(), entry.description.as_deref()))
            .collect()
    }

    /// Render every output against a resolved graph
    ///
    /// # Errors
    /// - `UnresolvedGraph` if `graph` has not completed `resolve()`
    /// - `UnknownNode` if a reference names a node outside `graph`
    /// - `UnknownAttribute` if a reference names an attribute its kind does
    ///   not export
    pub fn render(&self, graph: &StackGraph) -> Result<RenderedOutputs> {
        let references = self.entries.iter().flat_map(|entry| entry.value.references());
        if !graph.is_resolved() && references.clone().next().is_some() {
            return Err(CompositionError::UnresolvedGraph(graph.name().to_string()));
        }

        for reference in references {
            if !graph.contains(reference.node.as_str()) {
                return Err(CompositionError::UnknownNode(reference.node.clone()));
            }
        }

        self.entries
            .iter()
            .map(|entry| Ok((entry.key.clone(), entry.value.render(graph)?)))
            .collect()
    }
}
