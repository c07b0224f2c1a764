//! Shared identifiers and value types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a resource node, unique within one stack graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&NodeId> for NodeId {
    fn from(value: &NodeId) -> Self {
        value.clone()
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Configuration properties of a node
pub type Properties = serde_json::Map<String, Value>;

/// Attributes exported by a realized node
pub type Attributes = serde_json::Map<String, Value>;

/// Lifecycle phase of a stack graph
///
/// `Declared -> Resolved` is the only transition and it is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Nodes and edges may still be added
    #[default]
    Declared,
    /// Every node has been realized
    Resolved,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Declared => f.write_str("declared"),
            Phase::Resolved => f.write_str("resolved"),
        }
    }
}

/// String form of an attribute value
///
/// Strings are used verbatim, arrays are joined with `,` and anything else
/// uses its JSON text.
#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_id_display_and_borrow() {
        let id = NodeId::from("CommandHost");
        assert_eq!(id.to_string(), "CommandHost");

        let mut set = std::collections::HashSet::new();
        set.insert(id);
        assert!(set.contains("CommandHost"));
    }

    #[test]
    fn value_string_forms() {
        assert_eq!(value_to_string(&json!("vpc-123")), "vpc-123");
        assert_eq!(
            value_to_string(&json!(["subnet-a", "subnet-b"])),
            "subnet-a,subnet-b"
        );
        assert_eq!(value_to_string(&json!(3)), "3");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&Value::Null), "");
    }

    #[test]
    fn phase_defaults_to_declared() {
        assert_eq!(Phase::default(), Phase::Declared);
        assert_eq!(Phase::Resolved.to_string(), "resolved");
    }
}
