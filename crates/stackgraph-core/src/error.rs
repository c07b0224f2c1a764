//! Error types for StackGraph
//!
//! Every failure the composer can report is a variant of
//! [`CompositionError`]. Failures coming from the provisioning collaborator
//! are carried as [`ProvisionError`] inside
//! [`CompositionError::ResolutionFailed`].

use crate::kind::ResourceKind;
use crate::types::NodeId;

/// Main composer error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    /// A declaration was rejected by the per-kind schema
    #[error("invalid configuration for {kind} property `{property}`: {reason}")]
    InvalidConfiguration {
        /// Kind being declared
        kind: ResourceKind,
        /// Offending property (or `id` for the node id itself)
        property: String,
        /// What was wrong with it
        reason: String,
    },

    /// Node id already present in the graph
    #[error("duplicate node id `{0}`")]
    DuplicateId(NodeId),

    /// Output key already registered
    #[error("duplicate output key `{0}`")]
    DuplicateKey(String),

    /// Stack name already registered in a deployment
    #[error("duplicate stack `{0}`")]
    DuplicateStack(String),

    /// Edge or reference names a node the graph does not contain
    #[error("unknown node `{0}`")]
    UnknownNode(NodeId),

    /// Edge would close a dependency cycle
    #[error("edge {from} -> {to} would create a cycle")]
    CycleDetected {
        /// Edge source
        from: NodeId,
        /// Edge target
        to: NodeId,
    },

    /// Graph structure is frozen once resolved
    #[error("stack `{0}` is already resolved")]
    AlreadyResolved(String),

    /// The provisioning collaborator failed to realize a node
    #[error("resolution failed at node `{node_id}`: {cause}")]
    ResolutionFailed {
        /// Node whose realization failed
        node_id: NodeId,
        /// Collaborator failure
        #[source]
        cause: ProvisionError,
    },

    /// Attribute read before the node was realized
    #[error("node `{0}` has not been resolved yet")]
    NotYetResolved(NodeId),

    /// Outputs rendered before the graph completed resolution
    #[error("stack `{0}` has not completed resolution")]
    UnresolvedGraph(String),

    /// Attribute is not part of the kind's export set
    #[error("{kind} does not export attribute `{attribute}`")]
    UnknownAttribute {
        /// Kind of the referenced node
        kind: ResourceKind,
        /// Requested attribute name
        attribute: String,
    },

    /// Account/region configuration rejected
    #[error("invalid stack configuration: {0}")]
    InvalidStackConfig(String),

    /// Stack targets a different account or region than its deployment
    #[error("stack `{stack}` targets {found}, deployment targets {expected}")]
    ConfigMismatch {
        /// Stack name
        stack: String,
        /// Deployment target as `account/region`
        expected: String,
        /// Stack target as `account/region`
        found: String,
    },
}

impl CompositionError {
    /// Check if retrying the same call may succeed
    ///
    /// Only collaborator failures qualify; realized nodes are skipped on the
    /// next `resolve()`.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResolutionFailed { .. })
    }

    /// Check if the error is fixed by calling `resolve()` first
    #[inline]
    #[must_use]
    pub fn is_sequencing_error(&self) -> bool {
        matches!(self, Self::NotYetResolved(_) | Self::UnresolvedGraph(_))
    }

    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_configuration(
        kind: ResourceKind,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfiguration {
            kind,
            property: property.into(),
            reason: reason.into(),
        }
    }
}

/// Failure reported by a provisioning collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProvisionError {
    message: String,
}

impl ProvisionError {
    /// Create from a message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Failure message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result alias used across the crate
pub type Result<T, E = CompositionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_failed_is_retryable() {
        let err = CompositionError::ResolutionFailed {
            node_id: NodeId::from("vpc"),
            cause: ProvisionError::new("throttled"),
        };
        assert!(err.is_retryable());
        assert!(!err.is_sequencing_error());
        assert_eq!(
            err.to_string(),
            "resolution failed at node `vpc`: throttled"
        );
    }

    #[test]
    fn sequencing_errors() {
        assert!(CompositionError::NotYetResolved(NodeId::from("a")).is_sequencing_error());
        assert!(CompositionError::UnresolvedGraph("Lab1".into()).is_sequencing_error());
        assert!(!CompositionError::DuplicateKey("Url".into()).is_retryable());
    }

    #[test]
    fn source_is_provision_error() {
        use std::error::Error;

        let err = CompositionError::ResolutionFailed {
            node_id: NodeId::from("bucket"),
            cause: ProvisionError::new("access denied"),
        };
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("access denied"));
    }
}
