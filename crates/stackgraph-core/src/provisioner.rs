//! Provisioning collaborator boundary
//!
//! The composer never talks to a control plane directly. Resolution hands
//! each node to a [`Provisioner`], which realizes it and returns the node's
//! exported attributes.

use crate::config::StackConfig;
use crate::error::ProvisionError;
use crate::kind::ResourceKind;
use crate::types::{Attributes, NodeId, Properties};
use std::collections::BTreeMap;

/// Exported attributes of a node's direct dependencies, keyed by node id
pub type ResolvedDependencies = BTreeMap<NodeId, Attributes>;

/// Everything the collaborator needs to realize one node
#[derive(Debug, Clone, Copy)]
pub struct RealizeRequest<'a> {
    /// Owning stack name
    pub stack: &'a str,
    /// Account and region of the owning stack
    pub config: &'a StackConfig,
    /// Node being realized
    pub node_id: &'a NodeId,
    /// Kind of the node
    pub kind: ResourceKind,
    /// Declared properties
    pub properties: &'a Properties,
    /// Attributes of already realized direct dependencies
    pub dependencies: &'a ResolvedDependencies,
}

/// External capability that brings declared resources into existence
///
/// Calls are synchronous from the composer's point of view. Retry, backoff
/// and cancellation are the implementation's business.
pub trait Provisioner: Send + Sync {
    /// Realize one node, returning its exported attributes
    ///
    /// # Errors
    /// Any failure to realize; the graph reports it as `ResolutionFailed`.
    fn realize(&self, request: &RealizeRequest<'_>) -> Result<Attributes, ProvisionError>;

    /// Attribute names the collaborator produces for `kind`
    fn attribute_schema(&self, kind: ResourceKind) -> &'static [&'static str] {
        kind.exported_attributes()
    }
}

impl<P: Provisioner + ?Sized> Provisioner for &P {
    fn realize(&self, request: &RealizeRequest<'_>) -> Result<Attributes, ProvisionError> {
        (**self).realize(request)
    }

    fn attribute_schema(&self, kind: ResourceKind) -> &'static [&'static str] {
        (**self).attribute_schema(kind)
    }
}
