//! StackGraph Core
//!
//! Declarative resource graphs with dependency-ordered resolution.
//!
//! # Core Concepts
//!
//! - [`ResourceNode`]: one managed resource, validated against its
//!   [`ResourceKind`] schema when declared
//! - [`StackGraph`]: nodes plus dependency edges, kept acyclic, resolved in
//!   topological order through a [`Provisioner`]
//! - [`OutputAggregator`]: named outputs that reference exported attributes
//!   and render once the graph is resolved
//! - [`Deployment`]: independent stacks resolved concurrently
//!
//! # Example
//!
//! ```rust,ignore
//! use stackgraph_core::prelude::*;
//!
//! let config = StackConfig::new("123456789012", "us-east-1")?;
//! let mut graph = StackGraph::new("Lab", config);
//! graph.declare("vpc", ResourceKind::Network, network_props)?;
//! graph.declare("host", ResourceKind::Compute, host_props)?;
//! graph.depends_on("host", "vpc")?;
//!
//! let mut outputs = OutputAggregator::new();
//! outputs.add_output("HostId", OutputValue::attribute("host", "instanceId"))?;
//!
//! graph.resolve(&provisioner)?;
//! let rendered = outputs.render(&graph)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod deployment;
pub mod error;
pub mod graph;
pub mod kind;
pub mod node;
pub mod output;
pub mod provisioner;
pub mod types;

// Re-exports
pub use config::StackConfig;
pub use deployment::{Deployment, Stack, StackReport};
pub use error::{CompositionError, ProvisionError, Result};
pub use graph::{ResolutionSummary, StackGraph};
pub use kind::{KindSchema, PropertySpec, PropertyType, ResourceKind};
pub use node::ResourceNode;
pub use output::{AttributeRef, OutputAggregator, OutputEntry, OutputValue, RenderedOutputs};
pub use provisioner::{Provisioner, RealizeRequest, ResolvedDependencies};
pub use types::{value_to_string, Attributes, NodeId, Phase, Properties};

/// Common imports
pub mod prelude {
    pub use crate::config::StackConfig;
    pub use crate::deployment::{Deployment, Stack};
    pub use crate::error::{CompositionError, ProvisionError};
    pub use crate::graph::StackGraph;
    pub use crate::kind::ResourceKind;
    pub use crate::node::ResourceNode;
    pub use crate::output::{AttributeRef, OutputAggregator, OutputValue};
    pub use crate::provisioner::{Provisioner, RealizeRequest};
    pub use crate::types::{Attributes, NodeId, Properties};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
