//! Stack graphs
//!
//! A [`StackGraph`] owns its [`ResourceNode`]s and the dependency edges
//! between them. Edges always form a DAG: `add_edge` rejects any edge whose
//! target can already reach its source.
//!
//! Resolution walks the nodes in topological order (ties broken by
//! declaration order) and hands each one to a [`Provisioner`]. The graph
//! moves from [`Phase::Declared`] to [`Phase::Resolved`] once every node is
//! realized, and stays there.

use crate::config::StackConfig;
use crate::error::{CompositionError, ProvisionError, Result};
use crate::kind::ResourceKind;
use crate::node::ResourceNode;
use crate::provisioner::{Provisioner, RealizeRequest, ResolvedDependencies};
use crate::types::{NodeId, Phase, Properties};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use tracing::{debug, info, warn};

/// Counts reported by [`StackGraph::resolve`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    /// Nodes realized by this call
    pub realized: usize,
    /// Nodes already realized by an earlier, interrupted call
    pub skipped: usize,
}

/// Dependency-ordered collection of resource declarations
#[derive(Debug, Clone)]
pub struct StackGraph {
    name: String,
    config: StackConfig,
    // Nodes are never removed, so NodeIndex order is declaration order.
    graph: DiGraph<ResourceNode, ()>,
    index: HashMap<NodeId, NodeIndex>,
    phase: Phase,
}

impl StackGraph {
    /// Create an empty graph
    #[must_use]
    pub fn new(name: impl Into<String>, config: StackConfig) -> Self {
        Self {
            name: name.into(),
            config,
            graph: DiGraph::new(),
            index: HashMap::new(),
            phase: Phase::Declared,
        }
    }

    /// Stack name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Account and region
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Current lifecycle phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether `resolve()` has completed
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.phase == Phase::Resolved
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if a node id is declared
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a node
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&ResourceNode> {
        self.index.get(id).map(|&ix| &self.graph[ix])
    }

    /// Nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.graph.node_weights()
    }

    /// Edges as `(from, to)` pairs, `from` realized first
    #[must_use]
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].id().clone(),
                    self.graph[e.target()].id().clone(),
                )
            })
            .collect()
    }

    /// Direct dependencies of a node, in declaration order
    ///
    /// # Errors
    /// `UnknownNode` if `id` is not declared.
    pub fn dependencies(&self, id: &str) -> Result<Vec<&NodeId>> {
        let ix = self.lookup(id)?;
        let mut deps: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(ix, Direction::Incoming)
            .collect();
        deps.sort_unstable();
        Ok(deps.into_iter().map(|d| self.graph[d].id()).collect())
    }

    /// Add a declared node
    ///
    /// # Errors
    /// `DuplicateId` if the id exists, `AlreadyResolved` after resolution.
    /// The graph is unchanged on error.
    pub fn add_node(&mut self, node: ResourceNode) -> Result<NodeId> {
        self.ensure_declared()?;
        if self.index.contains_key(node.id()) {
            return Err(CompositionError::DuplicateId(node.id().clone()));
        }

        let id = node.id().clone();
        debug!(stack = %self.name, node = %id, kind = %node.kind(), "declared node");
        let ix = self.graph.add_node(node);
        self.index.insert(id.clone(), ix);
        Ok(id)
    }

    /// Declare and add a node in one step
    ///
    /// # Errors
    /// Errors of [`ResourceNode::declare`] and [`StackGraph::add_node`].
    pub fn declare(
        &mut self,
        id: impl Into<NodeId>,
        kind: ResourceKind,
        properties: Properties,
    ) -> Result<NodeId> {
        self.ensure_declared()?;
        let node = ResourceNode::declare(id, kind, properties)?;
        self.add_node(node)
    }

    /// Add a dependency edge: `from` is realized before `to`
    ///
    /// Adding an edge that already exists is a no-op.
    ///
    /// # Errors
    /// - `UnknownNode` if either endpoint is absent
    /// - `CycleDetected` if `to` already reaches `from` (or `from == to`)
    /// - `AlreadyResolved` after resolution
    ///
    /// The graph is unchanged on error.
    pub fn add_edge(&mut self, from: impl AsRef<str>, to: impl AsRef<str>) -> Result<()> {
        self.ensure_declared()?;
        let from_ix = self.lookup(from.as_ref())?;
        let to_ix = self.lookup(to.as_ref())?;

        if self.graph.contains_edge(from_ix, to_ix) {
            return Ok(());
        }

        if from_ix == to_ix || has_path_connecting(&self.graph, to_ix, from_ix, None) {
            return Err(CompositionError::CycleDetected {
                from: self.graph[from_ix].id().clone(),
                to: self.graph[to_ix].id().clone(),
            });
        }

        self.graph.add_edge(from_ix, to_ix, ());
        debug!(
            stack = %self.name,
            from = %self.graph[from_ix].id(),
            to = %self.graph[to_ix].id(),
            "added edge"
        );
        Ok(())
    }

    /// Record that `dependent` depends on `dependency`
    ///
    /// # Errors
    /// Same as [`StackGraph::add_edge`].
    #[inline]
    pub fn depends_on(
        &mut self,
        dependent: impl AsRef<str>,
        dependency: impl AsRef<str>,
    ) -> Result<()> {
        self.add_edge(dependency, dependent)
    }

    /// Topological order, ties broken by declaration order
    #[must_use]
    pub fn resolution_order(&self) -> Vec<NodeId> {
        self.topological_indices()
            .into_iter()
            .map(|ix| self.graph[ix].id().clone())
            .collect()
    }

    // Kahn's algorithm with a min-heap on declaration index.
    fn topological_indices(&self) -> Vec<NodeIndex> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|ix| {
                self.graph
                    .neighbors_directed(ix, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|ix| in_degree[ix.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(ix)) = ready.pop() {
            order.push(ix);
            for next in self.graph.neighbors_directed(ix, Direction::Outgoing) {
                let degree = &mut in_degree[next.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        order
    }

    /// Realize every node through `provisioner`
    ///
    /// Nodes are visited in [`resolution_order`](Self::resolution_order); each
    /// receives the exported attributes of its direct dependencies. Nodes
    /// realized by an earlier, failed call are skipped. Once resolved,
    /// further calls return immediately without touching the provisioner.
    ///
    /// # Errors
    /// `ResolutionFailed` for the first node the provisioner fails to realize
    /// (or realizes without its full attribute set). Nodes realized before it
    /// stay realized; nothing is rolled back.
    pub fn resolve<P>(&mut self, provisioner: &P) -> Result<ResolutionSummary>
    where
        P: Provisioner + ?Sized,
    {
        if self.is_resolved() {
            debug!(stack = %self.name, "stack already resolved");
            return Ok(ResolutionSummary::default());
        }

        info!(stack = %self.name, nodes = self.node_count(), "resolving stack");
        let mut summary = ResolutionSummary::default();

        for ix in self.topological_indices() {
            if self.graph[ix].is_realized() {
                summary.skipped += 1;
                continue;
            }

            let dependencies = self.dependency_attributes(ix);
            let node = &self.graph[ix];
            let node_id = node.id().clone();
            let kind = node.kind();
            let schema = provisioner.attribute_schema(kind);

            let outcome = provisioner.realize(&RealizeRequest {
                stack: &self.name,
                config: &self.config,
                node_id: &node_id,
                kind,
                properties: node.properties(),
                dependencies: &dependencies,
            });

            let result = outcome.and_then(|attributes| {
                self.graph[ix]
                    .realize(attributes, schema)
                    .map_err(ProvisionError::new)
            });

            if let Err(cause) = result {
                warn!(
                    stack = %self.name,
                    node = %node_id,
                    kind = %kind,
                    error = %cause,
                    "realization failed"
                );
                return Err(CompositionError::ResolutionFailed { node_id, cause });
            }

            debug!(stack = %self.name, node = %node_id, kind = %kind, "realized node");
            summary.realized += 1;
        }

        self.phase = Phase::Resolved;
        info!(
            stack = %self.name,
            realized = summary.realized,
            skipped = summary.skipped,
            "stack resolved"
        );
        Ok(summary)
    }

    /// Read an exported attribute of a node
    ///
    /// # Errors
    /// `UnknownNode`, `UnknownAttribute`, or `NotYetResolved` if the graph
    /// has not completed resolution.
    pub fn export_attribute(&self, id: &str, attribute: &str) -> Result<&Value> {
        let node = &self.graph[self.lookup(id)?];
        if !node.kind().exports(attribute) {
            return Err(CompositionError::UnknownAttribute {
                kind: node.kind(),
                attribute: attribute.to_string(),
            });
        }
        if !self.is_resolved() {
            return Err(CompositionError::NotYetResolved(node.id().clone()));
        }
        node.export_attribute(attribute)
    }

    fn dependency_attributes(&self, ix: NodeIndex) -> ResolvedDependencies {
        self.graph
            .neighbors_directed(ix, Direction::Incoming)
            .filter_map(|dep| {
                let node = &self.graph[dep];
                node.attributes()
                    .map(|attributes| (node.id().clone(), attributes.clone()))
            })
            .collect()
    }

    fn lookup(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| CompositionError::UnknownNode(NodeId::from(id)))
    }

    fn ensure_declared(&self) -> Result<()> {
        if self.is_resolved() {
            return Err(CompositionError::AlreadyResolved(self.name.clone()));
        }
        Ok(())
    }
}
