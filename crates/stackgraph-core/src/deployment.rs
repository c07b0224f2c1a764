//! Deployments of several independent stacks
//!
//! Stacks in a deployment share a [`StackConfig`] but no nodes or edges, so
//! they can be resolved concurrently. A failing stack never affects its
//! siblings.

use crate::config::StackConfig;
use crate::error::{CompositionError, Result};
use crate::graph::{ResolutionSummary, StackGraph};
use crate::output::{OutputAggregator, RenderedOutputs};
use crate::provisioner::Provisioner;
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{info, warn};

/// A stack graph together with its outputs
#[derive(Debug, Clone)]
pub struct Stack {
    /// Resources and dependencies
    pub graph: StackGraph,
    /// Named outputs
    pub outputs: OutputAggregator,
}

impl Stack {
    /// Create an empty stack
    #[must_use]
    pub fn new(name: impl Into<String>, config: StackConfig) -> Self {
        Self {
            graph: StackGraph::new(name, config),
            outputs: OutputAggregator::new(),
        }
    }

    /// Stack name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.graph.name()
    }

    /// Render outputs against this stack's graph
    ///
    /// # Errors
    /// See [`OutputAggregator::render`].
    pub fn render(&self) -> Result<RenderedOutputs> {
        self.outputs.render(&self.graph)
    }
}

/// Outcome of resolving one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackReport {
    /// Stack name
    pub stack: String,
    /// Summary or failure
    pub result: Result<ResolutionSummary>,
}

/// A set of stacks deployed together
#[derive(Debug, Clone)]
pub struct Deployment {
    config: StackConfig,
    stacks: Vec<Stack>,
}

impl Deployment {
    /// Create an empty deployment
    #[must_use]
    pub fn new(config: StackConfig) -> Self {
        Self {
            config,
            stacks: Vec::new(),
        }
    }

    /// Shared configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Register a stack
    ///
    /// # Errors
    /// - `DuplicateStack` if a stack with the same name exists
    /// - `ConfigMismatch` if the stack targets another account or region
    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        if self.stack(stack.name()).is_some() {
            return Err(CompositionError::DuplicateStack(stack.name().to_string()));
        }
        let target = stack.graph.config();
        if *target != self.config {
            return Err(CompositionError::ConfigMismatch {
                stack: stack.name().to_string(),
                expected: format!("{}/{}", self.config.account, self.config.region),
                found: format!("{}/{}", target.account, target.region),
            });
        }
        self.stacks.push(stack);
        Ok(())
    }

    /// Look up a stack by name
    #[must_use]
    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|stack| stack.name() == name)
    }

    /// Stacks in registration order
    #[inline]
    #[must_use]
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Resolve every stack concurrently
    ///
    /// Reports come back in registration order.
    pub fn resolve_all<P>(&mut self, provisioner: &P) -> Vec<StackReport>
    where
        P: Provisioner + ?Sized,
    {
        info!(stacks = self.stacks.len(), "resolving deployment");
        self.stacks
            .par_iter_mut()
            .map(|stack| {
                let result = stack.graph.resolve(provisioner);
                if let Err(error) = &result {
                    warn!(stack = %stack.name(), %error, "stack failed to resolve");
                }
                StackReport {
                    stack: stack.name().to_string(),
                    result,
                }
            })
            .collect()
    }

    /// Render outputs of every resolved stack, keyed by stack name
    ///
    /// # Errors
    /// The first render failure of a resolved stack.
    pub fn render_all(&self) -> Result<IndexMap<String, RenderedOutputs>> {
        self.stacks
            .iter()
            .filter(|stack| stack.graph.is_resolved())
            .map(|stack| Ok((stack.name().to_string(), stack.render()?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StackConfig {
        StackConfig::new("123456789012", "us-west-2").unwrap()
    }

    #[test]
    fn duplicate_stack_is_rejected() {
        let mut deployment = Deployment::new(config());
        deployment.add_stack(Stack::new("Lab1", config())).unwrap();

        assert_eq!(
            deployment.add_stack(Stack::new("Lab1", config())),
            Err(CompositionError::DuplicateStack("Lab1".into()))
        );
        assert_eq!(deployment.stacks().len(), 1);
    }

    #[test]
    fn stack_for_another_region_is_rejected() {
        let mut deployment = Deployment::new(config());
        let other = StackConfig::new("123456789012", "eu-west-1").unwrap();

        assert_eq!(
            deployment.add_stack(Stack::new("Lab1", other)),
            Err(CompositionError::ConfigMismatch {
                stack: "Lab1".into(),
                expected: "123456789012/us-west-2".into(),
                found: "123456789012/eu-west-1".into(),
            })
        );
        assert!(deployment.stacks().is_empty());
    }

    #[test]
    fn lookup_by_name() {
        let mut deployment = Deployment::new(config());
        deployment.add_stack(Stack::new("Lab1", config())).unwrap();
        deployment.add_stack(Stack::new("Lab3", config())).unwrap();

        assert!(deployment.stack("Lab3").is_some());
        assert!(deployment.stack("Lab2").is_none());
    }
}
