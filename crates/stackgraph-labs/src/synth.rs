//! Resolve a deployment and collect its outputs for display
//!
//! This is what `labctl synth` prints: the described outputs of every stack
//! that resolved, plus the stacks that did not.

use anyhow::bail;
use serde_json::{json, Map, Value};
use stackgraph_core::{CompositionError, Deployment, Provisioner, Result};
use std::fmt::Write as _;

/// One rendered output with its description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthOutput {
    /// Output key
    pub key: String,
    /// Rendered value
    pub value: String,
    /// Description, if one was registered
    pub description: Option<String>,
}

/// Outputs of one resolved stack, in registration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutputs {
    /// Stack name
    pub stack: String,
    /// Rendered outputs
    pub outputs: Vec<SynthOutput>,
}

/// Result of [`synthesize`]
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// Stacks that resolved, in registration order
    pub stacks: Vec<StackOutputs>,
    /// Stacks that failed, with the error that stopped them
    pub failures: Vec<(String, CompositionError)>,
}

/// Resolve every stack of `deployment` and render the ones that resolved
///
/// A failing stack is recorded in [`Synthesis::failures`] and does not stop
/// its siblings.
///
/// # Errors
/// The first render failure of a resolved stack.
pub fn synthesize<P>(deployment: &mut Deployment, provisioner: &P) -> Result<Synthesis>
where
    P: Provisioner + ?Sized,
{
    let failures = deployment
        .resolve_all(provisioner)
        .into_iter()
        .filter_map(|report| report.result.err().map(|error| (report.stack, error)))
        .collect();

    let mut rendered = deployment.render_all()?;
    let stacks = deployment
        .stacks()
        .iter()
        .filter_map(|stack| {
            let mut values = rendered.shift_remove(stack.name())?;
            let outputs = stack
                .outputs
                .describe()
                .into_iter()
                .map(|(key, description)| SynthOutput {
                    key: key.to_string(),
                    value: values.shift_remove(key).unwrap_or_default(),
                    description: description.map(str::to_string),
                })
                .collect();
            Some(StackOutputs {
                stack: stack.name().to_string(),
                outputs,
            })
        })
        .collect();

    Ok(Synthesis { stacks, failures })
}

impl Synthesis {
    /// `{"<stack>": {"<key>": {"value": .., "description": ..}}}`
    #[must_use]
    pub fn to_json(&self) -> Value {
        let document: Map<String, Value> = self
            .stacks
            .iter()
            .map(|stack| {
                let outputs: Map<String, Value> = stack
                    .outputs
                    .iter()
                    .map(|output| {
                        let entry = json!({
                            "value": output.value,
                            "description": output.description,
                        });
                        (output.key.clone(), entry)
                    })
                    .collect();
                (stack.stack.clone(), Value::Object(outputs))
            })
            .collect();
        Value::Object(document)
    }

    /// Plain-text listing, one stack header followed by `key = value` lines
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for stack in &self.stacks {
            let _ = writeln!(text, "{}", stack.stack);
            for output in &stack.outputs {
                let _ = writeln!(text, "  {} = {}", output.key, output.value);
                if let Some(description) = &output.description {
                    let _ = writeln!(text, "      {description}");
                }
            }
        }
        text
    }

    /// Whether every stack resolved
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fail if any stack did not resolve
    ///
    /// # Errors
    /// Names every failed stack with its cause.
    pub fn check(&self) -> anyhow::Result<()> {
        if self.is_success() {
            return Ok(());
        }
        let detail = self
            .failures
            .iter()
            .map(|(stack, error)| format!("{stack}: {error}"))
            .collect::<Vec<_>>()
            .join("; ");
        bail!("{} stack(s) failed to resolve: {detail}", self.failures.len())
    }
}
