//! StackGraph Labs
//!
//! Lab stacks built on [`stackgraph_core`]:
//!
//! - [`lab1::secure_s3_endpoint`]: S3 access through a gateway endpoint with
//!   allow/deny policy and Session Manager command hosts
//! - [`lab3::ecs_fargate_app`]: ECR repository plus an ALB-fronted Fargate
//!   service
//!
//! [`SimulatedProvisioner`] realizes any stack offline with deterministic
//! ids, which is what `labctl synth` uses.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod lab1;
pub mod lab3;
pub mod session;
pub mod settings;
pub mod simulated;
pub mod synth;

pub use session::{session_url, session_url_for};
pub use settings::load_config;
pub use simulated::SimulatedProvisioner;
pub use synth::{synthesize, Synthesis};

use stackgraph_core::{Deployment, Properties, Result, StackConfig};

/// Every lab stack, registered in a single deployment
///
/// # Errors
/// Any declaration error while building a stack.
pub fn all_labs(config: &StackConfig) -> Result<Deployment> {
    let mut deployment = Deployment::new(config.clone());
    deployment.add_stack(lab1::secure_s3_endpoint(config)?)?;
    deployment.add_stack(lab3::ecs_fargate_app(config)?)?;
    Ok(deployment)
}

// Stack definitions only pass object literals.
pub(crate) fn props(value: serde_json::Value) -> Properties {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Properties::new(),
    }
}
