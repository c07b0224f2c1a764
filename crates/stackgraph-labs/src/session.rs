//! Session Manager console links

use stackgraph_core::{NodeId, OutputValue};

/// Console link for an instance whose id is only known after resolution
#[must_use]
pub fn session_url(instance: impl Into<NodeId>, region: &str) -> OutputValue {
    OutputValue::Concat(vec![
        OutputValue::literal(format!(
            "https://{region}.console.aws.amazon.com/systems-manager/session-manager/"
        )),
        OutputValue::attribute(instance, "instanceId"),
        OutputValue::literal(format!("?region={region}")),
    ])
}

/// Console link for a known instance id
#[must_use]
pub fn session_url_for(instance_id: &str, region: &str) -> String {
    format!(
        "https://{region}.console.aws.amazon.com/systems-manager/session-manager/{instance_id}?region={region}"
    )
}
