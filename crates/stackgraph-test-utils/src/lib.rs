//! Testing utilities for StackGraph workspace
//!
//! Shared test helpers, fixtures, and a recording provisioner.

#![allow(missing_docs)]

use parking_lot::Mutex;
use serde_json::{json, Value};
use stackgraph_core::{
    Attributes, NodeId, Properties, ProvisionError, Provisioner, RealizeRequest, ResolvedDependencies,
    ResourceKind, StackConfig,
};
use std::collections::HashMap;

/// One `realize` call as seen by [`RecordingProvisioner`]
#[derive(Debug, Clone, PartialEq)]
pub struct RealizeCall {
    pub stack: String,
    pub node_id: NodeId,
    pub kind: ResourceKind,
    pub properties: Properties,
    pub dependencies: ResolvedDependencies,
}

/// Provisioner that records every call and can be scripted to fail
///
/// Attributes default to `"<node>.<attribute>"`; individual values can be
/// overridden with [`RecordingProvisioner::with_attribute`].
#[derive(Debug, Default)]
pub struct RecordingProvisioner {
    calls: Mutex<Vec<RealizeCall>>,
    failures: Mutex<HashMap<NodeId, String>>,
    overrides: HashMap<(NodeId, String), Value>,
    omitted: Vec<(NodeId, String)>,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail realization of `node` with `message` until cleared
    pub fn fail_on(self, node: &str, message: &str) -> Self {
        self.failures
            .lock()
            .insert(NodeId::from(node), message.to_string());
        self
    }

    /// Fix the value returned for one attribute
    pub fn with_attribute(mut self, node: &str, attribute: &str, value: Value) -> Self {
        self.overrides
            .insert((NodeId::from(node), attribute.to_string()), value);
        self
    }

    /// Leave one attribute out of the returned set
    pub fn omitting(mut self, node: &str, attribute: &str) -> Self {
        self.omitted.push((NodeId::from(node), attribute.to_string()));
        self
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn calls(&self) -> Vec<RealizeCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Node ids in the order they were handed over
    pub fn realized_order(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|call| call.node_id.to_string())
            .collect()
    }
}

impl Provisioner for RecordingProvisioner {
    fn realize(&self, request: &RealizeRequest<'_>) -> Result<Attributes, ProvisionError> {
        self.calls.lock().push(RealizeCall {
            stack: request.stack.to_string(),
            node_id: request.node_id.clone(),
            kind: request.kind,
            properties: request.properties.clone(),
            dependencies: request.dependencies.clone(),
        });

        if let Some(message) = self.failures.lock().get(request.node_id) {
            return Err(ProvisionError::new(message.clone()));
        }

        Ok(request
            .kind
            .exported_attributes()
            .iter()
            .filter(|name| {
                !self
                    .omitted
                    .iter()
                    .any(|(node, attr)| node == request.node_id && attr == **name)
            })
            .map(|name| {
                let key = (request.node_id.clone(), (*name).to_string());
                let value = self
                    .overrides
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| json!(format!("{}.{name}", request.node_id)));
                ((*name).to_string(), value)
            })
            .collect())
    }
}

pub fn test_config() -> StackConfig {
    StackConfig::new("123456789012", "us-east-1").unwrap()
}

/// Object literal as a property map
pub fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn network_properties() -> Properties {
    props(json!({
        "maxAzs": 1,
        "natGateways": 0,
        "subnets": [{"name": "public", "subnetType": "PUBLIC"}],
    }))
}

pub fn compute_properties() -> Properties {
    props(json!({
        "instanceType": "t3.micro",
        "machineImage": "amazon-linux-2023",
        "subnetType": "PUBLIC",
    }))
}
