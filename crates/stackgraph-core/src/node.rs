//! Resource nodes
//!
//! A [`ResourceNode`] is the leaf description of one managed resource. It is
//! validated when declared and receives its exported attributes exactly once,
//! when the owning graph realizes it.

use crate::error::{CompositionError, Result};
use crate::kind::ResourceKind;
use crate::types::{Attributes, NodeId, Properties};
use serde::Serialize;
use serde_json::Value;

/// One declared resource
#[derive(Debug, Clone, Serialize)]
pub struct ResourceNode {
    id: NodeId,
    kind: ResourceKind,
    properties: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<Attributes>,
}

impl ResourceNode {
    /// Declare a node, validating `properties` against the kind's schema
    ///
    /// # Errors
    /// `InvalidConfiguration` for an empty id or properties the kind rejects.
    pub fn declare(
        id: impl Into<NodeId>,
        kind: ResourceKind,
        properties: Properties,
    ) -> Result<Self> {
        let id = id.into();
        if id.as_str().trim().is_empty() {
            return Err(CompositionError::invalid_configuration(
                kind,
                "id",
                "node id must not be empty",
            ));
        }

        kind.validate(&properties)?;

        Ok(Self {
            id,
            kind,
            properties,
            attributes: None,
        })
    }

    /// Node id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Resource kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Declared properties
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Single declared property
    #[inline]
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Whether the collaborator has realized this node
    #[inline]
    #[must_use]
    pub fn is_realized(&self) -> bool {
        self.attributes.is_some()
    }

    /// Realized attributes, if any
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> Option<&Attributes> {
        self.attributes.as_ref()
    }

    /// Read one exported attribute
    ///
    /// # Errors
    /// `UnknownAttribute` if the kind does not export `name`;
    /// `NotYetResolved` if the node has not been realized.
    pub fn export_attribute(&self, name: &str) -> Result<&Value> {
        if !self.kind.exports(name) {
            return Err(CompositionError::UnknownAttribute {
                kind: self.kind,
                attribute: name.to_string(),
            });
        }

        let attributes = self
            .attributes
            .as_ref()
            .ok_or_else(|| CompositionError::NotYetResolved(self.id.clone()))?;

        // realize() guarantees the full export set is present
        attributes
            .get(name)
            .ok_or_else(|| CompositionError::NotYetResolved(self.id.clone()))
    }

    /// Attach realized attributes
    ///
    /// Fails with the first exported name of the kind, or extra name of
    /// `schema`, the collaborator left out, and keeps only the kind's
    /// exported names. Nothing is stored unless the whole set is present.
    pub(crate) fn realize(
        &mut self,
        mut attributes: Attributes,
        schema: &[&str],
    ) -> std::result::Result<(), String> {
        let exports: &[&str] = self.kind.exported_attributes();
        if let Some(missing) = exports
            .iter()
            .chain(schema)
            .find(|name| !attributes.contains_key(**name))
        {
            return Err(format!(
                "{} did not return exported attribute `{missing}`",
                self.kind
            ));
        }

        attributes.retain(|name, _| self.kind.exports(name));
        self.attributes = Some(attributes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    fn network() -> ResourceNode {
        ResourceNode::declare(
            "vpc",
            ResourceKind::Network,
            props(json!({
                "maxAzs": 2,
                "natGateways": 0,
                "subnets": [{"name": "public", "subnetType": "PUBLIC"}],
            })),
        )
        .unwrap()
    }

    #[test]
    fn declare_rejects_empty_id() {
        let err = ResourceNode::declare(" ", ResourceKind::ContainerCluster, Properties::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CompositionError::InvalidConfiguration { ref property, .. } if property == "id"
        ));
    }

    #[test]
    fn declare_rejects_bad_properties() {
        let err = ResourceNode::declare(
            "repo",
            ResourceKind::ContainerRepository,
            props(json!({"repositoryName": ""})),
        )
        .unwrap_err();
        assert!(matches!(err, CompositionError::InvalidConfiguration { .. }));
    }

    #[test]
    fn export_before_realize_fails() {
        let node = network();
        assert_eq!(
            node.export_attribute("networkId"),
            Err(CompositionError::NotYetResolved(NodeId::from("vpc")))
        );
    }

    #[test]
    fn unknown_attribute_checked_first() {
        let node = network();
        assert_eq!(
            node.export_attribute("instanceId"),
            Err(CompositionError::UnknownAttribute {
                kind: ResourceKind::Network,
                attribute: "instanceId".into(),
            })
        );
    }

    #[test]
    fn realize_populates_export_set() {
        let mut node = network();
        let attributes = props(json!({
            "networkId": "vpc-1",
            "publicSubnetIds": ["subnet-a"],
            "privateSubnetIds": [],
            "isolatedSubnetIds": [],
            "defaultSecurityGroupId": "sg-1",
            "extra": "dropped",
        }));
        node.realize(attributes, ResourceKind::Network.exported_attributes())
            .unwrap();

        assert!(node.is_realized());
        assert_eq!(node.export_attribute("networkId"), Ok(&json!("vpc-1")));
        assert!(!node.attributes().unwrap().contains_key("extra"));
    }

    #[test]
    fn realize_rejects_partial_attributes() {
        let mut node = network();
        let err = node
            .realize(
                props(json!({"networkId": "vpc-1"})),
                ResourceKind::Network.exported_attributes(),
            )
            .unwrap_err();
        assert!(err.contains("publicSubnetIds"));
        assert!(!node.is_realized());
    }

    #[test]
    fn narrower_schema_still_requires_kind_exports() {
        let mut node = network();
        let err = node
            .realize(props(json!({"networkId": "vpc-1"})), &["networkId"])
            .unwrap_err();
        assert!(err.contains("publicSubnetIds"));
        assert!(!node.is_realized());
    }
}
