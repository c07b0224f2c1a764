//! Resource kinds and their static schema table
//!
//! Each [`ResourceKind`] carries a [`KindSchema`]: the properties it accepts
//! (with type and required flag) and the attributes it exports once
//! realized. Declarations are validated against this table, and attribute
//! reads are checked against the export set.

use crate::error::{CompositionError, Result};
use crate::types::Properties;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Tag identifying the type of managed resource a node describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Virtual network with subnet groups
    Network,
    /// Interface endpoint into a network (e.g. SSM)
    InterfaceEndpoint,
    /// Gateway endpoint with an optional access policy (e.g. S3)
    GatewayEndpoint,
    /// Object storage bucket
    Bucket,
    /// Upload of local assets into a bucket
    BucketDeployment,
    /// IAM role
    Role,
    /// Instance profile wrapping a role
    InstanceProfile,
    /// Compute instance
    Compute,
    /// Container image repository
    ContainerRepository,
    /// Container cluster
    ContainerCluster,
    /// Load-balanced container service
    LoadBalancedService,
}

impl ResourceKind {
    /// Every kind, in declaration order
    pub const ALL: [ResourceKind; 11] = [
        ResourceKind::Network,
        ResourceKind::InterfaceEndpoint,
        ResourceKind::GatewayEndpoint,
        ResourceKind::Bucket,
        ResourceKind::BucketDeployment,
        ResourceKind::Role,
        ResourceKind::InstanceProfile,
        ResourceKind::Compute,
        ResourceKind::ContainerRepository,
        ResourceKind::ContainerCluster,
        ResourceKind::LoadBalancedService,
    ];

    /// Stable name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Network => "Network",
            ResourceKind::InterfaceEndpoint => "InterfaceEndpoint",
            ResourceKind::GatewayEndpoint => "GatewayEndpoint",
            ResourceKind::Bucket => "Bucket",
            ResourceKind::BucketDeployment => "BucketDeployment",
            ResourceKind::Role => "Role",
            ResourceKind::InstanceProfile => "InstanceProfile",
            ResourceKind::Compute => "Compute",
            ResourceKind::ContainerRepository => "ContainerRepository",
            ResourceKind::ContainerCluster => "ContainerCluster",
            ResourceKind::LoadBalancedService => "LoadBalancedService",
        }
    }

    /// Static schema for this kind
    #[must_use]
    pub fn schema(self) -> &'static KindSchema {
        match self {
            ResourceKind::Network => &NETWORK,
            ResourceKind::InterfaceEndpoint => &INTERFACE_ENDPOINT,
            ResourceKind::GatewayEndpoint => &GATEWAY_ENDPOINT,
            ResourceKind::Bucket => &BUCKET,
            ResourceKind::BucketDeployment => &BUCKET_DEPLOYMENT,
            ResourceKind::Role => &ROLE,
            ResourceKind::InstanceProfile => &INSTANCE_PROFILE,
            ResourceKind::Compute => &COMPUTE,
            ResourceKind::ContainerRepository => &CONTAINER_REPOSITORY,
            ResourceKind::ContainerCluster => &CONTAINER_CLUSTER,
            ResourceKind::LoadBalancedService => &LOAD_BALANCED_SERVICE,
        }
    }

    /// Attribute names this kind exports after realization
    #[inline]
    #[must_use]
    pub fn exported_attributes(self) -> &'static [&'static str] {
        self.schema().attributes
    }

    /// Check whether `attribute` is in the export set
    #[inline]
    #[must_use]
    pub fn exports(self, attribute: &str) -> bool {
        self.exported_attributes().contains(&attribute)
    }

    /// Validate a property map against the schema
    ///
    /// # Errors
    /// `InvalidConfiguration` for a missing required property, an unknown
    /// property, or a value of the wrong shape.
    pub fn validate(self, properties: &Properties) -> Result<()> {
        let schema = self.schema();

        for spec in schema.properties {
            match properties.get(spec.name) {
                Some(value) => spec
                    .ty
                    .check(value)
                    .map_err(|reason| CompositionError::invalid_configuration(self, spec.name, reason))?,
                None if spec.required => {
                    return Err(CompositionError::invalid_configuration(
                        self,
                        spec.name,
                        "required property is missing",
                    ));
                }
                None => {}
            }
        }

        if let Some(unknown) = properties
            .keys()
            .find(|key| !schema.properties.iter().any(|spec| spec.name == key.as_str()))
        {
            return Err(CompositionError::invalid_configuration(
                self,
                unknown.as_str(),
                "unknown property",
            ));
        }

        Ok(())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties and exports of one kind
#[derive(Debug)]
pub struct KindSchema {
    /// Accepted properties
    pub properties: &'static [PropertySpec],
    /// Exported attribute names
    pub attributes: &'static [&'static str],
}

/// One accepted property
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    /// Property name
    pub name: &'static str,
    /// Expected value shape
    pub ty: PropertyType,
    /// Whether declarations must provide it
    pub required: bool,
}

const fn required(name: &'static str, ty: PropertyType) -> PropertySpec {
    PropertySpec {
        name,
        ty,
        required: true,
    }
}

const fn optional(name: &'static str, ty: PropertyType) -> PropertySpec {
    PropertySpec {
        name,
        ty,
        required: false,
    }
}

/// Accepted subnet type names
pub const SUBNET_TYPES: [&str; 3] = ["PUBLIC", "PRIVATE_ISOLATED", "PRIVATE_WITH_EGRESS"];

/// Accepted removal policies
pub const REMOVAL_POLICIES: [&str; 2] = ["DESTROY", "RETAIN"];

/// Accepted policy statement effects
pub const EFFECTS: [&str; 2] = ["ALLOW", "DENY"];

/// Shape a property value must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// Any string
    String,
    /// String with at least one non-whitespace character
    NonEmptyString,
    /// Globally unique bucket name (3-63 chars, lowercase, digits, `.`, `-`)
    BucketName,
    /// Integer >= 0
    NonNegativeInt,
    /// Integer >= 1
    PositiveInt,
    /// Boolean flag
    Bool,
    /// Array of strings
    StringList,
    /// One of [`SUBNET_TYPES`]
    SubnetType,
    /// One of [`REMOVAL_POLICIES`]
    RemovalPolicy,
    /// Arbitrary JSON object
    Object,
    /// Array of `{name, subnetType}` objects
    SubnetGroups,
    /// Array of `{effect, actions, resources}` policy statements
    Statements,
}

impl PropertyType {
    /// Check a value, returning the reason on mismatch
    ///
    /// # Errors
    /// Human-readable reason when the value does not fit.
    pub fn check(self, value: &Value) -> std::result::Result<(), String> {
        match self {
            PropertyType::String => expect_str(value).map(drop),
            PropertyType::NonEmptyString => {
                let s = expect_str(value)?;
                if s.trim().is_empty() {
                    return Err("must not be empty".into());
                }
                Ok(())
            }
            PropertyType::BucketName => check_bucket_name(expect_str(value)?),
            PropertyType::NonNegativeInt => expect_int(value).map(drop),
            PropertyType::PositiveInt => {
                if expect_int(value)? == 0 {
                    return Err("must be at least 1".into());
                }
                Ok(())
            }
            PropertyType::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err("expected a boolean".into())
                }
            }
            PropertyType::StringList => expect_string_list(value),
            PropertyType::SubnetType => expect_one_of(value, &SUBNET_TYPES),
            PropertyType::RemovalPolicy => expect_one_of(value, &REMOVAL_POLICIES),
            PropertyType::Object => {
                if value.is_object() {
                    Ok(())
                } else {
                    Err("expected an object".into())
                }
            }
            PropertyType::SubnetGroups => {
                let groups = expect_array(value)?;
                if groups.is_empty() {
                    return Err("at least one subnet group is required".into());
                }
                for group in groups {
                    let name = field(group, "name")?;
                    PropertyType::NonEmptyString.check(name)?;
                    expect_one_of(field(group, "subnetType")?, &SUBNET_TYPES)?;
                }
                Ok(())
            }
            PropertyType::Statements => {
                for statement in expect_array(value)? {
                    expect_one_of(field(statement, "effect")?, &EFFECTS)?;
                    expect_string_list(field(statement, "actions")?)?;
                    expect_string_list(field(statement, "resources")?)?;
                }
                Ok(())
            }
        }
    }
}

fn expect_str(value: &Value) -> std::result::Result<&str, String> {
    value.as_str().ok_or_else(|| "expected a string".to_string())
}

fn expect_array(value: &Value) -> std::result::Result<&Vec<Value>, String> {
    value.as_array().ok_or_else(|| "expected an array".to_string())
}

fn expect_int(value: &Value) -> std::result::Result<u64, String> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    match value.as_i64() {
        Some(n) if n < 0 => Err(format!("must not be negative (got {n})")),
        _ if value.is_number() => Err("must be an integer".into()),
        _ => Err("expected an integer".into()),
    }
}

fn expect_string_list(value: &Value) -> std::result::Result<(), String> {
    if expect_array(value)?.iter().all(Value::is_string) {
        Ok(())
    } else {
        Err("expected an array of strings".into())
    }
}

fn expect_one_of(value: &Value, allowed: &[&str]) -> std::result::Result<(), String> {
    let s = expect_str(value)?;
    if allowed.contains(&s) {
        Ok(())
    } else {
        Err(format!("`{s}` is not one of {}", allowed.join(", ")))
    }
}

fn field<'a>(value: &'a Value, name: &str) -> std::result::Result<&'a Value, String> {
    value
        .as_object()
        .ok_or_else(|| "expected an object".to_string())?
        .get(name)
        .ok_or_else(|| format!("missing field `{name}`"))
}

fn check_bucket_name(name: &str) -> std::result::Result<(), String> {
    if !(3..=63).contains(&name.len()) {
        return Err(format!("bucket name must be 3-63 characters (got {})", name.len()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err("bucket name may only contain lowercase letters, digits, `.` and `-`".into());
    }
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !edge_ok(name.chars().next()) || !edge_ok(name.chars().last()) {
        return Err("bucket name must start and end with a letter or digit".into());
    }
    Ok(())
}

static NETWORK: KindSchema = KindSchema {
    properties: &[
        required("maxAzs", PropertyType::PositiveInt),
        required("natGateways", PropertyType::NonNegativeInt),
        required("subnets", PropertyType::SubnetGroups),
        optional("restrictDefaultSecurityGroup", PropertyType::Bool),
    ],
    attributes: &[
        "networkId",
        "publicSubnetIds",
        "privateSubnetIds",
        "isolatedSubnetIds",
        "defaultSecurityGroupId",
    ],
};

static INTERFACE_ENDPOINT: KindSchema = KindSchema {
    properties: &[
        required("service", PropertyType::NonEmptyString),
        required("subnetType", PropertyType::SubnetType),
        optional("privateDnsEnabled", PropertyType::Bool),
    ],
    attributes: &["endpointId", "dnsName"],
};

static GATEWAY_ENDPOINT: KindSchema = KindSchema {
    properties: &[
        required("service", PropertyType::NonEmptyString),
        required("subnetType", PropertyType::SubnetType),
        optional("policyStatements", PropertyType::Statements),
    ],
    attributes: &["endpointId"],
};

static BUCKET: KindSchema = KindSchema {
    properties: &[
        required("bucketName", PropertyType::BucketName),
        optional("removalPolicy", PropertyType::RemovalPolicy),
        optional("autoDeleteObjects", PropertyType::Bool),
        optional("blockPublicAccess", PropertyType::Bool),
    ],
    attributes: &["bucketName", "bucketArn"],
};

static BUCKET_DEPLOYMENT: KindSchema = KindSchema {
    properties: &[
        required("source", PropertyType::NonEmptyString),
        optional("destinationKeyPrefix", PropertyType::String),
    ],
    attributes: &["deploymentId"],
};

static ROLE: KindSchema = KindSchema {
    properties: &[
        required("assumedBy", PropertyType::NonEmptyString),
        optional("managedPolicies", PropertyType::StringList),
        optional("inlinePolicies", PropertyType::Object),
    ],
    attributes: &["roleArn", "roleName"],
};

static INSTANCE_PROFILE: KindSchema = KindSchema {
    properties: &[optional("path", PropertyType::String)],
    attributes: &["instanceProfileArn", "instanceProfileName"],
};

static COMPUTE: KindSchema = KindSchema {
    properties: &[
        required("instanceType", PropertyType::NonEmptyString),
        required("machineImage", PropertyType::NonEmptyString),
        required("subnetType", PropertyType::SubnetType),
        optional("userData", PropertyType::StringList),
    ],
    attributes: &["instanceId", "privateIp", "roleArn"],
};

static CONTAINER_REPOSITORY: KindSchema = KindSchema {
    properties: &[
        required("repositoryName", PropertyType::NonEmptyString),
        optional("emptyOnDelete", PropertyType::Bool),
        optional("removalPolicy", PropertyType::RemovalPolicy),
    ],
    attributes: &["repositoryName", "repositoryArn", "repositoryUri"],
};

static CONTAINER_CLUSTER: KindSchema = KindSchema {
    properties: &[optional("enableFargateCapacityProviders", PropertyType::Bool)],
    attributes: &["clusterName", "clusterArn"],
};

static LOAD_BALANCED_SERVICE: KindSchema = KindSchema {
    properties: &[
        required("serviceName", PropertyType::NonEmptyString),
        required("containerName", PropertyType::NonEmptyString),
        required("desiredCount", PropertyType::NonNegativeInt),
        optional("family", PropertyType::NonEmptyString),
        optional("enableLogging", PropertyType::Bool),
        optional("cpu", PropertyType::PositiveInt),
        optional("memoryLimitMiB", PropertyType::PositiveInt),
    ],
    attributes: &[
        "serviceName",
        "loadBalancerDnsName",
        "securityGroupId",
        "executionRoleArn",
        "targetGroupArn",
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Value) -> Properties {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn reason_for(kind: ResourceKind, value: Value) -> (String, String) {
        match kind.validate(&props(value)) {
            Err(CompositionError::InvalidConfiguration {
                property, reason, ..
            }) => (property, reason),
            other => panic!("expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn every_kind_exports_something() {
        for kind in ResourceKind::ALL {
            assert!(!kind.exported_attributes().is_empty(), "{kind}");
        }
    }

    #[test]
    fn network_accepts_valid_properties() {
        let properties = props(json!({
            "maxAzs": 1,
            "natGateways": 0,
            "subnets": [{"name": "public", "subnetType": "PUBLIC"}],
        }));
        assert!(ResourceKind::Network.validate(&properties).is_ok());
    }

    #[test]
    fn missing_required_property() {
        let (property, reason) =
            reason_for(ResourceKind::Network, json!({"maxAzs": 1, "natGateways": 0}));
        assert_eq!(property, "subnets");
        assert_eq!(reason, "required property is missing");
    }

    #[test]
    fn negative_size_is_rejected() {
        let (property, reason) = reason_for(
            ResourceKind::LoadBalancedService,
            json!({"serviceName": "web", "containerName": "web", "desiredCount": -1}),
        );
        assert_eq!(property, "desiredCount");
        assert!(reason.contains("negative"));
    }

    #[test]
    fn zero_is_not_positive() {
        let (property, _) = reason_for(
            ResourceKind::Network,
            json!({"maxAzs": 0, "natGateways": 0, "subnets": [{"name": "a", "subnetType": "PUBLIC"}]}),
        );
        assert_eq!(property, "maxAzs");
    }

    #[test]
    fn unknown_property_is_rejected() {
        let (property, reason) = reason_for(
            ResourceKind::ContainerCluster,
            json!({"enableFargate": true}),
        );
        assert_eq!(property, "enableFargate");
        assert_eq!(reason, "unknown property");
    }

    #[test]
    fn subnet_type_must_be_known() {
        let (property, reason) = reason_for(
            ResourceKind::Compute,
            json!({"instanceType": "t3.micro", "machineImage": "al2023", "subnetType": "DMZ"}),
        );
        assert_eq!(property, "subnetType");
        assert!(reason.contains("DMZ"));
    }

    #[test]
    fn bucket_names() {
        assert!(PropertyType::BucketName.check(&json!("lab-bucket-123456789012-us-east-1")).is_ok());
        assert!(PropertyType::BucketName.check(&json!("ab")).is_err());
        assert!(PropertyType::BucketName.check(&json!("Lab-Bucket")).is_err());
        assert!(PropertyType::BucketName.check(&json!("-lab")).is_err());
        assert!(PropertyType::BucketName.check(&json!("x".repeat(64))).is_err());
    }

    #[test]
    fn statements_shape() {
        let ok = json!([{"effect": "DENY", "actions": ["s3:*"], "resources": ["arn:aws:s3:::b"]}]);
        assert!(PropertyType::Statements.check(&ok).is_ok());

        let bad = json!([{"effect": "MAYBE", "actions": [], "resources": []}]);
        assert!(PropertyType::Statements.check(&bad).is_err());
    }

    #[test]
    fn fractional_integer_is_rejected() {
        assert_eq!(
            PropertyType::NonNegativeInt.check(&json!(1.5)),
            Err("must be an integer".to_string())
        );
    }
}
