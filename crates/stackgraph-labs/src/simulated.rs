//! Offline provisioner producing realistic, deterministic identifiers
//!
//! Every id is derived from a SHA-256 digest of account, region, stack and
//! node id, so the same declaration always yields the same attributes. A
//! handful of placement rules are enforced so misconfigured stacks fail the
//! way they would against the real control plane.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use stackgraph_core::{Attributes, ProvisionError, Provisioner, RealizeRequest, ResourceKind};
use tracing::trace;

/// Deterministic in-memory provisioner
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedProvisioner;

impl SimulatedProvisioner {
    /// Create a simulator
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Provisioner for SimulatedProvisioner {
    fn realize(&self, request: &RealizeRequest<'_>) -> Result<Attributes, ProvisionError> {
        let ids = Ids::new(request);
        let account = &request.config.account;
        let region = &request.config.region;
        trace!(stack = request.stack, node = %request.node_id, "simulating realization");

        let attributes = match request.kind {
            ResourceKind::Network => network(request, &ids)?,
            ResourceKind::InterfaceEndpoint => {
                require_subnets(request)?;
                let endpoint_id = format!("vpce-{}", ids.hex(0, 17));
                let service = str_prop(request, "service");
                json!({
                    "endpointId": endpoint_id,
                    "dnsName": format!("{endpoint_id}.{service}.{region}.vpce.amazonaws.com"),
                })
            }
            ResourceKind::GatewayEndpoint => {
                require_subnets(request)?;
                json!({"endpointId": format!("vpce-{}", ids.hex(0, 17))})
            }
            ResourceKind::Bucket => {
                let name = str_prop(request, "bucketName");
                json!({
                    "bucketName": name,
                    "bucketArn": format!("arn:aws:s3:::{name}"),
                })
            }
            ResourceKind::BucketDeployment => {
                json!({"deploymentId": ids.named(8)})
            }
            ResourceKind::Role => {
                let name = ids.named(12);
                json!({
                    "roleName": name,
                    "roleArn": format!("arn:aws:iam::{account}:role/{name}"),
                })
            }
            ResourceKind::InstanceProfile => {
                let name = ids.named(12);
                json!({
                    "instanceProfileName": name,
                    "instanceProfileArn": format!("arn:aws:iam::{account}:instance-profile/{name}"),
                })
            }
            ResourceKind::Compute => {
                require_subnets(request)?;
                let digest = ids.digest;
                let role = format!("{}-InstanceRole-{}", request.stack, ids.hex(17, 12).to_uppercase());
                json!({
                    "instanceId": format!("i-{}", ids.hex(0, 17)),
                    "privateIp": format!("10.0.{}.{}", digest[0], digest[1].max(4)),
                    "roleArn": format!("arn:aws:iam::{account}:role/{role}"),
                })
            }
            ResourceKind::ContainerRepository => {
                let name = str_prop(request, "repositoryName");
                json!({
                    "repositoryName": name,
                    "repositoryArn": format!("arn:aws:ecr:{region}:{account}:repository/{name}"),
                    "repositoryUri": format!("{account}.dkr.ecr.{region}.amazonaws.com/{name}"),
                })
            }
            ResourceKind::ContainerCluster => {
                let name = ids.named(12);
                json!({
                    "clusterName": name,
                    "clusterArn": format!("arn:aws:ecs:{region}:{account}:cluster/{name}"),
                })
            }
            ResourceKind::LoadBalancedService => {
                let depends_on_cluster = request
                    .dependencies
                    .values()
                    .any(|attributes| attributes.contains_key("clusterArn"));
                if !depends_on_cluster {
                    return Err(ProvisionError::new(format!(
                        "service `{}` needs a ContainerCluster dependency",
                        request.node_id
                    )));
                }
                let digest = ids.digest;
                let lb = format!("{}-{}", request.stack, ids.hex(0, 8));
                let lb_number = u32::from_be_bytes([digest[8], digest[9], digest[10], digest[11]]);
                let execution_role = format!("{}-TaskExecutionRole-{}", request.stack, ids.hex(25, 12).to_uppercase());
                json!({
                    "serviceName": str_prop(request, "serviceName"),
                    "loadBalancerDnsName": format!("{lb}-{lb_number}.{region}.elb.amazonaws.com"),
                    "securityGroupId": format!("sg-{}", ids.hex(8, 17)),
                    "executionRoleArn": format!("arn:aws:iam::{account}:role/{execution_role}"),
                    "targetGroupArn": format!(
                        "arn:aws:elasticloadbalancing:{region}:{account}:targetgroup/{}/{}",
                        ids.hex(0, 12),
                        ids.hex(12, 16)
                    ),
                })
            }
        };

        match attributes {
            Value::Object(map) => Ok(map),
            _ => Err(ProvisionError::new("simulator produced a non-object")),
        }
    }
}

/// Most availability zones any simulated region offers
const MAX_AZS: u64 = 6;

fn network(request: &RealizeRequest<'_>, ids: &Ids<'_>) -> Result<Value, ProvisionError> {
    let max_azs = request
        .properties
        .get("maxAzs")
        .and_then(Value::as_u64)
        .unwrap_or(1);
    if max_azs > MAX_AZS {
        return Err(ProvisionError::new(format!(
            "maxAzs {max_azs} exceeds the {MAX_AZS} availability zones of a region"
        )));
    }
    let nat_gateways = request
        .properties
        .get("natGateways")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let groups = request
        .properties
        .get("subnets")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut public = Vec::new();
    let mut private = Vec::new();
    let mut isolated = Vec::new();
    for (group_index, group) in groups.iter().enumerate() {
        let subnet_type = group.get("subnetType").and_then(Value::as_str).unwrap_or("");
        let target = match subnet_type {
            "PUBLIC" => &mut public,
            "PRIVATE_ISOLATED" => &mut isolated,
            _ if nat_gateways == 0 => {
                return Err(ProvisionError::new(format!(
                    "{subnet_type} subnets require at least one NAT gateway"
                )));
            }
            _ => &mut private,
        };
        for az in 0..max_azs {
            target.push(format!("subnet-{}", ids.derived(&format!("{group_index}/{az}"), 17)));
        }
    }

    Ok(json!({
        "networkId": format!("vpc-{}", ids.hex(0, 17)),
        "publicSubnetIds": public,
        "privateSubnetIds": private,
        "isolatedSubnetIds": isolated,
        "defaultSecurityGroupId": format!("sg-{}", ids.hex(17, 17)),
    }))
}

// Placement needs a realized network with subnets of the requested type.
fn require_subnets(request: &RealizeRequest<'_>) -> Result<(), ProvisionError> {
    let subnet_type = str_prop(request, "subnetType");
    let key = match subnet_type {
        "PUBLIC" => "publicSubnetIds",
        "PRIVATE_WITH_EGRESS" => "privateSubnetIds",
        _ => "isolatedSubnetIds",
    };

    let network = request
        .dependencies
        .values()
        .find(|attributes| attributes.contains_key("networkId"))
        .ok_or_else(|| {
            ProvisionError::new(format!(
                "`{}` needs a Network dependency",
                request.node_id
            ))
        })?;

    let available = network
        .get(key)
        .and_then(Value::as_array)
        .is_some_and(|subnets| !subnets.is_empty());
    if !available {
        return Err(ProvisionError::new(format!(
            "no {subnet_type} subnets available for `{}`",
            request.node_id
        )));
    }
    Ok(())
}

fn str_prop<'a>(request: &'a RealizeRequest<'_>, name: &str) -> &'a str {
    request
        .properties
        .get(name)
        .and_then(Value::as_str)
        .unwrap_or_default()
}

struct Ids<'a> {
    seed: String,
    digest: [u8; 32],
    stack: &'a str,
    node: &'a str,
}

impl<'a> Ids<'a> {
    fn new(request: &'a RealizeRequest<'_>) -> Self {
        let seed = format!(
            "{}/{}/{}/{}",
            request.config.account,
            request.config.region,
            request.stack,
            request.node_id
        );
        let digest = Sha256::digest(seed.as_bytes()).into();
        Self {
            seed,
            digest,
            stack: request.stack,
            node: request.node_id.as_str(),
        }
    }

    /// `len` hex characters starting at character `offset`
    fn hex(&self, offset: usize, len: usize) -> String {
        hex::encode(self.digest).chars().skip(offset).take(len).collect()
    }

    fn derived(&self, salt: &str, len: usize) -> String {
        let digest = Sha256::digest(format!("{}#{salt}", self.seed).as_bytes());
        hex::encode(digest).chars().take(len).collect()
    }

    // CloudFormation-style physical name: <stack>-<node>-<SUFFIX>
    fn named(&self, len: usize) -> String {
        format!(
            "{}-{}-{}",
            self.stack,
            self.node,
            self.hex(0, len).to_uppercase()
        )
    }
}
