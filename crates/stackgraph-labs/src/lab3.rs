//! Lab 3: containerized web app on ECS Fargate
//!
//! Two public subnets, a docker-enabled command host for pushing images, an
//! ECR repository the host can push to, and an ALB-fronted Fargate service
//! pulling from that repository.

use crate::props;
use crate::session::session_url;
use serde_json::json;
use stackgraph_core::{OutputValue, ResourceKind, Result, Stack, StackConfig};

/// Stack name
pub const STACK_NAME: &str = "Lab3";

/// Repository the service image is pushed to
pub const REPOSITORY_NAME: &str = "web-2048";

/// Build the Lab 3 stack
///
/// # Errors
/// Any declaration or wiring error from the composer.
pub fn ecs_fargate_app(config: &StackConfig) -> Result<Stack> {
    let mut stack = Stack::new(STACK_NAME, config.clone());
    let graph = &mut stack.graph;

    let vpc = graph.declare(
        "Vpc",
        ResourceKind::Network,
        props(json!({
            "maxAzs": 2,
            "natGateways": 0,
            "subnets": [{"name": "lab3-public-subnet", "subnetType": "PUBLIC"}],
            "restrictDefaultSecurityGroup": false,
        })),
    )?;

    let host = graph.declare(
        "CommandHost",
        ResourceKind::Compute,
        props(json!({
            "instanceType": "t3.nano",
            "machineImage": "amazon-linux-2023",
            "subnetType": "PUBLIC",
            "userData": [
                "yum update -y",
                "yum install -y docker",
                "systemctl enable docker",
                "usermod -aG docker $USER",
            ],
        })),
    )?;
    graph.depends_on(&host, &vpc)?;

    // Pull/push is granted to the host's role, so the host comes first.
    let repository = graph.declare(
        "Web2048Repository",
        ResourceKind::ContainerRepository,
        props(json!({
            "repositoryName": REPOSITORY_NAME,
            "emptyOnDelete": true,
            "removalPolicy": "DESTROY",
        })),
    )?;
    graph.depends_on(&repository, &host)?;

    let cluster = graph.declare(
        "EcsCluster",
        ResourceKind::ContainerCluster,
        props(json!({"enableFargateCapacityProviders": true})),
    )?;
    graph.depends_on(&cluster, &vpc)?;

    let service = graph.declare(
        "Web2048Service",
        ResourceKind::LoadBalancedService,
        props(json!({
            "serviceName": "web2048",
            "containerName": "web2048",
            "family": "web2048",
            "enableLogging": false,
            "desiredCount": 1,
        })),
    )?;
    graph.depends_on(&service, &cluster)?;
    graph.depends_on(&service, &repository)?;

    let outputs = &mut stack.outputs;
    outputs.add_output_with_description(
        "CommandHostSessionURL",
        session_url(&host, &config.region),
        "SSM Session URL for Command Host",
    )?;
    outputs.add_output_with_description(
        "PublicSubnetIDs",
        OutputValue::attribute(&vpc, "publicSubnetIds"),
        "Public Subnet IDs",
    )?;
    outputs.add_output_with_description("Region", config.region.as_str(), "AWS Region")?;
    outputs.add_output_with_description(
        "AlbPublicDnsUrl",
        OutputValue::attribute(&service, "loadBalancerDnsName"),
        "Application Load Balancer Public DNS URL",
    )?;
    outputs.add_output_with_description(
        "EcsSecurityGroup",
        OutputValue::attribute(&service, "securityGroupId"),
        "ECS Service Security Group",
    )?;
    outputs.add_output_with_description(
        "EcsTaskExecutionRoleArn",
        OutputValue::attribute(&service, "executionRoleArn"),
        "ECS Task Execution Role ARN",
    )?;
    outputs.add_output_with_description(
        "AlbTargetGroupArn",
        OutputValue::attribute(&service, "targetGroupArn"),
        "Application Load Balancer Target Group ARN",
    )?;

    Ok(stack)
}
