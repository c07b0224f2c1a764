//! Lab 1: secure S3 access through a gateway endpoint
//!
//! A single-AZ network without NAT, reachable only through an SSM interface
//! endpoint. An S3 gateway endpoint allows the lab bucket and denies the
//! logging bucket. Two command hosts, one public and one isolated, share an
//! EC2 role with Session Manager and S3 access.

use crate::props;
use crate::session::session_url;
use serde_json::json;
use stackgraph_core::{OutputValue, Properties, ResourceKind, Result, Stack, StackConfig};

/// Stack name
pub const STACK_NAME: &str = "Lab1";

/// Build the Lab 1 stack
///
/// # Errors
/// Any declaration or wiring error from the composer.
pub fn secure_s3_endpoint(config: &StackConfig) -> Result<Stack> {
    let mut stack = Stack::new(STACK_NAME, config.clone());
    let graph = &mut stack.graph;

    let vpc = graph.declare(
        "Lab1VPC",
        ResourceKind::Network,
        props(json!({
            "maxAzs": 1,
            "natGateways": 0,
            "subnets": [
                {"name": "Public", "subnetType": "PUBLIC"},
                {"name": "Isolated", "subnetType": "PRIVATE_ISOLATED"},
            ],
            "restrictDefaultSecurityGroup": false,
        })),
    )?;

    let ssm = graph.declare(
        "SSMEndpoint",
        ResourceKind::InterfaceEndpoint,
        props(json!({"service": "ssm", "subnetType": "PRIVATE_ISOLATED"})),
    )?;
    graph.depends_on(&ssm, &vpc)?;

    let lab_bucket_name = format!("lab-bucket-{}-{}", config.account, config.region);
    let logging_bucket_name = format!("lab-logging-bucket-{}-{}", config.account, config.region);
    let lab_bucket = graph.declare("LabBucket", ResourceKind::Bucket, bucket(&lab_bucket_name))?;
    let logging_bucket = graph.declare(
        "LabLoggingBucket",
        ResourceKind::Bucket,
        bucket(&logging_bucket_name),
    )?;

    let s3 = graph.declare(
        "S3Endpoint",
        ResourceKind::GatewayEndpoint,
        props(json!({
            "service": "s3",
            "subnetType": "PRIVATE_ISOLATED",
            "policyStatements": [
                statement("ALLOW", &lab_bucket_name),
                statement("DENY", &logging_bucket_name),
            ],
        })),
    )?;
    graph.depends_on(&s3, &vpc)?;
    graph.depends_on(&s3, &lab_bucket)?;
    graph.depends_on(&s3, &logging_bucket)?;

    let deploy = graph.declare(
        "DeployDemoFile",
        ResourceKind::BucketDeployment,
        props(json!({"source": "public/demo.txt"})),
    )?;
    graph.depends_on(&deploy, &lab_bucket)?;

    let role = graph.declare(
        "EC2Role",
        ResourceKind::Role,
        props(json!({
            "assumedBy": "ec2.amazonaws.com",
            "managedPolicies": ["AmazonSSMManagedInstanceCore"],
            "inlinePolicies": {
                "S3Access": {
                    "statements": [
                        {"effect": "ALLOW", "actions": ["s3:*"], "resources": ["*"]},
                    ],
                },
            },
        })),
    )?;

    let profile = graph.declare("EC2InstanceProfile", ResourceKind::InstanceProfile, Properties::new())?;
    graph.depends_on(&profile, &role)?;

    let mut hosts = Vec::with_capacity(2);
    for (id, subnet_type) in [
        ("PublicCommandHost", "PUBLIC"),
        ("PrivateCommandHost", "PRIVATE_ISOLATED"),
    ] {
        let host = graph.declare(
            id,
            ResourceKind::Compute,
            props(json!({
                "instanceType": "t3.micro",
                "machineImage": "amazon-linux-2023",
                "subnetType": subnet_type,
                "userData": [],
            })),
        )?;
        graph.depends_on(&host, &vpc)?;
        graph.depends_on(&host, &profile)?;
        hosts.push(host);
    }

    let outputs = &mut stack.outputs;
    outputs.add_output_with_description(
        "VPCId",
        OutputValue::attribute(&vpc, "networkId"),
        "VPC ID for Lab 1",
    )?;
    outputs.add_output_with_description(
        "PublicCommandHostSessionURL",
        session_url(&hosts[0], &config.region),
        "Public Command Host Session URL",
    )?;
    outputs.add_output_with_description(
        "PrivateCommandHostSessionURL",
        session_url(&hosts[1], &config.region),
        "Private Command Host Session URL",
    )?;
    outputs.add_output_with_description(
        "LabBucketName",
        OutputValue::attribute(&lab_bucket, "bucketName"),
        "Lab Bucket Name",
    )?;
    outputs.add_output_with_description(
        "LabLoggingBucketName",
        OutputValue::attribute(&logging_bucket, "bucketName"),
        "Lab Logging Bucket Name",
    )?;
    outputs.add_output_with_description(
        "S3GatewayEndpointId",
        OutputValue::attribute(&s3, "endpointId"),
        "S3 Gateway Endpoint ID",
    )?;

    Ok(stack)
}

fn bucket(name: &str) -> Properties {
    props(json!({
        "bucketName": name,
        "removalPolicy": "DESTROY",
        "autoDeleteObjects": true,
        "blockPublicAccess": true,
    }))
}

// Bucket ARNs are fixed by name, so the policy needs no deferred values.
fn statement(effect: &str, bucket_name: &str) -> serde_json::Value {
    json!({
        "effect": effect,
        "actions": ["s3:*"],
        "resources": [
            format!("arn:aws:s3:::{bucket_name}"),
            format!("arn:aws:s3:::{bucket_name}/*"),
        ],
    })
}
