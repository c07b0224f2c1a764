//! End-to-end tests for the lab stacks

use pretty_assertions::assert_eq;
use stackgraph_core::{CompositionError, NodeId, Phase};
use stackgraph_labs::{
    all_labs, lab1, lab3, session_url_for, synthesize, SimulatedProvisioner,
};
use stackgraph_test_utils::{test_config, RecordingProvisioner};

#[test]
fn lab1_resolves_in_declaration_order() {
    let stack = lab1::secure_s3_endpoint(&test_config()).unwrap();
    let order: Vec<String> = stack
        .graph
        .resolution_order()
        .iter()
        .map(ToString::to_string)
        .collect();

    assert_eq!(
        order,
        vec![
            "Lab1VPC",
            "SSMEndpoint",
            "LabBucket",
            "LabLoggingBucket",
            "S3Endpoint",
            "DeployDemoFile",
            "EC2Role",
            "EC2InstanceProfile",
            "PublicCommandHost",
            "PrivateCommandHost",
        ]
    );
}

#[test]
fn lab1_outputs_with_simulated_provisioner() {
    let config = test_config();
    let mut stack = lab1::secure_s3_endpoint(&config).unwrap();
    stack.graph.resolve(&SimulatedProvisioner::new()).unwrap();
    assert_eq!(stack.graph.phase(), Phase::Resolved);

    let outputs = stack.render().unwrap();
    let keys: Vec<&str> = outputs.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "VPCId",
            "PublicCommandHostSessionURL",
            "PrivateCommandHostSessionURL",
            "LabBucketName",
            "LabLoggingBucketName",
            "S3GatewayEndpointId",
        ]
    );

    assert_eq!(outputs["LabBucketName"], "lab-bucket-123456789012-us-east-1");
    assert_eq!(
        outputs["LabLoggingBucketName"],
        "lab-logging-bucket-123456789012-us-east-1"
    );
    assert!(outputs["VPCId"].starts_with("vpc-"));
    assert!(outputs["S3GatewayEndpointId"].starts_with("vpce-"));

    let instance_id = stack
        .graph
        .export_attribute("PrivateCommandHost", "instanceId")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(
        outputs["PrivateCommandHostSessionURL"],
        session_url_for(&instance_id, "us-east-1")
    );
    assert_ne!(
        outputs["PublicCommandHostSessionURL"],
        outputs["PrivateCommandHostSessionURL"]
    );
}

#[test]
fn lab3_outputs_with_simulated_provisioner() {
    let mut stack = lab3::ecs_fargate_app(&test_config()).unwrap();
    stack.graph.resolve(&SimulatedProvisioner::new()).unwrap();
    let outputs = stack.render().unwrap();

    assert_eq!(outputs["Region"], "us-east-1");
    assert_eq!(outputs["PublicSubnetIDs"].split(',').count(), 2);
    assert!(outputs["PublicSubnetIDs"]
        .split(',')
        .all(|id| id.starts_with("subnet-")));
    assert!(outputs["AlbPublicDnsUrl"].ends_with(".us-east-1.elb.amazonaws.com"));
    assert!(outputs["EcsTaskExecutionRoleArn"].starts_with("arn:aws:iam::123456789012:role/"));
    assert!(outputs["CommandHostSessionURL"]
        .starts_with("https://us-east-1.console.aws.amazon.com/systems-manager/session-manager/i-"));
}

#[test]
fn lab3_service_receives_cluster_and_repository() {
    let mut stack = lab3::ecs_fargate_app(&test_config()).unwrap();
    let provisioner = RecordingProvisioner::new();
    stack.graph.resolve(&provisioner).unwrap();

    assert_eq!(
        provisioner.realized_order(),
        vec![
            "Vpc",
            "CommandHost",
            "Web2048Repository",
            "EcsCluster",
            "Web2048Service",
        ]
    );

    let service_call = provisioner
        .calls()
        .into_iter()
        .find(|call| call.node_id.as_str() == "Web2048Service")
        .unwrap();
    let deps: Vec<&NodeId> = service_call.dependencies.keys().collect();
    assert_eq!(
        deps,
        vec![&NodeId::from("EcsCluster"), &NodeId::from("Web2048Repository")]
    );
    assert_eq!(
        service_call.dependencies[&NodeId::from("Web2048Repository")]["repositoryName"],
        "Web2048Repository.repositoryName"
    );
}

#[test]
fn simulated_synthesis_is_deterministic() {
    let render = || {
        let mut deployment = all_labs(&test_config()).unwrap();
        for report in deployment.resolve_all(&SimulatedProvisioner::new()) {
            report.result.unwrap();
        }
        deployment.render_all().unwrap()
    };

    assert_eq!(render(), render());
}

#[test]
fn failing_lab_does_not_block_the_other() {
    let mut deployment = all_labs(&test_config()).unwrap();
    let provisioner = RecordingProvisioner::new().fail_on("EcsCluster", "capacity unavailable");
    let reports = deployment.resolve_all(&provisioner);

    assert_eq!(reports[0].stack, lab1::STACK_NAME);
    assert!(reports[0].result.is_ok());
    assert!(matches!(
        &reports[1].result,
        Err(CompositionError::ResolutionFailed { node_id, .. }) if node_id.as_str() == "EcsCluster"
    ));

    let rendered = deployment.render_all().unwrap();
    assert!(rendered.contains_key(lab1::STACK_NAME));
    assert!(!rendered.contains_key(lab3::STACK_NAME));
}

#[test]
fn lab3_render_before_resolve_fails() {
    let stack = lab3::ecs_fargate_app(&test_config()).unwrap();
    assert!(matches!(
        stack.render(),
        Err(CompositionError::UnresolvedGraph(_))
    ));
}

#[test]
fn synthesis_json_lists_described_outputs_per_stack() {
    let mut deployment = all_labs(&test_config()).unwrap();
    let synthesis = synthesize(&mut deployment, &SimulatedProvisioner::new()).unwrap();

    assert!(synthesis.is_success());
    synthesis.check().unwrap();

    let document = synthesis.to_json();
    let stacks: Vec<&str> = document
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(stacks, vec![lab1::STACK_NAME, lab3::STACK_NAME]);

    let region = &document[lab3::STACK_NAME]["Region"];
    assert_eq!(region["value"], "us-east-1");
    assert_eq!(region["description"], "AWS Region");
    assert_eq!(document[lab3::STACK_NAME].as_object().unwrap().len(), 7);
    assert_eq!(document[lab1::STACK_NAME].as_object().unwrap().len(), 6);

    let text = synthesis.to_text();
    assert!(text.starts_with("Lab1\n  VPCId = vpc-"));
    assert!(text.contains("  Region = us-east-1\n      AWS Region\n"));
}

#[test]
fn synthesis_reports_failed_stack() {
    let mut deployment = all_labs(&test_config()).unwrap();
    let provisioner = RecordingProvisioner::new().fail_on("EcsCluster", "capacity unavailable");
    let synthesis = synthesize(&mut deployment, &provisioner).unwrap();

    assert!(!synthesis.is_success());
    let stacks: Vec<&str> = synthesis.stacks.iter().map(|s| s.stack.as_str()).collect();
    assert_eq!(stacks, vec![lab1::STACK_NAME]);
    assert_eq!(synthesis.failures.len(), 1);
    assert_eq!(synthesis.failures[0].0, lab3::STACK_NAME);
    assert!(synthesis.to_json().get(lab3::STACK_NAME).is_none());

    let err = synthesis.check().unwrap_err().to_string();
    assert!(err.starts_with("1 stack(s) failed to resolve"));
    assert!(err.contains("Lab3: resolution failed at node `EcsCluster`: capacity unavailable"));
}
