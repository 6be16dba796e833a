//! Cluster-stack tests: subnet union wiring, the role/policy bindings, the
//! OIDC data-dependency chain, and resolution of the cluster record.

use pretty_assertions::assert_eq;

use cloud_topology::backend::RecordingBackend;
use cloud_topology::cluster::MANAGED_POLICIES;
use cloud_topology::resources::ResourceSpec;
use cloud_topology::stack::{compose, ComposedTopology, TopologyConfig};

fn reference_topology() -> ComposedTopology {
    compose(&TopologyConfig::reference_deployment().unwrap()).unwrap()
}

#[test]
fn cluster_references_all_subnets_and_one_security_group() {
    let topology = reference_topology();
    let graph = topology.composition().graph();

    match &graph.node(topology.cluster.cluster).spec {
        ResourceSpec::EksCluster {
            subnets,
            security_groups,
            version,
            ..
        } => {
            // Union of public and private, public first
            let mut expected = topology.network.public_subnets.clone();
            expected.extend(topology.network.private_subnets.iter().copied());
            assert_eq!(subnets, &expected);
            assert_eq!(subnets.len(), 6);

            assert_eq!(security_groups, &vec![topology.cluster.security_group]);
            assert_eq!(version, "1.30");
        }
        other => panic!("unexpected spec: {other:?}"),
    }
}

#[test]
fn both_managed_policies_are_attached() {
    let topology = reference_topology();
    let graph = topology.composition().graph();

    for policy in MANAGED_POLICIES {
        let r = graph
            .find_resource(
                topology.cluster_stack,
                &format!("eks-master-policy-attachment-{policy}"),
            )
            .unwrap_or_else(|| panic!("missing attachment for {policy}"));

        match &graph.node(r).spec {
            ResourceSpec::IamRolePolicyAttachment { role, policy_arn } => {
                assert_eq!(*role, topology.cluster.role);
                assert_eq!(policy_arn, &format!("arn:aws:iam::aws:policy/{policy}"));
            }
            other => panic!("unexpected spec: {other:?}"),
        }
    }
}

#[test]
fn security_group_rules_match_the_reference() {
    let topology = reference_topology();
    let graph = topology.composition().graph();

    match &graph.node(topology.cluster.security_group).spec {
        ResourceSpec::SecurityGroup {
            vpc,
            ingress,
            egress,
            ignore_rule_drift,
            ..
        } => {
            assert_eq!(*vpc, topology.network.vpc);
            assert_eq!(ingress.len(), 1);
            assert!(ingress[0].self_referential);
            assert_eq!(egress.len(), 1);
            assert_eq!(egress[0].cidr_blocks[0].to_string(), "0.0.0.0/0");
            // Out-of-band rule changes are tolerated, never reverted
            assert!(ignore_rule_drift);
        }
        other => panic!("unexpected spec: {other:?}"),
    }
}

#[test]
fn oidc_chain_is_strictly_sequenced() {
    let topology = reference_topology();
    let graph = topology.composition().graph();

    // Certificate depends on cluster; provider depends on both
    assert_eq!(
        graph.dependencies(topology.cluster.certificate),
        vec![topology.cluster.cluster]
    );
    assert!(graph
        .dependencies(topology.cluster.oidc_provider)
        .contains(&topology.cluster.certificate));

    let order = graph.creation_order().unwrap();
    let position = |r| order.iter().position(|&x| x == r).unwrap();
    assert!(position(topology.cluster.cluster) < position(topology.cluster.certificate));
    assert!(position(topology.cluster.certificate) < position(topology.cluster.oidc_provider));
}

#[tokio::test]
async fn resolved_cluster_record_is_complete() {
    let topology = reference_topology();
    let mut backend = RecordingBackend::new();
    let deployment = topology.apply(&mut backend).await.unwrap();

    let record = deployment.resolve_cluster(&topology.cluster).unwrap();
    assert_eq!(
        record.role_arn,
        "arn:aws:iam::123456789012:role/eks-master-role"
    );
    assert!(record.security_group_id.starts_with("sg-"));
    assert!(record.cluster_endpoint.starts_with("https://"));
    assert!(record
        .oidc_issuer_url
        .starts_with("https://oidc.eks.us-west-2.amazonaws.com/id/"));
    // SHA-1 width
    assert_eq!(record.oidc_thumbprint.len(), 40);
    assert!(record
        .oidc_thumbprint
        .chars()
        .all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn cluster_failure_aborts_the_whole_build() {
    let topology = reference_topology();
    let mut backend = RecordingBackend::new().with_failure("eks-cluster");

    let err = topology.apply(&mut backend).await.unwrap_err();
    assert!(err.to_string().contains("eks-cluster"));

    // Nothing past the failed resource was created
    assert!(!backend.created().iter().any(|n| n == "eks-oidc-issuer"));
    assert!(!backend.created().iter().any(|n| n == "openid-provider"));
}
