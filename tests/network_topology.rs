//! End-to-end tests for the network layer: the reference deployment's
//! topology shape, deterministic zone placement, and the positional
//! public/private association contract.

use pretty_assertions::assert_eq;

use cloud_topology::backend::RecordingBackend;
use cloud_topology::domain::CidrBlock;
use cloud_topology::errors::PlanningError;
use cloud_topology::graph::OutputValue;
use cloud_topology::resources::ResourceSpec;
use cloud_topology::stack::{compose, TopologyConfig};

fn reference_config() -> TopologyConfig {
    TopologyConfig::reference_deployment().unwrap()
}

fn blocks(cidrs: &[&str]) -> Vec<CidrBlock> {
    cidrs.iter().map(|c| CidrBlock::new(c).unwrap()).collect()
}

#[test]
fn reference_deployment_topology_shape() {
    let topology = compose(&reference_config()).unwrap();
    let graph = topology.composition().graph();

    let count = |kind: &str| {
        graph
            .nodes()
            .iter()
            .filter(|n| n.spec.kind() == kind)
            .count()
    };

    assert_eq!(count("vpc"), 1);
    assert_eq!(count("internet_gateway"), 1);
    assert_eq!(count("subnet"), 6);
    assert_eq!(count("eip"), 3);
    // One NAT per public subnet
    assert_eq!(count("nat_gateway"), 3);
    // One shared public table plus one dedicated private table per ordinal
    assert_eq!(count("route_table"), 4);
    assert_eq!(count("route_table_association"), 6);
}

#[test]
fn zones_follow_the_ordinal_formula() {
    let topology = compose(&reference_config()).unwrap();
    let graph = topology.composition().graph();

    for (kind, expected) in [
        ("public", ["us-west-2a", "us-west-2b", "us-west-2c"]),
        ("private", ["us-west-2a", "us-west-2b", "us-west-2c"]),
    ] {
        for (index, zone) in expected.iter().enumerate() {
            let name = format!("{}{}", kind, index + 1);
            let r = graph
                .find_resource(topology.network_stack, &name)
                .unwrap_or_else(|| panic!("missing subnet {name}"));

            match &graph.node(r).spec {
                ResourceSpec::Subnet {
                    availability_zone, ..
                } => assert_eq!(availability_zone.as_str(), *zone),
                other => panic!("{name} is not a subnet: {other:?}"),
            }
        }
    }
}

#[test]
fn subnet_order_mirrors_input_cidr_order() {
    let config = reference_config();
    let topology = compose(&config).unwrap();
    let graph = topology.composition().graph();

    for (handles, cidrs, prefix) in [
        (
            &topology.network.public_subnets,
            &config.network.public_cidrs,
            "public",
        ),
        (
            &topology.network.private_subnets,
            &config.network.private_cidrs,
            "private",
        ),
    ] {
        assert_eq!(handles.len(), cidrs.len());
        for (index, (&r, cidr)) in handles.iter().zip(cidrs).enumerate() {
            let node = graph.node(r);
            assert_eq!(node.name, format!("{}{}", prefix, index + 1));
            match &node.spec {
                ResourceSpec::Subnet { cidr_block, .. } => assert_eq!(cidr_block, cidr),
                other => panic!("unexpected spec: {other:?}"),
            }
        }
    }
}

#[test]
fn private_association_is_strictly_positional() {
    let topology = compose(&reference_config()).unwrap();
    let graph = topology.composition().graph();

    for ordinal in 1..=3usize {
        let table = graph
            .find_resource(topology.network_stack, &format!("route-table-private-{ordinal}"))
            .unwrap();
        let association = graph
            .find_resource(
                topology.network_stack,
                &format!("route-table-association-private-{ordinal}"),
            )
            .unwrap();

        match &graph.node(association).spec {
            ResourceSpec::RouteTableAssociation {
                route_table,
                subnet,
            } => {
                assert_eq!(*route_table, table);
                // Private subnet k pairs with the table at ordinal k, never another
                assert_eq!(*subnet, topology.network.private_subnets[ordinal - 1]);
            }
            other => panic!("unexpected spec: {other:?}"),
        }
    }
}

#[test]
fn public_subnets_share_one_route_table() {
    let topology = compose(&reference_config()).unwrap();
    let graph = topology.composition().graph();
    let shared = graph
        .find_resource(topology.network_stack, "route-table-public")
        .unwrap();

    for ordinal in 1..=3usize {
        let association = graph
            .find_resource(
                topology.network_stack,
                &format!("route-table-association-public-{ordinal}"),
            )
            .unwrap();
        match &graph.node(association).spec {
            ResourceSpec::RouteTableAssociation { route_table, .. } => {
                assert_eq!(*route_table, shared);
            }
            other => panic!("unexpected spec: {other:?}"),
        }
    }
}

#[test]
fn unequal_subnet_lists_are_a_planning_error() {
    let mut config = reference_config();
    config.network.private_cidrs = blocks(&["10.0.2.0/23", "10.0.4.0/23"]);

    let err = compose(&config).unwrap_err();
    assert_eq!(
        err,
        PlanningError::SubnetCountMismatch {
            public: 3,
            private: 2
        }
    );
}

#[test]
fn unequal_lists_allowed_when_opted_in() {
    let mut config = reference_config();
    config.network.private_cidrs = blocks(&["10.0.2.0/23", "10.0.4.0/23"]);
    config.network.allow_unequal_subnet_lists = true;

    let topology = compose(&config).unwrap();
    let graph = topology.composition().graph();

    // Still one NAT and one private table per public ordinal, but only the
    // shorter prefix of private subnets gets an association
    let count = |kind: &str| {
        graph
            .nodes()
            .iter()
            .filter(|n| n.spec.kind() == kind)
            .count()
    };
    assert_eq!(count("nat_gateway"), 3);
    assert_eq!(count("route_table"), 4);
    assert!(graph
        .find_resource(topology.network_stack, "route-table-association-private-3")
        .is_none());
}

#[test]
fn network_stack_registers_the_frozen_output_names() {
    let topology = compose(&reference_config()).unwrap();
    let graph = topology.composition().graph();

    let outputs = graph.outputs(topology.network_stack).unwrap();
    let names: Vec<_> = outputs.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["private_subnet_ids", "public_subnet_ids", "vpc_id"]
    );

    match outputs.get("vpc_id") {
        Some(OutputValue::Ref(r)) => assert_eq!(*r, topology.network.vpc),
        other => panic!("unexpected vpc_id output: {other:?}"),
    }
    match outputs.get("public_subnet_ids") {
        Some(OutputValue::RefList(refs)) => assert_eq!(refs, &topology.network.public_subnets),
        other => panic!("unexpected public_subnet_ids output: {other:?}"),
    }
    match outputs.get("private_subnet_ids") {
        Some(OutputValue::RefList(refs)) => assert_eq!(refs, &topology.network.private_subnets),
        other => panic!("unexpected private_subnet_ids output: {other:?}"),
    }
}

#[tokio::test]
async fn resolved_outputs_mirror_input_order() {
    let topology = compose(&reference_config()).unwrap();
    let mut backend = RecordingBackend::new();
    let deployment = topology.apply(&mut backend).await.unwrap();

    let outputs = deployment.resolve_network(&topology.network).unwrap();
    assert!(outputs.vpc_id.starts_with("vpc-"));
    assert_eq!(outputs.public_subnet_ids.len(), 3);
    assert_eq!(outputs.private_subnet_ids.len(), 3);

    // Position k of the contract is the id assigned to subnet ordinal k
    for (index, id) in outputs.public_subnet_ids.iter().enumerate() {
        let r = topology.network.public_subnets[index];
        assert_eq!(deployment.id(r).unwrap(), id);
    }

    // Contract field names are stable
    let json = serde_json::to_value(&outputs).unwrap();
    assert!(json.get("vpc_id").is_some());
    assert!(json.get("public_subnet_ids").is_some());
    assert!(json.get("private_subnet_ids").is_some());
}

#[tokio::test]
async fn provisioning_failure_names_the_resource() {
    let topology = compose(&reference_config()).unwrap();
    let mut backend = RecordingBackend::new().with_failure("nat-gateway-2");

    let err = topology.apply(&mut backend).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to provision nat_gateway 'nat-gateway-2': injected failure"
    );
}
