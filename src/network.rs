// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Builder
//!
//! Declares the whole network layer into a stack scope: one VPC, the
//! planned public and private subnets, one Internet Gateway with a shared
//! public route table, and per public ordinal one EIP, one NAT gateway and
//! one dedicated private route table.
//!
//! Two orderings here are load-bearing and must not be changed:
//!
//! - Subnets are registered private-first, then public. Correctness does
//!   not depend on it, but backend id allocation does, and reapplies must
//!   produce stable identifiers.
//! - Private route-table association is strictly positional: the private
//!   subnet at ordinal `k` is associated with the route table behind the
//!   NAT gateway at ordinal `k`, never matched by any other key.

use tracing::{info, warn};

use crate::domain::{CidrBlock, CidrError, SubnetKind};
use crate::errors::PlanningError;
use crate::graph::{OutputValue, StackScope};
use crate::planner::plan_subnets;
use crate::resources::{
    name_tag, EipDomain, ResourceRef, ResourceSpec, Route, RouteTarget, Tags,
};

/// Network layer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Deployment region, e.g. `us-west-2`
    pub region: String,
    /// Deployment name, used as the `Name` tag on every taggable resource
    pub name: String,
    /// Address range of the VPC
    pub vpc_cidr: CidrBlock,
    /// Public subnet ranges, in placement order
    pub public_cidrs: Vec<CidrBlock>,
    /// Private subnet ranges, in placement order
    pub private_cidrs: Vec<CidrBlock>,
    /// Accept public/private lists of different lengths
    ///
    /// The positional NAT association then covers only the shorter prefix;
    /// any private subnet beyond the public count is left without internet
    /// egress and a warning is logged. Off by default.
    pub allow_unequal_subnet_lists: bool,
}

impl NetworkConfig {
    /// The reference deployment profile: `us-west-2`, a `/20` VPC, three
    /// public `/25`s and three private `/23`s
    pub fn reference_deployment() -> Result<Self, CidrError> {
        Ok(Self {
            region: "us-west-2".to_string(),
            name: "kubernetesCourse".to_string(),
            vpc_cidr: CidrBlock::new("10.0.0.0/20")?,
            public_cidrs: vec![
                CidrBlock::new("10.0.0.0/25")?,
                CidrBlock::new("10.0.0.128/25")?,
                CidrBlock::new("10.0.1.0/25")?,
            ],
            private_cidrs: vec![
                CidrBlock::new("10.0.2.0/23")?,
                CidrBlock::new("10.0.4.0/23")?,
                CidrBlock::new("10.0.6.0/23")?,
            ],
            allow_unequal_subnet_lists: false,
        })
    }
}

/// Plan-time handles to everything downstream consumers may reference
///
/// Immutable once the builder returns; the cluster builder reads these
/// refs and registers nothing back into the network stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkHandles {
    /// The VPC
    pub vpc: ResourceRef,
    /// Public subnets, in input CIDR order
    pub public_subnets: Vec<ResourceRef>,
    /// Private subnets, in input CIDR order
    pub private_subnets: Vec<ResourceRef>,
}

/// Builds the network layer into a stack scope
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    config: NetworkConfig,
}

impl NetworkBuilder {
    /// Create a builder for the given configuration
    pub fn new(config: NetworkConfig) -> Self {
        Self { config }
    }

    /// The configuration this builder was created with
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Declare the network layer and export the cross-stack contract
    ///
    /// Fail-fast: the first invalid input or registration conflict aborts
    /// the whole build before any further resource is declared.
    pub fn build(&self, scope: &mut dyn StackScope) -> Result<NetworkHandles, PlanningError> {
        self.validate()?;

        let vpc = scope.register_resource(
            "vpc",
            ResourceSpec::Vpc {
                cidr_block: self.config.vpc_cidr.clone(),
                tags: name_tag(&self.config.name),
            },
        )?;

        // Private first, then public (stable id allocation across reapplies)
        let private_subnets = self.register_subnets(scope, vpc, SubnetKind::Private)?;
        let public_subnets = self.register_subnets(scope, vpc, SubnetKind::Public)?;

        self.build_gateways_and_routes(scope, vpc, &public_subnets, &private_subnets)?;

        scope.register_output("vpc_id", OutputValue::Ref(vpc))?;
        scope.register_output(
            "public_subnet_ids",
            OutputValue::RefList(public_subnets.clone()),
        )?;
        scope.register_output(
            "private_subnet_ids",
            OutputValue::RefList(private_subnets.clone()),
        )?;

        info!(
            name = %self.config.name,
            region = %self.config.region,
            public = public_subnets.len(),
            private = private_subnets.len(),
            "declared network layer"
        );

        Ok(NetworkHandles {
            vpc,
            public_subnets,
            private_subnets,
        })
    }

    /// Reject divergent subnet lists up front unless explicitly allowed
    fn validate(&self) -> Result<(), PlanningError> {
        let public = self.config.public_cidrs.len();
        let private = self.config.private_cidrs.len();

        if public != private {
            if self.config.allow_unequal_subnet_lists {
                warn!(
                    public,
                    private, "subnet lists differ in length; association covers the shorter prefix"
                );
            } else {
                return Err(PlanningError::SubnetCountMismatch { public, private });
            }
        }
        Ok(())
    }

    fn register_subnets(
        &self,
        scope: &mut dyn StackScope,
        vpc: ResourceRef,
        kind: SubnetKind,
    ) -> Result<Vec<ResourceRef>, PlanningError> {
        let cidrs = match kind {
            SubnetKind::Public => &self.config.public_cidrs,
            SubnetKind::Private => &self.config.private_cidrs,
        };

        plan_subnets(&self.config.region, cidrs, kind)?
            .into_iter()
            .map(|plan| {
                let mut tags = name_tag(&self.config.name);
                tags.insert("SubnetType".to_string(), plan.name.clone());

                scope.register_resource(
                    &plan.name,
                    ResourceSpec::Subnet {
                        vpc,
                        cidr_block: plan.cidr,
                        availability_zone: plan.zone,
                        tags,
                    },
                )
            })
            .collect()
    }

    fn build_gateways_and_routes(
        &self,
        scope: &mut dyn StackScope,
        vpc: ResourceRef,
        public_subnets: &[ResourceRef],
        private_subnets: &[ResourceRef],
    ) -> Result<(), PlanningError> {
        let gateway = scope.register_resource(
            "internet-gateway",
            ResourceSpec::InternetGateway {
                vpc,
                tags: name_tag(&self.config.name),
            },
        )?;

        // One shared route table for every public subnet
        let public_rt = scope.register_resource(
            "route-table-public",
            ResourceSpec::RouteTable {
                vpc,
                routes: vec![Route {
                    destination: CidrBlock::anywhere(),
                    target: RouteTarget::InternetGateway(gateway),
                }],
                tags: name_tag(&self.config.name),
            },
        )?;

        for (index, &subnet) in public_subnets.iter().enumerate() {
            let count = index + 1;

            let eip = scope.register_resource(
                &format!("eip-{count}"),
                ResourceSpec::Eip {
                    domain: EipDomain::Vpc,
                },
            )?;

            let nat = scope.register_resource(
                &format!("nat-gateway-{count}"),
                ResourceSpec::NatGateway {
                    allocation: eip,
                    subnet,
                    tags: name_tag(&self.config.name),
                },
            )?;

            scope.register_resource(
                &format!("route-table-association-public-{count}"),
                ResourceSpec::RouteTableAssociation {
                    route_table: public_rt,
                    subnet,
                },
            )?;

            // Dedicated private route table per public ordinal
            let private_rt = scope.register_resource(
                &format!("route-table-private-{count}"),
                ResourceSpec::RouteTable {
                    vpc,
                    routes: vec![Route {
                        destination: CidrBlock::anywhere(),
                        target: RouteTarget::NatGateway(nat),
                    }],
                    tags: Tags::new(),
                },
            )?;

            // Strictly positional: ordinal k pairs with ordinal k
            match private_subnets.get(index) {
                Some(&private_subnet) => {
                    scope.register_resource(
                        &format!("route-table-association-private-{count}"),
                        ResourceSpec::RouteTableAssociation {
                            route_table: private_rt,
                            subnet: private_subnet,
                        },
                    )?;
                }
                None => warn!(
                    ordinal = count,
                    "no private subnet at this ordinal; NAT route table left unassociated"
                ),
            }
        }

        if private_subnets.len() > public_subnets.len() {
            warn!(
                unrouted = private_subnets.len() - public_subnets.len(),
                "private subnets beyond the public count have no internet egress"
            );
        }

        Ok(())
    }
}
