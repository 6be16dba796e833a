// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed Resource Specifications
//!
//! Builders do not call the cloud provider; they emit [`ResourceSpec`]
//! records into the graph and a backend interprets them later. Specs are
//! plain data: every cross-resource link is a typed [`ResourceRef`] into the
//! same composition, never a raw identifier, because identifiers only exist
//! after the backend has materialized the graph.
//!
//! ```text
//! Builders (pure)                    Backend (async I/O)
//! ───────────────                    ───────────────────
//!
//! register(name, spec)    graph      apply()
//!        │              ─────────>      │
//!        ▼                              ▼
//! ResourceRef                    assigned ids + attributes
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::{AvailabilityZone, CidrBlock};

/// Resource tags (`Name`, `SubnetType`, ...)
pub type Tags = BTreeMap<String, String>;

/// Build a tag map containing only a `Name` tag
pub fn name_tag(value: &str) -> Tags {
    Tags::from([("Name".to_string(), value.to_string())])
}

/// Handle to a registered resource within a composition
///
/// Valid only for the composition that issued it. Holding a `ResourceRef`
/// is a data dependency: the backend will not provision a node before every
/// node it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef(pub(crate) usize);

impl ResourceRef {
    /// Index into the composition's node list
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Elastic IP address scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EipDomain {
    /// VPC-scoped address
    Vpc,
}

/// Where a route sends traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteTarget {
    /// Route through an Internet Gateway
    InternetGateway(ResourceRef),
    /// Route through a NAT gateway
    NatGateway(ResourceRef),
}

/// A single routing rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Destination range this rule matches
    pub destination: CidrBlock,
    /// Gateway the traffic is sent through
    pub target: RouteTarget,
}

/// Security group ingress/egress rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    /// Start of the port range (0 with protocol `-1` means all traffic)
    pub from_port: u16,
    /// End of the port range
    pub to_port: u16,
    /// IP protocol, `-1` for all
    pub protocol: String,
    /// Whether the rule references the group itself as its source
    pub self_referential: bool,
    /// CIDR sources/destinations
    pub cidr_blocks: Vec<CidrBlock>,
}

impl SecurityGroupRule {
    /// All-protocol rule whose source is the group itself
    pub fn all_from_self() -> Self {
        Self {
            from_port: 0,
            to_port: 0,
            protocol: "-1".to_string(),
            self_referential: true,
            cidr_blocks: Vec::new(),
        }
    }

    /// All-protocol rule open to `0.0.0.0/0`
    pub fn all_to_anywhere() -> Self {
        Self {
            from_port: 0,
            to_port: 0,
            protocol: "-1".to_string(),
            self_referential: false,
            cidr_blocks: vec![CidrBlock::anywhere()],
        }
    }
}

/// Declarative resource specification handed to the backend
///
/// One variant per resource kind in the topology. The backend assigns the
/// identifier and, for some kinds, computed attributes (cluster endpoint,
/// OIDC issuer, certificate fingerprint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResourceSpec {
    /// Isolated virtual network address space
    Vpc {
        /// Address range of the whole network
        cidr_block: CidrBlock,
        /// Resource tags
        tags: Tags,
    },

    /// CIDR-scoped partition of the VPC, bound to one availability zone
    Subnet {
        /// Owning VPC
        vpc: ResourceRef,
        /// Address range
        cidr_block: CidrBlock,
        /// Zone placement
        availability_zone: AvailabilityZone,
        /// Resource tags
        tags: Tags,
    },

    /// Internet Gateway attached to the VPC
    InternetGateway {
        /// Owning VPC
        vpc: ResourceRef,
        /// Resource tags
        tags: Tags,
    },

    /// Elastic IP allocation for a NAT gateway
    Eip {
        /// Address scope
        domain: EipDomain,
    },

    /// Managed egress point for one public subnet
    NatGateway {
        /// Elastic IP backing the gateway
        allocation: ResourceRef,
        /// Public subnet the gateway lives in
        subnet: ResourceRef,
        /// Resource tags
        tags: Tags,
    },

    /// Routing rules associated with one or more subnets
    RouteTable {
        /// Owning VPC
        vpc: ResourceRef,
        /// Routing rules
        routes: Vec<Route>,
        /// Resource tags
        tags: Tags,
    },

    /// Binding between a subnet and a route table
    RouteTableAssociation {
        /// The route table
        route_table: ResourceRef,
        /// The subnet it governs
        subnet: ResourceRef,
    },

    /// IAM role with an assume-role trust policy
    IamRole {
        /// Role name
        name: String,
        /// Trust policy document
        assume_role_policy: serde_json::Value,
    },

    /// Managed policy attached to a role
    IamRolePolicyAttachment {
        /// Role the policy is attached to
        role: ResourceRef,
        /// Managed policy ARN
        policy_arn: String,
    },

    /// Security group scoped to a VPC
    SecurityGroup {
        /// Group name
        name: String,
        /// Owning VPC
        vpc: ResourceRef,
        /// Human-readable description
        description: String,
        /// Ingress rules
        ingress: Vec<SecurityGroupRule>,
        /// Egress rules
        egress: Vec<SecurityGroupRule>,
        /// Tolerate out-of-band rule changes instead of reverting them
        ignore_rule_drift: bool,
        /// Resource tags
        tags: Tags,
    },

    /// Managed Kubernetes control plane
    EksCluster {
        /// Cluster name
        name: String,
        /// Fixed, explicit Kubernetes version (never auto-latest)
        version: String,
        /// Control-plane IAM role
        role: ResourceRef,
        /// Union of public and private subnets
        subnets: Vec<ResourceRef>,
        /// Security groups for the control plane
        security_groups: Vec<ResourceRef>,
        /// Resource tags
        tags: Tags,
    },

    /// Data source reading the TLS certificate of a cluster's OIDC issuer
    ///
    /// Resolvable only after the referenced cluster's identity block is
    /// populated; the backend sequences it strictly after the cluster.
    TlsCertificate {
        /// Cluster whose issuer URL is fetched
        cluster: ResourceRef,
    },

    /// OpenID Connect identity provider trusting the cluster's issuer
    OidcProvider {
        /// Audiences allowed to authenticate, e.g. `sts.amazonaws.com`
        client_id_list: Vec<String>,
        /// Certificate data source supplying the thumbprint
        certificate: ResourceRef,
        /// Cluster supplying the issuer URL
        cluster: ResourceRef,
        /// Resource tags
        tags: Tags,
    },
}

impl ResourceSpec {
    /// Stable kind name, used in logs and provisioning errors
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::Vpc { .. } => "vpc",
            ResourceSpec::Subnet { .. } => "subnet",
            ResourceSpec::InternetGateway { .. } => "internet_gateway",
            ResourceSpec::Eip { .. } => "eip",
            ResourceSpec::NatGateway { .. } => "nat_gateway",
            ResourceSpec::RouteTable { .. } => "route_table",
            ResourceSpec::RouteTableAssociation { .. } => "route_table_association",
            ResourceSpec::IamRole { .. } => "iam_role",
            ResourceSpec::IamRolePolicyAttachment { .. } => "iam_role_policy_attachment",
            ResourceSpec::SecurityGroup { .. } => "security_group",
            ResourceSpec::EksCluster { .. } => "eks_cluster",
            ResourceSpec::TlsCertificate { .. } => "tls_certificate",
            ResourceSpec::OidcProvider { .. } => "oidc_provider",
        }
    }

    /// Every resource this spec references
    ///
    /// The backend derives its provisioning order from these edges: a node
    /// with no unresolved reference may provision in parallel with its
    /// siblings, a node with references waits for all of them.
    pub fn references(&self) -> Vec<ResourceRef> {
        match self {
            ResourceSpec::Vpc { .. } | ResourceSpec::Eip { .. } => Vec::new(),
            ResourceSpec::Subnet { vpc, .. } | ResourceSpec::InternetGateway { vpc, .. } => {
                vec![*vpc]
            }
            ResourceSpec::NatGateway {
                allocation, subnet, ..
            } => vec![*allocation, *subnet],
            ResourceSpec::RouteTable { vpc, routes, .. } => {
                let mut refs = vec![*vpc];
                for route in routes {
                    refs.push(match route.target {
                        RouteTarget::InternetGateway(r) | RouteTarget::NatGateway(r) => r,
                    });
                }
                refs
            }
            ResourceSpec::RouteTableAssociation {
                route_table,
                subnet,
            } => vec![*route_table, *subnet],
            ResourceSpec::IamRole { .. } => Vec::new(),
            ResourceSpec::IamRolePolicyAttachment { role, .. } => vec![*role],
            ResourceSpec::SecurityGroup { vpc, .. } => vec![*vpc],
            ResourceSpec::EksCluster {
                role,
                subnets,
                security_groups,
                ..
            } => {
                let mut refs = vec![*role];
                refs.extend(subnets.iter().copied());
                refs.extend(security_groups.iter().copied());
                refs
            }
            ResourceSpec::TlsCertificate { cluster } => vec![*cluster],
            ResourceSpec::OidcProvider {
                certificate,
                cluster,
                ..
            } => vec![*certificate, *cluster],
        }
    }
}

impl fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}
