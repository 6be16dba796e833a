//! Declarative VPC and EKS cluster topology builder
//!
//! This crate declares a two-stack cloud topology as a resource-dependency
//! graph: a network stack (VPC, public/private subnets across availability
//! zones, NAT and Internet gateways, route tables) and a cluster stack (IAM
//! role, security group, managed Kubernetes control plane, OIDC identity
//! provider) wired to it, with a poll-until-healthy readiness gate.
//!
//! Graph construction is pure and synchronous; all I/O lives behind the
//! [`backend::StackBackend`] boundary, which materializes the graph and
//! hands back assigned identifiers.
//!
//! ```rust
//! use cloud_topology::stack::{compose, TopologyConfig};
//!
//! let config = TopologyConfig::reference_deployment()?;
//! let topology = compose(&config)?;
//! assert_eq!(topology.composition().graph().stack_count(), 2);
//! # Ok::<(), cloud_topology::errors::PlanningError>(())
//! ```

pub mod backend;
pub mod cluster;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod network;
pub mod planner;
pub mod readiness;
pub mod resources;
pub mod stack;

// Re-export commonly used types
pub use backend::{Deployment, RecordingBackend, StackBackend};
pub use cluster::{ClusterBuilder, ClusterConfig, ClusterHandles};
pub use domain::{AvailabilityZone, CidrBlock, ClusterRecord, NetworkOutputs, SubnetKind};
pub use errors::{PlanningError, ProvisioningError, ReadinessError, StackError, StackResult};
pub use graph::{ResourceGraph, StackScope};
pub use network::{NetworkBuilder, NetworkConfig, NetworkHandles};
pub use readiness::{HealthProbe, HttpHealthProbe, ReadinessGate};
pub use resources::{ResourceRef, ResourceSpec};
pub use stack::{compose, ComposedTopology, Composition, TopologyConfig};
