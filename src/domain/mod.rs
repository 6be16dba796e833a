// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Core domain concepts for the network and cluster topology, as value
//! objects with validation invariants.
//!
//! # Value Objects with Invariants
//!
//! - [`CidrBlock`] - network range in CIDR notation, prefix required
//! - [`AvailabilityZone`] - zone derived deterministically from ordinal
//! - [`SubnetKind`] / [`SubnetPlan`] - planned subnet placement
//!
//! # Cross-Stack Contracts
//!
//! - [`NetworkOutputs`] - `{vpc_id, public_subnet_ids, private_subnet_ids}`
//! - [`ClusterRecord`] - role/security-group/endpoint/OIDC identifiers

pub mod cidr;
pub mod outputs;
pub mod subnet;
pub mod zone;

// Re-export value objects
pub use cidr::{CidrBlock, CidrError};
pub use outputs::{ClusterRecord, NetworkOutputs};
pub use subnet::{SubnetKind, SubnetPlan};
pub use zone::AvailabilityZone;
