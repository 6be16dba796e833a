// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resolved Cross-Stack Output Contracts
//!
//! These records carry backend-assigned identifiers after a deployment has
//! materialized. [`NetworkOutputs`] is the only data surface between the
//! network stack and anything downstream; its field names and ordering
//! semantics are stable (`vpc_id`, `public_subnet_ids`, `private_subnet_ids`,
//! each id list mirroring the input CIDR list order). [`ClusterRecord`] is
//! the corresponding record for the cluster stack.
//!
//! Both are immutable once produced: created when the backend resolves the
//! graph, read-only for the rest of the run.

use serde::{Deserialize, Serialize};

/// Identifiers exported by the network stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkOutputs {
    /// VPC identifier
    pub vpc_id: String,
    /// Public subnet ids, in input CIDR order
    pub public_subnet_ids: Vec<String>,
    /// Private subnet ids, in input CIDR order
    pub private_subnet_ids: Vec<String>,
}

/// Identifiers and computed attributes exported by the cluster stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// ARN of the control-plane IAM role
    pub role_arn: String,
    /// Security group scoped to the network's VPC
    pub security_group_id: String,
    /// API server endpoint
    pub cluster_endpoint: String,
    /// OIDC issuer URL, populated once the cluster resolves
    pub oidc_issuer_url: String,
    /// SHA-1 fingerprint of the issuer's TLS certificate
    pub oidc_thumbprint: String,
}
