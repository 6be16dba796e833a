// Copyright (c) 2025 - Cowboy AI, Inc.
//! Subnet Planning Records
//!
//! A [`SubnetPlan`] is the planner's output for a single subnet: where it
//! goes and what it is called, before the backend has assigned any
//! identifier. Public and private subnets live in independent 1-based
//! ordinal spaces; downstream consumers rely on list position, never on a
//! semantic key.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AvailabilityZone, CidrBlock};

/// Subnet routing kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetKind {
    /// Routed to the internet through the Internet Gateway
    Public,
    /// Egress only, through a NAT gateway at the matching public ordinal
    Private,
}

impl SubnetKind {
    /// Lowercase name, used as the logical-name prefix (`public1`, `private2`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetKind::Public => "public",
            SubnetKind::Private => "private",
        }
    }
}

impl fmt::Display for SubnetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Planned placement for one subnet, prior to materialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetPlan {
    /// Logical name within the stack, e.g. `private2`
    pub name: String,
    /// Address range
    pub cidr: CidrBlock,
    /// Derived zone placement
    pub zone: AvailabilityZone,
    /// Routing kind
    pub kind: SubnetKind,
    /// 1-based position within the kind-specific list
    pub ordinal: usize,
}
