// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Planner
//!
//! Pure subnet placement: given an ordered list of CIDR blocks and a
//! region, compute one [`SubnetPlan`] per block. No I/O, no mutation,
//! deterministic - planning the same inputs twice yields the same
//! ordinal-to-zone mapping, which is what keeps placements stable across
//! reapplies.
//!
//! Public and private lists are planned in separate calls and carry
//! independent 1-based ordinal spaces; the plan order always mirrors the
//! input order because downstream association is positional.

use crate::domain::{AvailabilityZone, CidrBlock, SubnetKind, SubnetPlan};
use crate::errors::PlanningError;

/// Plan subnet placement for one kind-specific CIDR list
///
/// # Rules
/// - `cidrs` must be non-empty; an empty list fails the whole plan
/// - Ordinal `i` (1-based) is placed in zone `region + base36(i + 9)`
/// - The logical name is `{kind}{ordinal}`, e.g. `private2`
/// - Output order mirrors input order
pub fn plan_subnets(
    region: &str,
    cidrs: &[CidrBlock],
    kind: SubnetKind,
) -> Result<Vec<SubnetPlan>, PlanningError> {
    if cidrs.is_empty() {
        return Err(PlanningError::EmptyCidrList { kind });
    }

    Ok(cidrs
        .iter()
        .enumerate()
        .map(|(index, cidr)| {
            let ordinal = index + 1;
            SubnetPlan {
                name: format!("{}{}", kind.as_str(), ordinal),
                cidr: cidr.clone(),
                zone: AvailabilityZone::derive(region, ordinal),
                kind,
                ordinal,
            }
        })
        .collect())
}
