// Copyright (c) 2025 - Cowboy AI, Inc.
//! Availability Zone Derivation
//!
//! Zones are never configured directly; each subnet derives its zone from
//! its 1-based ordinal within its own kind-specific list. The suffix is the
//! base-36 rendering of `ordinal + 9`, so ordinal 1 maps to `a`, 2 to `b`,
//! and so on. The formula is load-bearing: re-planning the same inputs must
//! yield the same ordinal-to-zone mapping so generated placements stay
//! stable across reapplies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability zone name, e.g. `us-west-2a`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilityZone(String);

impl AvailabilityZone {
    /// Derive the zone for a subnet from its region and 1-based ordinal
    ///
    /// `zone(i) = region + base36(i + 9)`
    pub fn derive(region: &str, ordinal: usize) -> Self {
        Self(format!("{}{}", region, base36(ordinal + 9)))
    }

    /// Get the zone name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvailabilityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render a number in lowercase base 36 (digits then letters)
fn base36(mut n: usize) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[n % 36]);
        n /= 36;
    }
    out.reverse();

    // DIGITS is ASCII, so the bytes are valid UTF-8
    String::from_utf8(out).unwrap_or_default()
}
