// Copyright (c) 2025 - Cowboy AI, Inc.
//! CIDR Block Value Object
//!
//! A validated network range in CIDR notation. Every subnet and route
//! destination in the topology is expressed as a [`CidrBlock`].
//!
//! Invariants:
//! - Valid IP address format
//! - Prefix length present and within range (0-32 for IPv4, 0-128 for IPv6)
//! - Canonical string representation
//!
//! Sibling blocks must not overlap; that invariant is the caller's
//! responsibility and is not enforced here.
//!
//! # Examples
//!
//! ```rust
//! use cloud_topology::domain::CidrBlock;
//!
//! let block = CidrBlock::new("10.0.0.0/20").unwrap();
//! assert_eq!(block.prefix_length(), 20);
//! assert_eq!(block.to_string(), "10.0.0.0/20");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// CIDR validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidNotation(String),

    #[error("Missing prefix length in CIDR block: {0}")]
    MissingPrefixLength(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),
}

/// Network range in CIDR notation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock {
    address: IpAddr,
    prefix_length: u8,
}

impl CidrBlock {
    /// Create a new CIDR block with validation
    ///
    /// # Invariants
    /// - Valid IP address format
    /// - Prefix length 0-32 for IPv4, 0-128 for IPv6
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, CidrError> {
        let cidr = cidr.as_ref();

        let Some((addr_str, prefix_str)) = cidr.split_once('/') else {
            return Err(CidrError::MissingPrefixLength(cidr.to_string()));
        };

        let address = IpAddr::from_str(addr_str)
            .map_err(|_| CidrError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| CidrError::InvalidNotation(cidr.to_string()))?;

        // Invariant: validate prefix length based on IP version
        let max_prefix = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if prefix_length > max_prefix {
            return Err(CidrError::InvalidPrefixLength(prefix_length));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    /// The catch-all IPv4 route destination (`0.0.0.0/0`)
    pub fn anywhere() -> Self {
        Self {
            address: IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
            prefix_length: 0,
        }
    }

    /// Get the network address
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Get the prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Check if this is an IPv4 block
    pub fn is_ipv4(&self) -> bool {
        matches!(self.address, IpAddr::V4(_))
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for CidrBlock {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = CidrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrBlock> for String {
    fn from(value: CidrBlock) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cidr_block() {
        let block = CidrBlock::new("10.0.0.0/20").unwrap();
        assert_eq!(block.address().to_string(), "10.0.0.0");
        assert_eq!(block.prefix_length(), 20);
        assert!(block.is_ipv4());
        assert_eq!(block.to_string(), "10.0.0.0/20");
    }

    #[test]
    fn test_prefix_length_required() {
        assert_eq!(
            CidrBlock::new("10.0.0.0"),
            Err(CidrError::MissingPrefixLength("10.0.0.0".to_string()))
        );
    }

    #[test]
    fn test_ipv6_block() {
        let block = CidrBlock::new("2001:db8::/64").unwrap();
        assert!(!block.is_ipv4());
        assert_eq!(block.prefix_length(), 64);
    }

    #[test]
    fn test_invalid_cidr() {
        assert!(CidrBlock::new("999.999.999.999/8").is_err());
        assert!(CidrBlock::new("10.0.0.0/33").is_err()); // Invalid IPv4 prefix
        assert!(CidrBlock::new("2001:db8::/129").is_err()); // Invalid IPv6 prefix
        assert!(CidrBlock::new("10.0.0.0/abc").is_err());
    }

    #[test]
    fn test_anywhere() {
        assert_eq!(CidrBlock::anywhere().to_string(), "0.0.0.0/0");
    }

    #[test]
    fn test_serde_round_trip() {
        let block = CidrBlock::new("10.0.2.0/23").unwrap();
        let json = serde_json::to_string(&block).unwrap();
        assert_eq!(json, "\"10.0.2.0/23\"");
        let back: CidrBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(back, block);
    }
}
