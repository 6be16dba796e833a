//! Error types for topology planning and provisioning
//!
//! Three families, surfaced unchanged to the composer (builders never catch
//! and recover internally):
//!
//! - [`PlanningError`] - invalid input, caught before any backend call
//! - [`ProvisioningError`] - the backend rejected or failed a resource;
//!   always names the resource that failed
//! - [`ReadinessError`] - the post-provision health gate timed out, distinct
//!   from the transient per-attempt probe failures it retries silently

use thiserror::Error;

use crate::domain::{CidrError, SubnetKind};

/// Errors raised while constructing the resource graph, before the backend
/// is ever involved
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanningError {
    /// A subnet kind was configured with no CIDR blocks at all
    #[error("No {kind} subnet CIDR blocks were provided")]
    EmptyCidrList {
        /// Which list was empty
        kind: SubnetKind,
    },

    /// Malformed CIDR input
    #[error(transparent)]
    InvalidCidr(#[from] CidrError),

    /// Public and private subnet lists differ in length
    ///
    /// Positional association pairs private subnet `k` with the NAT route
    /// table at ordinal `k`; divergent lengths would leave subnets without
    /// internet egress, so they are rejected unless explicitly allowed.
    #[error("Subnet list length mismatch: {public} public vs {private} private")]
    SubnetCountMismatch {
        /// Number of public CIDR blocks
        public: usize,
        /// Number of private CIDR blocks
        private: usize,
    },

    /// Two resources were registered under the same logical name in one stack
    #[error("Duplicate logical resource name in stack '{stack}': {name}")]
    DuplicateResourceName {
        /// Stack the collision occurred in
        stack: String,
        /// The colliding logical name
        name: String,
    },

    /// Two outputs were registered under the same name in one stack
    #[error("Duplicate output name in stack '{stack}': {name}")]
    DuplicateOutputName {
        /// Stack the collision occurred in
        stack: String,
        /// The colliding output name
        name: String,
    },

    /// A resource references another stack without a declared stack dependency
    #[error(
        "Resource '{resource}' in stack '{from}' references stack '{to}' \
         but no dependency from '{from}' to '{to}' was declared"
    )]
    MissingStackDependency {
        /// The referencing resource
        resource: String,
        /// Stack of the referencing resource
        from: String,
        /// Stack of the referenced resource
        to: String,
    },

    /// Declared stack dependencies form a cycle
    #[error("Stack dependencies form a cycle involving '{stack}'")]
    CyclicStackDependency {
        /// A stack on the cycle
        stack: String,
    },
}

/// Errors raised by the declarative backend while materializing the graph
///
/// Any single failure aborts the whole build; no partial-success state is
/// modeled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    /// The backend failed to create a resource
    #[error("Failed to provision {kind} '{name}': {reason}")]
    ResourceFailed {
        /// Logical name of the failed resource
        name: String,
        /// Resource kind, e.g. `nat_gateway`
        kind: String,
        /// Backend-reported reason
        reason: String,
    },

    /// A reference could not be resolved against the deployment record
    #[error("Unresolved reference to '{name}' (missing attribute: {attribute})")]
    UnresolvedReference {
        /// Logical name of the referenced resource
        name: String,
        /// The attribute that was expected
        attribute: String,
    },
}

/// Errors raised by the readiness gate
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    /// Every poll attempt was exhausted without a healthy response
    #[error("Cluster endpoint never became healthy after {attempts} attempts")]
    Timeout {
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// The HTTP probe itself could not be constructed
    #[error("Failed to build health probe: {0}")]
    ProbeSetup(String),
}

/// Umbrella error at the stack-composer boundary
///
/// The composer has no recovery strategy beyond reporting, so every failure
/// funnels into this type unchanged.
#[derive(Debug, Error)]
pub enum StackError {
    /// Graph construction failed
    #[error(transparent)]
    Planning(#[from] PlanningError),

    /// Backend materialization failed
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    /// Post-provision readiness gate failed
    #[error(transparent)]
    Readiness(#[from] ReadinessError),
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;
