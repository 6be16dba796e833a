// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster Builder
//!
//! Declares the managed Kubernetes control plane on top of an already-built
//! network: the control-plane IAM role with its two managed policies, a
//! VPC-scoped security group, the cluster resource itself, and the OIDC
//! identity provider derived from the cluster's issuer certificate.
//!
//! The OIDC chain is a strict data dependency: the certificate data source
//! reads the issuer URL, which exists only after the cluster resolves, and
//! the identity provider reads the certificate's SHA-1 fingerprint. The
//! backend sequences cluster, then certificate, then provider.
//!
//! A readiness hook is registered against the cluster so anything that must
//! wait for the control plane to accept traffic is gated behind the
//! `/healthz` poll; the hook never delays cluster creation itself.

use serde_json::json;
use tracing::info;

use crate::errors::PlanningError;
use crate::graph::{HookAction, PostProvisionHook, StackScope};
use crate::network::NetworkHandles;
use crate::readiness::ReadinessGate;
use crate::resources::{name_tag, ResourceRef, ResourceSpec, SecurityGroupRule};

/// Kubernetes version pinned for the control plane
///
/// Fixed and explicit, never auto-latest, so provisioning stays
/// reproducible.
pub const CLUSTER_VERSION: &str = "1.30";

/// Managed policies attached to the control-plane role
///
/// Attachment order is commutative; the backend may create both
/// concurrently.
pub const MANAGED_POLICIES: [&str; 2] = ["AmazonEKSClusterPolicy", "AmazonEKSServicePolicy"];

/// Cluster layer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Cluster name
    pub cluster_name: String,
    /// Control-plane Kubernetes version
    pub version: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            cluster_name: "dev-eks-cluster".to_string(),
            version: CLUSTER_VERSION.to_string(),
        }
    }
}

/// Plan-time handles to the cluster stack's resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterHandles {
    /// Control-plane IAM role
    pub role: ResourceRef,
    /// Security group scoped to the network's VPC
    pub security_group: ResourceRef,
    /// The managed cluster resource
    pub cluster: ResourceRef,
    /// Certificate data source for the issuer URL
    pub certificate: ResourceRef,
    /// OIDC identity provider
    pub oidc_provider: ResourceRef,
}

/// Builds the cluster layer into a stack scope
#[derive(Debug, Clone)]
pub struct ClusterBuilder {
    config: ClusterConfig,
}

impl ClusterBuilder {
    /// Create a builder for the given configuration
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Declare the cluster layer on top of the network's outputs
    ///
    /// Reads only the handles the network builder exported; any step
    /// failing aborts the whole cluster build, no partial cluster state is
    /// considered valid.
    pub fn build(
        &self,
        scope: &mut dyn StackScope,
        network: &NetworkHandles,
    ) -> Result<ClusterHandles, PlanningError> {
        let role = scope.register_resource(
            "eks-master-role",
            ResourceSpec::IamRole {
                name: "eks-master-role".to_string(),
                assume_role_policy: assume_role_policy(),
            },
        )?;

        for policy in MANAGED_POLICIES {
            scope.register_resource(
                &format!("eks-master-policy-attachment-{policy}"),
                ResourceSpec::IamRolePolicyAttachment {
                    role,
                    policy_arn: format!("arn:aws:iam::aws:policy/{policy}"),
                },
            )?;
        }

        let security_group = scope.register_resource(
            "eks-master-security-group",
            ResourceSpec::SecurityGroup {
                name: "eks-master-security-group".to_string(),
                vpc: network.vpc,
                description: "eks master security group".to_string(),
                ingress: vec![SecurityGroupRule::all_from_self()],
                egress: vec![SecurityGroupRule::all_to_anywhere()],
                // The backend manages extra rules on its own; never revert them
                ignore_rule_drift: true,
                tags: name_tag("eks-master-security-group"),
            },
        )?;

        // Union of both subnet lists, public first
        let mut subnets = network.public_subnets.clone();
        subnets.extend(network.private_subnets.iter().copied());

        let cluster = scope.register_resource(
            "eks-cluster",
            ResourceSpec::EksCluster {
                name: self.config.cluster_name.clone(),
                version: self.config.version.clone(),
                role,
                subnets,
                security_groups: vec![security_group],
                tags: name_tag(&self.config.cluster_name),
            },
        )?;

        let certificate = scope.register_resource(
            "eks-oidc-issuer",
            ResourceSpec::TlsCertificate { cluster },
        )?;

        let oidc_provider = scope.register_resource(
            "openid-provider",
            ResourceSpec::OidcProvider {
                client_id_list: vec!["sts.amazonaws.com".to_string()],
                certificate,
                cluster,
                tags: name_tag(&format!("{}-oidc", self.config.cluster_name)),
            },
        )?;

        scope.register_hook(PostProvisionHook {
            name: "wait-for-cluster".to_string(),
            depends_on: cluster,
            action: HookAction::WaitForHttpHealthy {
                path: "/healthz".to_string(),
                max_attempts: ReadinessGate::DEFAULT_MAX_ATTEMPTS,
                interval: ReadinessGate::DEFAULT_INTERVAL,
            },
        })?;

        info!(
            cluster = %self.config.cluster_name,
            version = %self.config.version,
            "declared cluster layer"
        );

        Ok(ClusterHandles {
            role,
            security_group,
            cluster,
            certificate,
            oidc_provider,
        })
    }
}

/// Trust policy letting the control-plane service principal assume the role
fn assume_role_policy() -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": "sts:AssumeRole",
                "Principal": {
                    "Service": "eks.amazonaws.com"
                }
            }
        ]
    })
}
