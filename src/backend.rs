// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declarative Backend Boundary
//!
//! Builders emit specs; a [`StackBackend`] turns a validated composition
//! into assigned identifiers and computed attributes. The core treats this
//! boundary as an opaque request/response contract - everything on the
//! other side (diffing, parallel provisioning of independent nodes, API
//! calls) is the backend's business.
//!
//! [`RecordingBackend`] is the in-process implementation used for tests and
//! dry runs: it assigns deterministic identifiers in creation order,
//! resolves the attribute chain (cluster -> issuer certificate -> OIDC
//! thumbprint), records create/destroy order, and surfaces injected
//! failures the way a real backend surfaces API errors. Post-provision
//! hooks are returned as pending work rather than executed, so the caller
//! decides which probe runs them.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::{debug, info};
use uuid::Uuid;

use crate::cluster::ClusterHandles;
use crate::domain::{ClusterRecord, NetworkOutputs};
use crate::errors::{ProvisioningError, ReadinessError, StackResult};
use crate::graph::HookAction;
use crate::network::NetworkHandles;
use crate::readiness::{HealthProbe, ReadinessGate};
use crate::resources::{ResourceRef, ResourceSpec};
use crate::stack::Composition;

/// Attribute keys computed by the backend
pub mod attr {
    /// API server endpoint of a cluster
    pub const ENDPOINT: &str = "endpoint";
    /// OIDC issuer URL of a cluster
    pub const OIDC_ISSUER: &str = "oidc_issuer";
    /// SHA-1 fingerprint of a fetched TLS certificate
    pub const SHA1_FINGERPRINT: &str = "sha1_fingerprint";
    /// ARN of an IAM entity
    pub const ARN: &str = "arn";
    /// Allocation id of an elastic IP
    pub const ALLOCATION_ID: &str = "allocation_id";
}

/// One materialized resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedResource {
    /// Logical name
    pub name: String,
    /// Resource kind
    pub kind: String,
    /// Backend-assigned identifier
    pub id: String,
    /// Computed attributes, keyed by [`attr`] constants
    pub attributes: BTreeMap<String, String>,
}

/// A readiness hook whose endpoint has been resolved but not yet polled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHook {
    /// Hook name
    pub name: String,
    /// Resolved endpoint to poll
    pub endpoint: String,
    /// Path appended to the endpoint
    pub path: String,
    /// Poll budget
    pub gate: ReadinessGate,
}

/// The result of materializing a composition
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Identifier of this provisioning run
    pub run_id: Uuid,
    records: BTreeMap<usize, ProvisionedResource>,
    pending_hooks: Vec<PendingHook>,
}

impl Deployment {
    /// The materialized record behind a reference
    pub fn record(&self, r: ResourceRef) -> Result<&ProvisionedResource, ProvisioningError> {
        self.records
            .get(&r.index())
            .ok_or_else(|| ProvisioningError::UnresolvedReference {
                name: format!("resource #{}", r.index()),
                attribute: "id".to_string(),
            })
    }

    /// Backend-assigned identifier of a resource
    pub fn id(&self, r: ResourceRef) -> Result<&str, ProvisioningError> {
        Ok(&self.record(r)?.id)
    }

    /// A computed attribute of a resource
    pub fn attribute(&self, r: ResourceRef, key: &str) -> Result<&str, ProvisioningError> {
        let record = self.record(r)?;
        record
            .attributes
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ProvisioningError::UnresolvedReference {
                name: record.name.clone(),
                attribute: key.to_string(),
            })
    }

    /// Hooks awaiting execution, in registration order
    pub fn pending_hooks(&self) -> &[PendingHook] {
        &self.pending_hooks
    }

    /// Run every pending readiness hook against the given probe
    ///
    /// Sequential by design: each hook gates everything after it.
    pub async fn run_hooks(&self, probe: &dyn HealthProbe) -> Result<(), ReadinessError> {
        for hook in &self.pending_hooks {
            info!(hook = %hook.name, endpoint = %hook.endpoint, "running readiness hook");
            hook.gate
                .wait_for_healthy(probe, &hook.endpoint, &hook.path)
                .await?;
        }
        Ok(())
    }

    /// Resolve the network stack's cross-stack output contract
    pub fn resolve_network(
        &self,
        handles: &NetworkHandles,
    ) -> Result<NetworkOutputs, ProvisioningError> {
        Ok(NetworkOutputs {
            vpc_id: self.id(handles.vpc)?.to_string(),
            public_subnet_ids: handles
                .public_subnets
                .iter()
                .map(|&r| self.id(r).map(str::to_string))
                .collect::<Result<_, _>>()?,
            private_subnet_ids: handles
                .private_subnets
                .iter()
                .map(|&r| self.id(r).map(str::to_string))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Resolve the cluster stack's record
    pub fn resolve_cluster(
        &self,
        handles: &ClusterHandles,
    ) -> Result<ClusterRecord, ProvisioningError> {
        Ok(ClusterRecord {
            role_arn: self.attribute(handles.role, attr::ARN)?.to_string(),
            security_group_id: self.id(handles.security_group)?.to_string(),
            cluster_endpoint: self.attribute(handles.cluster, attr::ENDPOINT)?.to_string(),
            oidc_issuer_url: self
                .attribute(handles.cluster, attr::OIDC_ISSUER)?
                .to_string(),
            oidc_thumbprint: self
                .attribute(handles.certificate, attr::SHA1_FINGERPRINT)?
                .to_string(),
        })
    }
}

/// Opaque materialization boundary
///
/// `apply` provisions the whole graph or fails on the first rejected
/// resource; `destroy` tears it down in the exact reverse of create order.
#[async_trait]
pub trait StackBackend: Send {
    /// Materialize a validated composition
    async fn apply(&mut self, composition: &Composition) -> StackResult<Deployment>;

    /// Tear a composition down, reversing create order
    async fn destroy(&mut self, composition: &Composition) -> StackResult<()>;
}

/// In-process backend that records what a real backend would do
///
/// Identifiers are sequence-based per kind, so re-applying the same
/// composition yields the same ids - the property reapply stability tests
/// lean on.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    counters: BTreeMap<&'static str, u64>,
    fail_on: BTreeSet<String>,
    created: Vec<String>,
    destroyed: Vec<String>,
}

impl RecordingBackend {
    /// Create a backend with no injected failures
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject a failure for the named resource
    pub fn with_failure(mut self, name: &str) -> Self {
        self.fail_on.insert(name.to_string());
        self
    }

    /// Logical names in the order they were created
    pub fn created(&self) -> &[String] {
        &self.created
    }

    /// Logical names in the order they were destroyed
    pub fn destroyed(&self) -> &[String] {
        &self.destroyed
    }

    fn next_id(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        *counter += 1;
        format!("{prefix}-{counter:08x}")
    }

    fn provision(
        &mut self,
        composition: &Composition,
        records: &BTreeMap<usize, ProvisionedResource>,
        r: ResourceRef,
    ) -> Result<ProvisionedResource, ProvisioningError> {
        let node = composition.graph().node(r);
        let region = composition.region_of(node.stack);

        if self.fail_on.contains(&node.name) {
            return Err(ProvisioningError::ResourceFailed {
                name: node.name.clone(),
                kind: node.spec.kind().to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let mut attributes = BTreeMap::new();
        let id = match &node.spec {
            ResourceSpec::Vpc { .. } => self.next_id("vpc"),
            ResourceSpec::Subnet { .. } => self.next_id("subnet"),
            ResourceSpec::InternetGateway { .. } => self.next_id("igw"),
            ResourceSpec::Eip { .. } => {
                let id = self.next_id("eipalloc");
                attributes.insert(attr::ALLOCATION_ID.to_string(), id.clone());
                id
            }
            ResourceSpec::NatGateway { .. } => self.next_id("nat"),
            ResourceSpec::RouteTable { .. } => self.next_id("rtb"),
            ResourceSpec::RouteTableAssociation { .. } => self.next_id("rtbassoc"),
            ResourceSpec::IamRole { name, .. } => {
                attributes.insert(
                    attr::ARN.to_string(),
                    format!("arn:aws:iam::123456789012:role/{name}"),
                );
                name.clone()
            }
            ResourceSpec::IamRolePolicyAttachment { .. } => self.next_id("attachment"),
            ResourceSpec::SecurityGroup { .. } => self.next_id("sg"),
            ResourceSpec::EksCluster { name, .. } => {
                let issuer_id = stable_hex_upper(&(name, region));
                attributes.insert(
                    attr::ENDPOINT.to_string(),
                    format!("https://{issuer_id}.gr7.{region}.eks.amazonaws.com"),
                );
                attributes.insert(
                    attr::OIDC_ISSUER.to_string(),
                    format!("https://oidc.eks.{region}.amazonaws.com/id/{issuer_id}"),
                );
                name.clone()
            }
            ResourceSpec::TlsCertificate { cluster } => {
                // The issuer URL exists only once the cluster is materialized
                let issuer = lookup(records, *cluster, attr::OIDC_ISSUER)?;
                attributes.insert(attr::SHA1_FINGERPRINT.to_string(), stable_hex_40(&issuer));
                self.next_id("cert")
            }
            ResourceSpec::OidcProvider { cluster, .. } => {
                let issuer = lookup(records, *cluster, attr::OIDC_ISSUER)?;
                let host_path = issuer.trim_start_matches("https://");
                let arn = format!("arn:aws:iam::123456789012:oidc-provider/{host_path}");
                attributes.insert(attr::ARN.to_string(), arn.clone());
                arn
            }
        };

        debug!(name = %node.name, kind = node.spec.kind(), %id, "provisioned resource");
        Ok(ProvisionedResource {
            name: node.name.clone(),
            kind: node.spec.kind().to_string(),
            id,
            attributes,
        })
    }
}

fn lookup(
    records: &BTreeMap<usize, ProvisionedResource>,
    r: ResourceRef,
    key: &str,
) -> Result<String, ProvisioningError> {
    let record = records
        .get(&r.index())
        .ok_or_else(|| ProvisioningError::UnresolvedReference {
            name: format!("resource #{}", r.index()),
            attribute: key.to_string(),
        })?;
    record
        .attributes
        .get(key)
        .cloned()
        .ok_or_else(|| ProvisioningError::UnresolvedReference {
            name: record.name.clone(),
            attribute: key.to_string(),
        })
}

/// 32 uppercase hex digits derived from a hashable value
fn stable_hex_upper<T: Hash>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:032X}", hasher.finish())
}

/// 40 lowercase hex digits (SHA-1 width) derived from a hashable value
fn stable_hex_40<T: Hash>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:040x}", hasher.finish())
}

#[async_trait]
impl StackBackend for RecordingBackend {
    async fn apply(&mut self, composition: &Composition) -> StackResult<Deployment> {
        composition.validate()?;

        let mut records: BTreeMap<usize, ProvisionedResource> = BTreeMap::new();
        for r in composition.graph().creation_order()? {
            let record = self.provision(composition, &records, r)?;
            self.created.push(record.name.clone());
            records.insert(r.index(), record);
        }

        let mut pending_hooks = Vec::new();
        for hook in composition.graph().hooks() {
            let HookAction::WaitForHttpHealthy {
                path,
                max_attempts,
                interval,
            } = &hook.action;

            let endpoint = lookup(&records, hook.depends_on, attr::ENDPOINT)?;
            pending_hooks.push(PendingHook {
                name: hook.name.clone(),
                endpoint,
                path: path.clone(),
                gate: ReadinessGate::new(*max_attempts, *interval),
            });
        }

        let deployment = Deployment {
            run_id: Uuid::now_v7(),
            records,
            pending_hooks,
        };
        info!(
            run_id = %deployment.run_id,
            resources = deployment.records.len(),
            hooks = deployment.pending_hooks.len(),
            "materialized composition"
        );
        Ok(deployment)
    }

    async fn destroy(&mut self, composition: &Composition) -> StackResult<()> {
        for r in composition.graph().destroy_order()? {
            let node = composition.graph().node(r);
            debug!(name = %node.name, "destroyed resource");
            self.destroyed.push(node.name.clone());
        }
        Ok(())
    }
}
