// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Composer
//!
//! Wires the two builders into one composition: the network stack first,
//! then the cluster stack consuming the network's handles, then one
//! explicit stack dependency edge (cluster depends-on network). The edge is
//! recorded even though the cluster's data references already imply the
//! same create order, because destroy order - cluster torn down before
//! network - is derived from it.
//!
//! Each stack also carries its remote-state location (bucket, key = stack
//! name, region). That record is configuration handed to the backend, not
//! logic; nothing here reads it back.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::{Deployment, StackBackend};
use crate::cluster::{ClusterBuilder, ClusterConfig, ClusterHandles};
use crate::domain::CidrError;
use crate::errors::{PlanningError, StackResult};
use crate::graph::{
    OutputValue, PostProvisionHook, ResourceGraph, StackId, StackScope,
};
use crate::network::{NetworkBuilder, NetworkConfig, NetworkHandles};
use crate::resources::{ResourceRef, ResourceSpec};

/// Persisted-state location for one stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStateConfig {
    /// State bucket name
    pub bucket: String,
    /// Object key, always the stack name
    pub key: String,
    /// Bucket region
    pub region: String,
}

/// Per-stack metadata: name, provider region, and state location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackMeta {
    /// Stack name
    pub name: String,
    /// Region the stack's resources are provisioned in
    pub region: String,
    /// Remote-state location
    pub state: RemoteStateConfig,
}

/// A multi-stack composition: the graph plus per-stack metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    graph: ResourceGraph,
    metas: Vec<StackMeta>,
}

impl Composition {
    /// Create an empty composition
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack; its state key is its name
    pub fn add_stack(&mut self, name: &str, region: &str, state_bucket: &str) -> StackId {
        let id = self.graph.add_stack(name);
        self.metas.push(StackMeta {
            name: name.to_string(),
            region: region.to_string(),
            state: RemoteStateConfig {
                bucket: state_bucket.to_string(),
                key: name.to_string(),
                region: region.to_string(),
            },
        });
        id
    }

    /// Registration scope for one stack, for handing to a builder
    pub fn scope(&mut self, stack: StackId) -> StackView<'_> {
        StackView {
            graph: &mut self.graph,
            stack,
        }
    }

    /// Record that `dependent` is created after and destroyed before
    /// `dependency`
    pub fn add_stack_dependency(&mut self, dependent: StackId, dependency: StackId) {
        self.graph.add_stack_dependency(dependent, dependency);
    }

    /// The underlying resource graph
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// Metadata for a stack
    pub fn stack_meta(&self, stack: StackId) -> &StackMeta {
        &self.metas[stack.0]
    }

    /// Provider region for a stack
    pub fn region_of(&self, stack: StackId) -> &str {
        &self.metas[stack.0].region
    }

    /// Validate the whole composition before handing it to a backend
    pub fn validate(&self) -> Result<(), PlanningError> {
        self.graph.validate()
    }
}

/// Mutable view of one stack inside a composition
///
/// The only thing a builder ever sees of its parent context.
pub struct StackView<'a> {
    graph: &'a mut ResourceGraph,
    stack: StackId,
}

impl StackScope for StackView<'_> {
    fn register_resource(
        &mut self,
        name: &str,
        spec: ResourceSpec,
    ) -> Result<ResourceRef, PlanningError> {
        self.graph.register_resource(self.stack, name, spec)
    }

    fn register_output(&mut self, name: &str, value: OutputValue) -> Result<(), PlanningError> {
        self.graph.register_output(self.stack, name, value)
    }

    fn register_hook(&mut self, hook: PostProvisionHook) -> Result<(), PlanningError> {
        self.graph.register_hook(hook);
        Ok(())
    }
}

/// Full deployment configuration: state bucket plus both layers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyConfig {
    /// Bucket holding every stack's persisted state
    pub state_bucket: String,
    /// Network layer
    pub network: NetworkConfig,
    /// Cluster layer
    pub cluster: ClusterConfig,
}

impl TopologyConfig {
    /// The reference deployment profile end to end
    pub fn reference_deployment() -> Result<Self, CidrError> {
        Ok(Self {
            state_bucket: "kubernetes-course-state".to_string(),
            network: NetworkConfig::reference_deployment()?,
            cluster: ClusterConfig::default(),
        })
    }
}

/// A fully composed topology, ready to hand to a backend
#[derive(Debug, Clone)]
pub struct ComposedTopology {
    composition: Composition,
    /// The network stack
    pub network_stack: StackId,
    /// The cluster stack
    pub cluster_stack: StackId,
    /// Handles exported by the network builder
    pub network: NetworkHandles,
    /// Handles exported by the cluster builder
    pub cluster: ClusterHandles,
}

impl ComposedTopology {
    /// The composition backing this topology
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Materialize the whole graph through a backend
    pub async fn apply(&self, backend: &mut dyn StackBackend) -> StackResult<Deployment> {
        backend.apply(&self.composition).await
    }

    /// Tear everything down, cluster stack before network stack
    pub async fn destroy(&self, backend: &mut dyn StackBackend) -> StackResult<()> {
        backend.destroy(&self.composition).await
    }
}

/// Compose the network and cluster stacks from one configuration
///
/// Network first, cluster second, one explicit dependency edge, then a
/// whole-composition validation pass. Any failure propagates unchanged;
/// there is no recovery strategy here beyond reporting.
pub fn compose(config: &TopologyConfig) -> Result<ComposedTopology, PlanningError> {
    let mut composition = Composition::new();

    let network_stack = composition.add_stack(
        "networkStack",
        &config.network.region,
        &config.state_bucket,
    );
    let network = NetworkBuilder::new(config.network.clone())
        .build(&mut composition.scope(network_stack))?;

    let cluster_stack = composition.add_stack(
        &config.network.name,
        &config.network.region,
        &config.state_bucket,
    );
    let cluster = ClusterBuilder::new(config.cluster.clone())
        .build(&mut composition.scope(cluster_stack), &network)?;

    // Explicit ordering edge, independent of the data references above
    composition.add_stack_dependency(cluster_stack, network_stack);
    composition.validate()?;

    info!(
        stacks = composition.graph().stack_count(),
        resources = composition.graph().nodes().len(),
        "composed topology"
    );

    Ok(ComposedTopology {
        composition,
        network_stack,
        cluster_stack,
        network,
        cluster,
    })
}
