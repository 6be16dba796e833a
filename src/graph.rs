// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Dependency Graph
//!
//! The composition-time model: stacks, nodes, outputs, and post-provision
//! hooks. Builders register typed specs through the narrow [`StackScope`]
//! interface and get back [`ResourceRef`] handles; nothing here performs
//! I/O. The backend later walks [`ResourceGraph::creation_order`] to
//! materialize nodes and the exact reverse to destroy them.
//!
//! Ordering rules:
//!
//! - Within a stack, registration order is already a valid topological
//!   order, because a `ResourceRef` can only be obtained by registering the
//!   node it points to.
//! - Across stacks, explicit stack dependencies decide ordering. Data
//!   references across stacks are legal only when a matching stack
//!   dependency was declared; [`ResourceGraph::validate`] rejects anything
//!   else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::errors::PlanningError;
use crate::resources::{ResourceRef, ResourceSpec};

/// Handle to a stack within a composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StackId(pub(crate) usize);

/// A registered resource: logical name, owning stack, and its spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Logical name, unique within the stack
    pub name: String,
    /// Owning stack
    pub stack: StackId,
    /// Declarative specification
    pub spec: ResourceSpec,
}

/// Value exported by a stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputValue {
    /// A single resource id
    Ref(ResourceRef),
    /// An ordered list of resource ids
    RefList(Vec<ResourceRef>),
}

/// Deferred action the backend runs after its dependency is created
///
/// Hooks never run at plan time and never gate resource creation; they gate
/// whatever comes after the deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostProvisionHook {
    /// Logical name of the hook
    pub name: String,
    /// Resource that must exist before the hook runs
    pub depends_on: ResourceRef,
    /// What to do
    pub action: HookAction,
}

/// Typed post-provision actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HookAction {
    /// Poll an HTTP health endpoint on the dependency until it answers
    /// with a non-error status or the attempts run out
    WaitForHttpHealthy {
        /// Path appended to the dependency's resolved endpoint
        path: String,
        /// Poll attempts before reporting a timeout
        max_attempts: u32,
        /// Fixed delay between attempts
        interval: Duration,
    },
}

/// Narrow registration interface a builder requires from its parent context
///
/// Builders depend on exactly these three operations and nothing else about
/// the composition they are embedded in.
pub trait StackScope {
    /// Register a resource under a stack-unique logical name
    fn register_resource(
        &mut self,
        name: &str,
        spec: ResourceSpec,
    ) -> Result<ResourceRef, PlanningError>;

    /// Export a named value from the stack
    fn register_output(&mut self, name: &str, value: OutputValue) -> Result<(), PlanningError>;

    /// Register a deferred post-provision hook
    fn register_hook(&mut self, hook: PostProvisionHook) -> Result<(), PlanningError>;
}

/// The full composition-time resource graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceGraph {
    stacks: Vec<String>,
    nodes: Vec<ResourceNode>,
    outputs: BTreeMap<StackId, BTreeMap<String, OutputValue>>,
    hooks: Vec<PostProvisionHook>,
    stack_deps: Vec<(StackId, StackId)>,
}

impl ResourceGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack and return its handle
    pub fn add_stack(&mut self, name: &str) -> StackId {
        let id = StackId(self.stacks.len());
        self.stacks.push(name.to_string());
        id
    }

    /// Name of a stack
    pub fn stack_name(&self, stack: StackId) -> &str {
        &self.stacks[stack.0]
    }

    /// Number of stacks in the composition
    pub fn stack_count(&self) -> usize {
        self.stacks.len()
    }

    /// Record that `dependent` must be created after `dependency` and
    /// destroyed before it
    ///
    /// This edge is independent of any data references between the stacks;
    /// the composer records it even when data references already imply the
    /// same ordering, because destroy-time ordering is derived from it.
    pub fn add_stack_dependency(&mut self, dependent: StackId, dependency: StackId) {
        debug!(
            dependent = self.stack_name(dependent),
            dependency = self.stack_name(dependency),
            "declared stack dependency"
        );
        self.stack_deps.push((dependent, dependency));
    }

    /// Register a resource in a stack
    pub fn register_resource(
        &mut self,
        stack: StackId,
        name: &str,
        spec: ResourceSpec,
    ) -> Result<ResourceRef, PlanningError> {
        if self
            .nodes
            .iter()
            .any(|n| n.stack == stack && n.name == name)
        {
            return Err(PlanningError::DuplicateResourceName {
                stack: self.stack_name(stack).to_string(),
                name: name.to_string(),
            });
        }

        let r = ResourceRef(self.nodes.len());
        debug!(
            stack = self.stack_name(stack),
            name,
            kind = spec.kind(),
            "registered resource"
        );
        self.nodes.push(ResourceNode {
            name: name.to_string(),
            stack,
            spec,
        });
        Ok(r)
    }

    /// Export a named value from a stack
    pub fn register_output(
        &mut self,
        stack: StackId,
        name: &str,
        value: OutputValue,
    ) -> Result<(), PlanningError> {
        let outputs = self.outputs.entry(stack).or_default();
        if outputs.contains_key(name) {
            return Err(PlanningError::DuplicateOutputName {
                stack: self.stack_name(stack).to_string(),
                name: name.to_string(),
            });
        }
        outputs.insert(name.to_string(), value);
        Ok(())
    }

    /// Register a deferred post-provision hook
    pub fn register_hook(&mut self, hook: PostProvisionHook) {
        self.hooks.push(hook);
    }

    /// Node behind a reference
    pub fn node(&self, r: ResourceRef) -> &ResourceNode {
        &self.nodes[r.0]
    }

    /// Look a resource up by stack and logical name
    pub fn find_resource(&self, stack: StackId, name: &str) -> Option<ResourceRef> {
        self.nodes
            .iter()
            .position(|n| n.stack == stack && n.name == name)
            .map(ResourceRef)
    }

    /// All nodes, in registration order
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    /// All hooks, in registration order
    pub fn hooks(&self) -> &[PostProvisionHook] {
        &self.hooks
    }

    /// Outputs exported by a stack
    pub fn outputs(&self, stack: StackId) -> Option<&BTreeMap<String, OutputValue>> {
        self.outputs.get(&stack)
    }

    /// Direct dependencies of a node (its data references)
    ///
    /// Nodes whose dependency sets are disjoint may be provisioned
    /// concurrently; the orderings returned by [`Self::creation_order`] are
    /// one valid serialization of that partial order.
    pub fn dependencies(&self, r: ResourceRef) -> Vec<ResourceRef> {
        self.node(r).spec.references()
    }

    /// Stacks in create order (dependencies before dependents)
    pub fn stack_order(&self) -> Result<Vec<StackId>, PlanningError> {
        // Kahn's algorithm, preserving declaration order among ready stacks
        let n = self.stacks.len();
        let mut in_degree = vec![0usize; n];
        for &(dependent, _) in &self.stack_deps {
            in_degree[dependent.0] += 1;
        }

        let mut order = Vec::with_capacity(n);
        let mut placed = vec![false; n];
        while order.len() < n {
            let next = (0..n).find(|&i| !placed[i] && in_degree[i] == 0);
            let Some(i) = next else {
                let stuck = (0..n).find(|&i| !placed[i]).unwrap_or(0);
                return Err(PlanningError::CyclicStackDependency {
                    stack: self.stacks[stuck].clone(),
                });
            };
            placed[i] = true;
            order.push(StackId(i));
            for &(dependent, dependency) in &self.stack_deps {
                if dependency.0 == i {
                    in_degree[dependent.0] -= 1;
                }
            }
        }
        Ok(order)
    }

    /// All nodes in create order: stack order first, registration order
    /// within each stack
    pub fn creation_order(&self) -> Result<Vec<ResourceRef>, PlanningError> {
        let mut order = Vec::with_capacity(self.nodes.len());
        for stack in self.stack_order()? {
            for (i, node) in self.nodes.iter().enumerate() {
                if node.stack == stack {
                    order.push(ResourceRef(i));
                }
            }
        }
        Ok(order)
    }

    /// All nodes in destroy order: the exact reverse of create order
    pub fn destroy_order(&self) -> Result<Vec<ResourceRef>, PlanningError> {
        let mut order = self.creation_order()?;
        order.reverse();
        Ok(order)
    }

    /// Check cross-stack references against declared stack dependencies
    ///
    /// Every data reference that crosses a stack boundary must be covered by
    /// a declared (transitive) stack dependency; references relying on
    /// declaration order alone are rejected.
    pub fn validate(&self) -> Result<(), PlanningError> {
        self.stack_order()?;

        for (i, node) in self.nodes.iter().enumerate() {
            for referenced in self.dependencies(ResourceRef(i)) {
                let target_stack = self.node(referenced).stack;
                if target_stack != node.stack && !self.depends_on(node.stack, target_stack) {
                    return Err(PlanningError::MissingStackDependency {
                        resource: node.name.clone(),
                        from: self.stack_name(node.stack).to_string(),
                        to: self.stack_name(target_stack).to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Whether `from` transitively depends on `to`
    fn depends_on(&self, from: StackId, to: StackId) -> bool {
        let mut pending = vec![from];
        let mut seen = vec![false; self.stacks.len()];
        while let Some(current) = pending.pop() {
            if current == to {
                return true;
            }
            if std::mem::replace(&mut seen[current.0], true) {
                continue;
            }
            for &(dependent, dependency) in &self.stack_deps {
                if dependent == current {
                    pending.push(dependency);
                }
            }
        }
        false
    }
}
