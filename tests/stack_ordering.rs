//! Composition-level ordering tests: create order, symmetric destroy
//! order, and the deferred readiness hook.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use cloud_topology::backend::RecordingBackend;
use cloud_topology::errors::ReadinessError;
use cloud_topology::readiness::{HealthProbe, ProbeAttemptError};
use cloud_topology::stack::{compose, TopologyConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Probe that succeeds once `healthy_after` calls have been made
struct FlakyProbe {
    healthy_after: u32,
    calls: AtomicU32,
}

impl FlakyProbe {
    fn new(healthy_after: u32) -> Self {
        Self {
            healthy_after,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl HealthProbe for FlakyProbe {
    async fn check(&self, _url: &str) -> Result<(), ProbeAttemptError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.healthy_after {
            Ok(())
        } else {
            Err(ProbeAttemptError("connection refused".to_string()))
        }
    }
}

#[tokio::test]
async fn network_stack_is_created_first_and_destroyed_last() {
    init_tracing();
    let topology = compose(&TopologyConfig::reference_deployment().unwrap()).unwrap();
    let mut backend = RecordingBackend::new();

    topology.apply(&mut backend).await.unwrap();
    topology.destroy(&mut backend).await.unwrap();

    // The first created resource is the network's VPC, the first destroyed
    // is the cluster's last-registered resource
    assert_eq!(backend.created().first().map(String::as_str), Some("vpc"));
    assert_eq!(
        backend.destroyed().first().map(String::as_str),
        Some("openid-provider")
    );
    assert_eq!(backend.destroyed().last().map(String::as_str), Some("vpc"));

    // Destroy order is the exact reverse of create order
    let mut created = backend.created().to_vec();
    created.reverse();
    assert_eq!(&created, backend.destroyed());
}

#[tokio::test]
async fn readiness_hook_targets_the_cluster_endpoint() {
    let topology = compose(&TopologyConfig::reference_deployment().unwrap()).unwrap();
    let mut backend = RecordingBackend::new();
    let deployment = topology.apply(&mut backend).await.unwrap();

    let hooks = deployment.pending_hooks();
    assert_eq!(hooks.len(), 1);

    let hook = &hooks[0];
    assert_eq!(hook.name, "wait-for-cluster");
    assert_eq!(hook.path, "/healthz");
    assert_eq!(hook.gate.max_attempts(), 60);
    assert_eq!(hook.gate.interval(), Duration::from_secs(5));
    assert_eq!(
        hook.endpoint,
        deployment
            .attribute(topology.cluster.cluster, "endpoint")
            .unwrap()
    );
}

#[tokio::test(start_paused = true)]
async fn hooks_succeed_once_the_endpoint_answers() {
    let topology = compose(&TopologyConfig::reference_deployment().unwrap()).unwrap();
    let mut backend = RecordingBackend::new();
    let deployment = topology.apply(&mut backend).await.unwrap();

    let probe = FlakyProbe::new(3);
    deployment.run_hooks(&probe).await.unwrap();
    assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn hooks_time_out_after_the_full_budget() {
    let topology = compose(&TopologyConfig::reference_deployment().unwrap()).unwrap();
    let mut backend = RecordingBackend::new();
    let deployment = topology.apply(&mut backend).await.unwrap();

    let probe = FlakyProbe::new(u32::MAX);
    let err = deployment.run_hooks(&probe).await.unwrap_err();
    assert_eq!(err, ReadinessError::Timeout { attempts: 60 });
    assert_eq!(probe.calls.load(Ordering::SeqCst), 60);
}
