//! Read-only cluster API access and field extraction from cluster objects.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Node, Pod};
use kube::{api::ListParams, Api, Client};

use crate::parsing::{parse_cpu_millicores, parse_memory_bytes};
use crate::types::{NodeCapacity, NodeReadiness, PodPhase};

pub async fn list_nodes(client: &Client) -> Result<Vec<Node>> {
    let api: Api<Node> = Api::all(client.clone());
    Ok(api.list(&ListParams::default()).await?.items)
}

/// Lists pods in one namespace, or across every namespace when `namespace`
/// is `None`.
pub async fn list_pods(client: &Client, namespace: Option<&str>) -> Result<Vec<Pod>> {
    let api: Api<Pod> = match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };
    Ok(api.list(&ListParams::default()).await?.items)
}

/// Per-name allocatable lookup the collection pipeline performs for each
/// pod's scheduled node. A seam so the pipeline runs against canned nodes in
/// tests.
#[async_trait]
pub trait NodeLookup: Send + Sync + 'static {
    async fn allocatable(&self, node_name: &str) -> Result<NodeCapacity>;
}

pub struct KubeNodeLookup {
    client: Client,
}

impl KubeNodeLookup {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeLookup for KubeNodeLookup {
    async fn allocatable(&self, node_name: &str) -> Result<NodeCapacity> {
        let api: Api<Node> = Api::all(self.client.clone());
        let node = api.get(node_name).await?;
        Ok(node_allocatable(&node))
    }
}

/// Allocatable CPU and memory from node status. Missing or malformed
/// quantities count as zero, which downstream treats as "ratio undefined".
pub fn node_allocatable(node: &Node) -> NodeCapacity {
    let allocatable = node.status.as_ref().and_then(|s| s.allocatable.as_ref());
    NodeCapacity {
        cpu_millicores: allocatable
            .and_then(|a| a.get("cpu"))
            .and_then(|q| parse_cpu_millicores(&q.0))
            .unwrap_or(0),
        memory_bytes: allocatable
            .and_then(|a| a.get("memory"))
            .and_then(|q| parse_memory_bytes(&q.0))
            .unwrap_or(0),
    }
}

pub fn node_readiness(node: &Node) -> NodeReadiness {
    let ready = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"));
    match ready {
        Some(condition) => match condition.status.as_str() {
            "True" => NodeReadiness::Ready,
            "False" => NodeReadiness::NotReady,
            _ => NodeReadiness::Unknown,
        },
        None => NodeReadiness::Absent,
    }
}

pub fn pod_phase(pod: &Pod) -> PodPhase {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .map(PodPhase::parse)
        .unwrap_or(PodPhase::Unknown)
}

pub fn pod_node_name(pod: &Pod) -> Option<&str> {
    pod.spec
        .as_ref()
        .and_then(|s| s.node_name.as_deref())
        .filter(|n| !n.is_empty())
}

pub fn pod_start_time(pod: &Pod) -> Option<DateTime<Utc>> {
    pod.status
        .as_ref()
        .and_then(|s| s.start_time.as_ref())
        .map(|t| t.0)
}

/// Cumulative restarts across all of the pod's containers.
pub fn pod_restart_count(pod: &Pod) -> i32 {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(|cs| cs.restart_count).sum())
        .unwrap_or(0)
}

/// When the most recent restart finished, across all containers. `None`
/// when no container has ever been restarted.
pub fn pod_last_restart(pod: &Pod) -> Option<DateTime<Utc>> {
    pod.status
        .as_ref()
        .and_then(|s| s.container_statuses.as_ref())?
        .iter()
        .filter_map(|cs| {
            cs.last_state
                .as_ref()?
                .terminated
                .as_ref()?
                .finished_at
                .as_ref()
                .map(|t| t.0)
        })
        .max()
}
