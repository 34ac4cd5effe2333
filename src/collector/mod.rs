//! Concurrent collection of per-entity usage statistics and the merge that
//! turns them into deterministic, name-ordered report rows.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Node, Pod};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::format::format_elapsed;
use crate::kubernetes::{self, NodeLookup};
use crate::metrics::{MetricsClient, ProxyTransport};
use crate::parsing::compute_usage_ratio;
use crate::types::{FailingPodIndex, NodeMetricRecord, PodMetricRecord, PodPhase};

/// Ceiling on how long one pod's fetch may run before the cycle gives up on
/// it. A hung transport then costs one row, not the whole cycle.
const POD_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the per-pod worker needs, detached from the API object so the
/// spawned task owns its data.
#[derive(Debug, Clone)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub node_name: Option<String>,
    pub phase: PodPhase,
    pub start_time: Option<DateTime<Utc>>,
    pub restart_count: i32,
    pub last_restart: Option<DateTime<Utc>>,
}

impl PodSnapshot {
    pub fn from_pod(pod: &Pod) -> Option<Self> {
        let name = pod.metadata.name.clone().filter(|n| !n.is_empty())?;
        Some(Self {
            name,
            namespace: pod
                .metadata
                .namespace
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            node_name: kubernetes::pod_node_name(pod).map(str::to_string),
            phase: kubernetes::pod_phase(pod),
            start_time: kubernetes::pod_start_time(pod),
            restart_count: kubernetes::pod_restart_count(pod),
            last_restart: kubernetes::pod_last_restart(pod),
        })
    }
}

/// Outcome of one dispatched worker. Exactly one is produced per pod.
enum PodFetch {
    Row(PodMetricRecord),
    Skipped { pod: String, reason: &'static str },
    Failed { pod: String, error: anyhow::Error },
}

pub struct StatsCollector<T: ProxyTransport, N: NodeLookup> {
    metrics: MetricsClient<T>,
    nodes: Arc<N>,
}

impl<T: ProxyTransport, N: NodeLookup> StatsCollector<T, N> {
    pub fn new(metrics: MetricsClient<T>, nodes: N) -> Self {
        Self {
            metrics,
            nodes: Arc::new(nodes),
        }
    }

    /// One worker per pod, no cap beyond the pod count itself. The merge
    /// drains exactly as many outcomes as workers were dispatched, then
    /// sorts by pod name so output never depends on completion order.
    pub async fn collect_pod_stats(
        &self,
        pods: &[Pod],
        label_selector: &str,
    ) -> Vec<PodMetricRecord> {
        let mut workers = JoinSet::new();
        for pod in pods {
            let Some(snapshot) = PodSnapshot::from_pod(pod) else {
                continue;
            };
            let metrics = self.metrics.clone();
            let nodes = Arc::clone(&self.nodes);
            let selector = label_selector.to_string();
            workers.spawn(async move { fetch_pod_stat(metrics, nodes, snapshot, selector).await });
        }

        let mut rows = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(PodFetch::Row(record)) => rows.push(record),
                Ok(PodFetch::Skipped { pod, reason }) => {
                    debug!("no stats for pod {}: {}", pod, reason);
                }
                Ok(PodFetch::Failed { pod, error }) => {
                    warn!("failed to collect stats for pod {}: {:#}", pod, error);
                }
                Err(join_error) => {
                    warn!("pod stats worker died: {}", join_error);
                }
            }
        }
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Node rows plus the failing-pod index, the latter built from a single
    /// pass over the pod list. A node whose fetch fails, or whose
    /// allocatable is zero, is dropped with a log line; the rest of the
    /// cycle is unaffected.
    pub async fn collect_node_stats(
        &self,
        nodes: &[Node],
        pods: &[Pod],
        label_selector: &str,
    ) -> (Vec<NodeMetricRecord>, FailingPodIndex) {
        let mut pods_by_node: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut failing = FailingPodIndex::new();
        for pod in pods {
            let Some(name) = pod.metadata.name.as_deref().filter(|n| !n.is_empty()) else {
                continue;
            };
            if let Some(node) = kubernetes::pod_node_name(pod) {
                pods_by_node.entry(node).or_default().push(name);
            }
            // Health is a pure phase filter; it holds whether or not any
            // metrics fetch below succeeds.
            let phase = kubernetes::pod_phase(pod);
            if !phase.is_running() {
                failing.insert(name.to_string(), phase);
            }
        }

        let mut rows = Vec::with_capacity(nodes.len());
        for node in nodes {
            let Some(name) = node.metadata.name.as_deref() else {
                continue;
            };
            let samples = match self.metrics.node_metrics(name, label_selector).await {
                Ok(samples) => samples,
                Err(error) => {
                    warn!("failed to get metrics for node {}: {:#}", name, error);
                    continue;
                }
            };
            let capacity = kubernetes::node_allocatable(node);
            let readiness = kubernetes::node_readiness(node);
            let pod_count = pods_by_node.get(name).map_or(0, |names| names.len());
            for sample in samples {
                let cpu = compute_usage_ratio(sample.cpu_millicores, capacity.cpu_millicores);
                let memory = compute_usage_ratio(sample.memory_bytes, capacity.memory_bytes);
                let (Some(cpu), Some(memory)) = (cpu, memory) else {
                    debug!("allocatable on node {} is zero, skipping", name);
                    continue;
                };
                rows.push(NodeMetricRecord {
                    name: name.to_string(),
                    cpu_usage_millicores: sample.cpu_millicores,
                    cpu_percent: cpu.percent(),
                    memory_usage_bytes: sample.memory_bytes,
                    memory_percent: memory.percent(),
                    pod_count,
                    readiness,
                });
            }
        }
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        (rows, failing)
    }
}

async fn fetch_pod_stat<T: ProxyTransport, N: NodeLookup>(
    metrics: MetricsClient<T>,
    nodes: Arc<N>,
    pod: PodSnapshot,
    selector: String,
) -> PodFetch {
    let work = async {
        // The usage sample and the scheduled node's allocatable are
        // independent fetches; issue both at once.
        let (samples, capacity) = tokio::join!(
            metrics.pod_metrics(Some(&pod.namespace), &pod.name, &selector),
            async {
                match pod.node_name.as_deref() {
                    Some(node) => nodes.allocatable(node).await.map(Some),
                    // An unscheduled pod has nothing to divide by.
                    None => Ok(None),
                }
            }
        );
        let samples = samples?;
        let capacity = capacity?.unwrap_or_default();

        let Some(sample) = samples.into_iter().next() else {
            return Ok(None);
        };
        Ok::<_, anyhow::Error>(Some(PodMetricRecord {
            name: pod.name.clone(),
            node_name: pod.node_name.clone().unwrap_or_default(),
            cpu_usage_millicores: sample.cpu_millicores,
            cpu_percent: compute_usage_ratio(sample.cpu_millicores, capacity.cpu_millicores)
                .map(|r| r.percent()),
            memory_usage_bytes: sample.memory_bytes,
            memory_percent: compute_usage_ratio(sample.memory_bytes, capacity.memory_bytes)
                .map(|r| r.percent()),
            phase: pod.phase,
            up_time: format_elapsed(pod.start_time),
            restart_count: pod.restart_count,
            last_restart_ago: format_elapsed(pod.last_restart),
        }))
    };

    let outcome = tokio::time::timeout(POD_FETCH_TIMEOUT, work).await;
    match outcome {
        Ok(Ok(Some(record))) => PodFetch::Row(record),
        Ok(Ok(None)) => PodFetch::Skipped {
            pod: pod.name,
            reason: "no usage sample yet",
        },
        Ok(Err(error)) => PodFetch::Failed {
            pod: pod.name,
            error,
        },
        Err(_) => PodFetch::Failed {
            pod: pod.name,
            error: anyhow!("fetch timed out after {:?}", POD_FETCH_TIMEOUT),
        },
    }
}
