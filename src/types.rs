use std::collections::BTreeMap;
use std::fmt;

/// Pod lifecycle phase as reported by the cluster API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Anything the API reports outside the five documented phases maps to
    /// `Unknown`.
    pub fn parse(phase: &str) -> Self {
        match phase {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }

    pub fn is_running(self) -> bool {
        self == PodPhase::Running
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// A node's Ready condition. `Absent` means the condition was not reported
/// at all and renders as an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeReadiness {
    Ready,
    NotReady,
    Unknown,
    Absent,
}

impl fmt::Display for NodeReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeReadiness::Ready => "Ready",
            NodeReadiness::NotReady => "NotReady",
            NodeReadiness::Unknown => "Unknown",
            NodeReadiness::Absent => "",
        };
        f.write_str(s)
    }
}

/// Allocatable CPU and memory a node reports as schedulable. Zero means
/// missing or malformed in the node status; ratios against it are undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCapacity {
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
}

/// One node row of a polling cycle. Built fresh each cycle, never mutated.
#[derive(Debug, Clone)]
pub struct NodeMetricRecord {
    pub name: String,
    pub cpu_usage_millicores: i64,
    pub cpu_percent: i64,
    pub memory_usage_bytes: i64,
    pub memory_percent: i64,
    pub pod_count: usize,
    pub readiness: NodeReadiness,
}

/// One pod row of a polling cycle. Percentages are `None` when the scheduled
/// node's allocatable is unknown or zero.
#[derive(Debug, Clone)]
pub struct PodMetricRecord {
    pub name: String,
    pub node_name: String,
    pub cpu_usage_millicores: i64,
    pub cpu_percent: Option<i64>,
    pub memory_usage_bytes: i64,
    pub memory_percent: Option<i64>,
    pub phase: PodPhase,
    pub up_time: String,
    pub restart_count: i32,
    pub last_restart_ago: String,
}

/// Pods whose phase is anything other than `Running`, keyed by pod name.
/// A BTreeMap so the failure table always renders in the same order.
pub type FailingPodIndex = BTreeMap<String, PodPhase>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_phase_parse() {
        assert_eq!(PodPhase::parse("Running"), PodPhase::Running);
        assert_eq!(PodPhase::parse("Pending"), PodPhase::Pending);
        assert_eq!(PodPhase::parse("Succeeded"), PodPhase::Succeeded);
        assert_eq!(PodPhase::parse("Failed"), PodPhase::Failed);
        assert_eq!(PodPhase::parse("Evicted"), PodPhase::Unknown);
        assert_eq!(PodPhase::parse(""), PodPhase::Unknown);
    }

    #[test]
    fn test_only_running_counts_as_healthy() {
        assert!(PodPhase::Running.is_running());
        for phase in [
            PodPhase::Pending,
            PodPhase::Succeeded,
            PodPhase::Failed,
            PodPhase::Unknown,
        ] {
            assert!(!phase.is_running());
        }
    }

    #[test]
    fn test_readiness_display() {
        assert_eq!(NodeReadiness::Ready.to_string(), "Ready");
        assert_eq!(NodeReadiness::NotReady.to_string(), "NotReady");
        assert_eq!(NodeReadiness::Unknown.to_string(), "Unknown");
        assert_eq!(NodeReadiness::Absent.to_string(), "");
    }
}
