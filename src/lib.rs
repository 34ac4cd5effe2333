// Public modules
pub mod collector;
pub mod config;
pub mod format;
pub mod kubernetes;
pub mod metrics;
pub mod parsing;
pub mod report;
pub mod types;

// Re-export commonly used items
pub use collector::{PodSnapshot, StatsCollector};
pub use config::{Cli, Config, Metric};
pub use format::{format_cpu, format_elapsed, format_memory, format_span};
pub use kubernetes::{KubeNodeLookup, NodeLookup};
pub use metrics::{
    KubeProxyTransport, MetricsClient, MetricsError, MetricsProxyConfig, NodeUsage, PodUsage,
    ProxyTransport, SchemaVersion,
};
pub use parsing::{compute_usage_ratio, parse_cpu_millicores, parse_memory_bytes, UsageRatio};
pub use types::*;
