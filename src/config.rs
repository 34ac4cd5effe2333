//! CLI surface and the runtime configuration resolved from it.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::metrics::MetricsProxyConfig;

pub const DEFAULT_NAMESPACE: &str = "default";

/// Which entity's stats to report. An unrecognized value is rejected by the
/// parser with a diagnostic and a non-zero exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    Nodes,
    Pods,
}

#[derive(Debug, Parser)]
#[command(
    name = "kube-usage-reporter",
    about = "Reports node and pod resource utilization from a cluster's metrics service",
    version
)]
pub struct Cli {
    /// Absolute path to the kubeconfig file
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Repeat the report at a fixed interval
    #[arg(long)]
    pub watch: bool,

    /// Watch interval in seconds
    #[arg(long, default_value_t = 15)]
    pub duration: u64,

    /// Namespace to report pods from
    #[arg(long, short = 'n', default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,

    /// Report across all namespaces (overrides --namespace)
    #[arg(long)]
    pub all: bool,

    /// Label selector forwarded to the metrics service
    #[arg(long, short = 'l', default_value = "")]
    pub selector: String,

    /// Metric to report
    #[arg(long, value_enum, default_value_t = Metric::Nodes)]
    pub metric: Metric,
}

/// Resolved runtime configuration, constructed once at startup and passed by
/// reference from then on.
#[derive(Debug, Clone)]
pub struct Config {
    pub kubeconfig: Option<PathBuf>,
    pub watch: bool,
    pub interval: Duration,
    /// `None` means every namespace.
    pub namespace: Option<String>,
    pub selector: String,
    pub metric: Metric,
    pub metrics_proxy: MetricsProxyConfig,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let namespace = if cli.all { None } else { Some(cli.namespace) };
        Self {
            kubeconfig: cli.kubeconfig,
            watch: cli.watch,
            interval: Duration::from_secs(cli.duration),
            namespace,
            selector: cli.selector,
            metric: cli.metric,
            metrics_proxy: MetricsProxyConfig::default(),
        }
    }
}
