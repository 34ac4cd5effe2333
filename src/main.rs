use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use tracing::{debug, info};

use kube_usage_reporter::collector::StatsCollector;
use kube_usage_reporter::config::{Cli, Config, Metric};
use kube_usage_reporter::kubernetes::{self, KubeNodeLookup, NodeLookup};
use kube_usage_reporter::metrics::{KubeProxyTransport, MetricsClient, ProxyTransport};
use kube_usage_reporter::report;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg: Config = Cli::parse().into();
    debug!("resolved config: {:?}", cfg);

    let client = build_client(cfg.kubeconfig.as_deref())
        .await
        .context("failed to construct cluster client")?;
    let transport = KubeProxyTransport::new(client.clone(), cfg.metrics_proxy.clone());
    let collector = StatsCollector::new(MetricsClient::new(transport), KubeNodeLookup::new(client.clone()));

    if cfg.watch {
        info!("watching every {:?}", cfg.interval);
        loop {
            run_cycle(&client, &collector, &cfg).await?;
            tokio::time::sleep(cfg.interval).await;
        }
    }
    run_cycle(&client, &collector, &cfg).await
}

/// One collect-then-render pass. Stateless: nothing survives into the next
/// cycle except the interval timer in `main`.
async fn run_cycle<T: ProxyTransport, N: NodeLookup>(
    client: &Client,
    collector: &StatsCollector<T, N>,
    cfg: &Config,
) -> Result<()> {
    match cfg.metric {
        Metric::Nodes => {
            let nodes = kubernetes::list_nodes(client)
                .await
                .context("failed to list nodes")?;
            let pods = kubernetes::list_pods(client, cfg.namespace.as_deref())
                .await
                .context("failed to list pods")?;
            let (records, failing) = collector.collect_node_stats(&nodes, &pods, &cfg.selector).await;
            report::print_node_stats(&records);
            if !failing.is_empty() {
                report::print_failing_pods(&failing);
            }
        }
        Metric::Pods => {
            let pods = kubernetes::list_pods(client, cfg.namespace.as_deref())
                .await
                .context("failed to list pods")?;
            let records = collector.collect_pod_stats(&pods, &cfg.selector).await;
            report::print_pod_stats(&records);
        }
    }
    Ok(())
}

async fn build_client(kubeconfig: Option<&Path>) -> Result<Client> {
    match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("failed to read kubeconfig at {}", path.display()))?;
            let config =
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await?;
            Ok(Client::try_from(config)?)
        }
        None => Ok(Client::try_default().await?),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
