use std::sync::Arc;

use async_trait::async_trait;
use kube::Client;
use thiserror::Error;

use super::convert::{self, ConvertError, NodeUsage, PodUsage, SchemaVersion};
use super::v1alpha1;

pub const DEFAULT_METRICS_NAMESPACE: &str = "kube-system";
pub const DEFAULT_METRICS_SCHEME: &str = "http";
pub const DEFAULT_METRICS_SERVICE: &str = "heapster";
/// Empty port selects the first port the service exposes.
pub const DEFAULT_METRICS_PORT: &str = "";

const METRICS_ROOT: &str = "/apis/metrics/v1alpha1";

/// Identifies the in-cluster service that serves usage samples. Constructed
/// once at startup and handed to the transport; constant for the run.
#[derive(Debug, Clone)]
pub struct MetricsProxyConfig {
    pub namespace: String,
    pub scheme: String,
    pub service: String,
    pub port: String,
}

impl Default for MetricsProxyConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_METRICS_NAMESPACE.to_string(),
            scheme: DEFAULT_METRICS_SCHEME.to_string(),
            service: DEFAULT_METRICS_SERVICE.to_string(),
            port: DEFAULT_METRICS_PORT.to_string(),
        }
    }
}

/// Adapter failures, one variant per stage. The adapter never retries; how
/// to treat a failure is the caller's decision.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics proxy request failed: {0}")]
    Transport(#[source] anyhow::Error),
    #[error("failed to decode metrics response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to convert metrics response: {0}")]
    Convert(#[from] ConvertError),
}

/// The raw HTTP hop to the metrics service. The adapter owns path and query
/// construction; everything below that sits behind this trait, which tests
/// stand in for with canned responses.
#[async_trait]
pub trait ProxyTransport: Send + Sync + 'static {
    async fn proxy_get(&self, path: &str, params: &[(&str, &str)]) -> anyhow::Result<Vec<u8>>;
}

/// Production transport: the API server's generic service-proxy subresource.
pub struct KubeProxyTransport {
    client: Client,
    config: MetricsProxyConfig,
}

impl KubeProxyTransport {
    pub fn new(client: Client, config: MetricsProxyConfig) -> Self {
        Self { client, config }
    }
}

fn proxy_uri(config: &MetricsProxyConfig, path: &str, params: &[(&str, &str)]) -> String {
    let mut uri = format!(
        "/api/v1/namespaces/{}/services/{}:{}:{}/proxy{}",
        config.namespace, config.scheme, config.service, config.port, path
    );
    if !params.is_empty() {
        let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        uri.push('?');
        uri.push_str(&query.join("&"));
    }
    uri
}

#[async_trait]
impl ProxyTransport for KubeProxyTransport {
    async fn proxy_get(&self, path: &str, params: &[(&str, &str)]) -> anyhow::Result<Vec<u8>> {
        let uri = proxy_uri(&self.config, path, params);
        let req = http::Request::builder()
            .method("GET")
            .uri(uri)
            .body(Vec::new())?;
        let body = self.client.request_text(req).await?;
        Ok(body.into_bytes())
    }
}

/// Client for the legacy metrics service: builds request paths, issues the
/// proxy call, and runs the decode-then-convert pipeline for the configured
/// schema version.
pub struct MetricsClient<T: ProxyTransport> {
    transport: Arc<T>,
    version: SchemaVersion,
}

impl<T: ProxyTransport> Clone for MetricsClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            version: self.version,
        }
    }
}

impl<T: ProxyTransport> MetricsClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            version: SchemaVersion::default(),
        }
    }

    /// Usage samples for one node, or for every node when `node_name` is
    /// empty. A named request is decoded as a bare object and wrapped into a
    /// one-element batch.
    pub async fn node_metrics(
        &self,
        node_name: &str,
        label_selector: &str,
    ) -> Result<Vec<NodeUsage>, MetricsError> {
        let path = node_metrics_path(node_name);
        let raw = self
            .transport
            .proxy_get(&path, &[("labelSelector", label_selector)])
            .await
            .map_err(MetricsError::Transport)?;
        match self.version {
            SchemaVersion::V1Alpha1 => {
                let versioned = v1alpha1::decode_nodes(&raw, !node_name.is_empty())?;
                Ok(convert::nodes_from_v1alpha1(versioned)?)
            }
        }
    }

    /// Usage samples for pods. `namespace: None` lists every namespace;
    /// within a namespace an empty `pod_name` lists the whole namespace.
    pub async fn pod_metrics(
        &self,
        namespace: Option<&str>,
        pod_name: &str,
        label_selector: &str,
    ) -> Result<Vec<PodUsage>, MetricsError> {
        let path = pod_metrics_path(namespace, pod_name);
        let singleton = namespace.is_some() && !pod_name.is_empty();
        let raw = self
            .transport
            .proxy_get(&path, &[("labelSelector", label_selector)])
            .await
            .map_err(MetricsError::Transport)?;
        match self.version {
            SchemaVersion::V1Alpha1 => {
                let versioned = v1alpha1::decode_pods(&raw, singleton)?;
                Ok(convert::pods_from_v1alpha1(versioned)?)
            }
        }
    }
}

fn node_metrics_path(name: &str) -> String {
    format!("{}/nodes/{}", METRICS_ROOT, name)
}

/// The all-namespaces listing has no per-pod form, so the pod name only
/// narrows a namespaced path.
fn pod_metrics_path(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        None => format!("{}/pods", METRICS_ROOT),
        Some(ns) => format!("{}/namespaces/{}/pods/{}", METRICS_ROOT, ns, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct CannedTransport {
        responses: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl ProxyTransport for CannedTransport {
        async fn proxy_get(&self, path: &str, _params: &[(&str, &str)]) -> anyhow::Result<Vec<u8>> {
            self.responses
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no route for {}", path))
        }
    }

    fn client_with(path: &str, body: &str) -> MetricsClient<CannedTransport> {
        let mut responses = HashMap::new();
        responses.insert(path.to_string(), body.as_bytes().to_vec());
        MetricsClient::new(CannedTransport { responses })
    }

    #[test]
    fn test_node_metrics_path() {
        assert_eq!(node_metrics_path("n1"), "/apis/metrics/v1alpha1/nodes/n1");
        assert_eq!(node_metrics_path(""), "/apis/metrics/v1alpha1/nodes/");
    }

    #[test]
    fn test_pod_metrics_paths() {
        assert_eq!(pod_metrics_path(None, "ignored"), "/apis/metrics/v1alpha1/pods");
        assert_eq!(
            pod_metrics_path(Some("default"), "p1"),
            "/apis/metrics/v1alpha1/namespaces/default/pods/p1"
        );
        assert_eq!(
            pod_metrics_path(Some("kube-system"), ""),
            "/apis/metrics/v1alpha1/namespaces/kube-system/pods/"
        );
    }

    #[tokio::test]
    async fn test_named_node_fetch_wraps_singleton() {
        let client = client_with(
            "/apis/metrics/v1alpha1/nodes/n1",
            r#"{"metadata":{"name":"n1"},"usage":{"cpu":"2000m","memory":"1Gi"}}"#,
        );
        let batch = client.node_metrics("n1", "").await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].name, "n1");
        assert_eq!(batch[0].cpu_millicores, 2000);
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct() {
        let client = client_with("/some/other/path", "{}");
        let err = client.node_metrics("n1", "").await.unwrap_err();
        assert!(matches!(err, MetricsError::Transport(_)));
    }

    #[tokio::test]
    async fn test_decode_failure_is_distinct() {
        let client = client_with("/apis/metrics/v1alpha1/nodes/n1", "not json");
        let err = client.node_metrics("n1", "").await.unwrap_err();
        assert!(matches!(err, MetricsError::Decode(_)));
    }

    #[tokio::test]
    async fn test_convert_failure_is_distinct() {
        let client = client_with(
            "/apis/metrics/v1alpha1/nodes/n1",
            r#"{"metadata":{"name":"n1"},"usage":{"cpu":"bogus"}}"#,
        );
        let err = client.node_metrics("n1", "").await.unwrap_err();
        assert!(matches!(err, MetricsError::Convert(_)));
    }

    #[tokio::test]
    async fn test_all_namespace_pod_listing() {
        let client = client_with(
            "/apis/metrics/v1alpha1/pods",
            r#"{"items":[
                {"metadata":{"name":"a"},"containers":[{"name":"c","usage":{"cpu":"10m","memory":"1Mi"}}]},
                {"metadata":{"name":"b"},"containers":[{"name":"c","usage":{"cpu":"20m","memory":"2Mi"}}]}
            ]}"#,
        );
        let batch = client.pod_metrics(None, "", "").await.unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_proxy_uri_shape() {
        let config = MetricsProxyConfig::default();
        let uri = proxy_uri(
            &config,
            "/apis/metrics/v1alpha1/nodes/n1",
            &[("labelSelector", "")],
        );
        // An empty port stays empty between the colons; the first exposed
        // service port is then used.
        assert_eq!(
            uri,
            "/api/v1/namespaces/kube-system/services/http:heapster:/proxy/apis/metrics/v1alpha1/nodes/n1?labelSelector="
        );
    }

    #[test]
    fn test_proxy_uri_with_port_and_selector() {
        let config = MetricsProxyConfig {
            namespace: "monitoring".to_string(),
            scheme: "https".to_string(),
            service: "metrics".to_string(),
            port: "8443".to_string(),
        };
        let uri = proxy_uri(&config, "/apis/metrics/v1alpha1/pods", &[("labelSelector", "app=web")]);
        assert_eq!(
            uri,
            "/api/v1/namespaces/monitoring/services/https:metrics:8443/proxy/apis/metrics/v1alpha1/pods?labelSelector=app=web"
        );
    }
}
