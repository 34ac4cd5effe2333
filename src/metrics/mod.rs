//! Adapter for the legacy in-cluster metrics service, reached through the
//! API server's service-proxy mechanism. Owns path construction, the proxy
//! call, and the decode-then-convert pipeline from the versioned wire
//! envelope to the crate's own usage samples.

pub mod client;
pub mod convert;
pub mod v1alpha1;

pub use client::{
    KubeProxyTransport, MetricsClient, MetricsError, MetricsProxyConfig, ProxyTransport,
    DEFAULT_METRICS_NAMESPACE, DEFAULT_METRICS_PORT, DEFAULT_METRICS_SCHEME,
    DEFAULT_METRICS_SERVICE,
};
pub use convert::{ConvertError, NodeUsage, PodUsage, SchemaVersion};
