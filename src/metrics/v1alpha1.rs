//! Wire schema of the legacy metrics service (`metrics/v1alpha1`).
//!
//! These types mirror the versioned JSON envelope exactly as it arrives from
//! the proxy. Nothing outside this module's sibling [`super::convert`] should
//! ever see them; callers work with the version-independent representation.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NodeMetrics {
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub usage: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeMetricsList {
    #[serde(default)]
    pub items: Vec<NodeMetrics>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerMetrics {
    pub name: String,
    #[serde(default)]
    pub usage: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PodMetrics {
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub containers: Vec<ContainerMetrics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PodMetricsList {
    #[serde(default)]
    pub items: Vec<PodMetrics>,
}

/// Decodes a node-metrics response body.
///
/// `singleton` reflects whether the request path named a node: a named
/// request returns one bare object rather than a list, and the two shapes
/// are selected by the request that was made, never sniffed from the bytes.
pub fn decode_nodes(raw: &[u8], singleton: bool) -> Result<NodeMetricsList, serde_json::Error> {
    if singleton {
        let item: NodeMetrics = serde_json::from_slice(raw)?;
        Ok(NodeMetricsList { items: vec![item] })
    } else {
        serde_json::from_slice(raw)
    }
}

/// Decodes a pod-metrics response body; `singleton` as in [`decode_nodes`].
pub fn decode_pods(raw: &[u8], singleton: bool) -> Result<PodMetricsList, serde_json::Error> {
    if singleton {
        let item: PodMetrics = serde_json::from_slice(raw)?;
        Ok(PodMetricsList { items: vec![item] })
    } else {
        serde_json::from_slice(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE_ITEM: &str =
        r#"{"metadata":{"name":"n1"},"usage":{"cpu":"2000m","memory":"1Gi"}}"#;

    #[test]
    fn test_decode_single_node_wrapped_into_list() {
        let list = decode_nodes(NODE_ITEM.as_bytes(), true).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].usage.get("cpu").unwrap(), "2000m");
    }

    #[test]
    fn test_decode_node_list() {
        let body = format!(r#"{{"items":[{},{}]}}"#, NODE_ITEM, NODE_ITEM);
        let list = decode_nodes(body.as_bytes(), false).unwrap();
        assert_eq!(list.items.len(), 2);
    }

    #[test]
    fn test_singleton_branch_follows_request_not_shape() {
        // A list body under a singleton request is decoded as one (empty)
        // object; the items it carries are never pulled in. The branch is
        // driven by the request that was made, not by the payload.
        let body = r#"{"items":[{"metadata":{"name":"n1"},"usage":{"cpu":"1"}}]}"#;
        let list = decode_nodes(body.as_bytes(), true).unwrap();
        assert_eq!(list.items.len(), 1);
        assert!(list.items[0].usage.is_empty());
    }

    #[test]
    fn test_decode_pod_with_containers() {
        let body = r#"{"metadata":{"name":"p1","namespace":"default"},
            "containers":[
                {"name":"app","usage":{"cpu":"100m","memory":"64Mi"}},
                {"name":"sidecar","usage":{"cpu":"50m","memory":"32Mi"}}
            ]}"#;
        let list = decode_pods(body.as_bytes(), true).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].containers.len(), 2);
    }

    #[test]
    fn test_decode_garbage_is_an_error() {
        assert!(decode_nodes(b"not json", false).is_err());
        assert!(decode_pods(b"[1,2,3]", false).is_err());
    }
}
