//! Version-independent usage samples and the conversion from the wire
//! schema. New metrics-service revisions plug in here: add a variant to
//! [`SchemaVersion`] and a matching conversion, and callers stay untouched.

use thiserror::Error;

use crate::parsing::{parse_cpu_millicores, parse_memory_bytes};

use super::v1alpha1;

/// Wire schema revisions the adapter understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaVersion {
    #[default]
    V1Alpha1,
}

/// A node's measured consumption at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUsage {
    pub name: String,
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
}

/// A pod's measured consumption, summed across its containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodUsage {
    pub name: String,
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("metrics item carries no object name")]
    MissingName,
    #[error("unparseable {resource} quantity {value:?} for {name}")]
    BadQuantity {
        name: String,
        resource: &'static str,
        value: String,
    },
}

pub fn nodes_from_v1alpha1(
    list: v1alpha1::NodeMetricsList,
) -> Result<Vec<NodeUsage>, ConvertError> {
    list.items
        .into_iter()
        .map(|item| {
            let name = object_name(&item.metadata)?;
            let cpu_millicores = usage_quantity(&item.usage, "cpu", &name, parse_cpu_millicores)?;
            let memory_bytes = usage_quantity(&item.usage, "memory", &name, parse_memory_bytes)?;
            Ok(NodeUsage {
                name,
                cpu_millicores,
                memory_bytes,
            })
        })
        .collect()
}

pub fn pods_from_v1alpha1(list: v1alpha1::PodMetricsList) -> Result<Vec<PodUsage>, ConvertError> {
    list.items
        .into_iter()
        .map(|item| {
            let name = object_name(&item.metadata)?;
            let mut cpu_millicores = 0;
            let mut memory_bytes = 0;
            for container in &item.containers {
                cpu_millicores +=
                    usage_quantity(&container.usage, "cpu", &name, parse_cpu_millicores)?;
                memory_bytes +=
                    usage_quantity(&container.usage, "memory", &name, parse_memory_bytes)?;
            }
            Ok(PodUsage {
                name,
                cpu_millicores,
                memory_bytes,
            })
        })
        .collect()
}

fn object_name(metadata: &serde_json::Value) -> Result<String, ConvertError> {
    metadata
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or(ConvertError::MissingName)
}

/// A key absent from the usage map counts as zero consumption; a present but
/// unparseable quantity is a conversion failure.
fn usage_quantity(
    usage: &std::collections::HashMap<String, String>,
    resource: &'static str,
    name: &str,
    parse: fn(&str) -> Option<i64>,
) -> Result<i64, ConvertError> {
    match usage.get(resource) {
        None => Ok(0),
        Some(value) => parse(value).ok_or_else(|| ConvertError::BadQuantity {
            name: name.to_string(),
            resource,
            value: value.clone(),
        }),
    }
}
