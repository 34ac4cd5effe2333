//! Table assembly and printing. The collector hands over typed records;
//! everything about presentation (column order, borders, the timestamp
//! banner) lives here.

use chrono::Local;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::format::{format_cpu, format_memory};
use crate::types::{FailingPodIndex, NodeMetricRecord, PodMetricRecord};

pub const NODE_HEADERS: [&str; 7] = [
    "Node", "CPU Usage", "CPU %", "Mem Usage", "Mem %", "Pod Count", "Status",
];

pub const POD_HEADERS: [&str; 10] = [
    "Pod",
    "Node",
    "CPU Usage",
    "CPU %",
    "Mem Usage",
    "Mem %",
    "Status",
    "Uptime",
    "Restarts",
    "Last Restart",
];

pub const FAILING_HEADERS: [&str; 2] = ["Pod", "Status"];

pub fn node_rows(records: &[NodeMetricRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                format_cpu(r.cpu_usage_millicores),
                r.cpu_percent.to_string(),
                format_memory(r.memory_usage_bytes),
                r.memory_percent.to_string(),
                r.pod_count.to_string(),
                r.readiness.to_string(),
            ]
        })
        .collect()
}

pub fn pod_rows(records: &[PodMetricRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.node_name.clone(),
                format_cpu(r.cpu_usage_millicores),
                percent_cell(r.cpu_percent),
                format_memory(r.memory_usage_bytes),
                percent_cell(r.memory_percent),
                r.phase.to_string(),
                r.up_time.clone(),
                r.restart_count.to_string(),
                r.last_restart_ago.clone(),
            ]
        })
        .collect()
}

pub fn failing_rows(index: &FailingPodIndex) -> Vec<Vec<String>> {
    index
        .iter()
        .map(|(pod, phase)| vec![pod.clone(), phase.to_string()])
        .collect()
}

/// An undefined percentage renders as a dash, never as zero.
fn percent_cell(percent: Option<i64>) -> String {
    match percent {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

/// One bordered table under a timestamp banner.
pub fn render_table(title: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(row.iter().map(String::as_str));
    }
    let table = builder.build().with(Style::rounded()).to_string();
    format!("{} at: {}\n{}\n", title, Local::now(), table)
}

pub fn print_node_stats(records: &[NodeMetricRecord]) {
    println!(
        "{}",
        render_table("Kubernetes Node Stats", &NODE_HEADERS, &node_rows(records))
    );
}

pub fn print_pod_stats(records: &[PodMetricRecord]) {
    println!(
        "{}",
        render_table("Kubernetes Pod Stats", &POD_HEADERS, &pod_rows(records))
    );
}

pub fn print_failing_pods(index: &FailingPodIndex) {
    println!(
        "{}",
        render_table("Failing Pod Stats", &FAILING_HEADERS, &failing_rows(index))
    );
}
