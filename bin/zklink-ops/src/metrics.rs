//! Prometheus metrics for zklink-ops.
//!
//! Task-level metrics are recorded here, transaction and bridge metrics are
//! emitted by the `task` crate under the same `zklink_ops_` prefix.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use std::time::Duration;

/// Handle for recording task metrics. Descriptions are registered on creation.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        describe_counter!(
            "zklink_ops_tasks_started_total",
            "Task invocations by task name"
        );
        describe_counter!(
            "zklink_ops_tasks_succeeded_total",
            "Completed task invocations by task name"
        );
        describe_counter!(
            "zklink_ops_tasks_failed_total",
            "Failed task invocations by task name and error kind"
        );
        describe_histogram!(
            "zklink_ops_task_duration_seconds",
            "Duration of a task invocation in seconds"
        );

        describe_counter!(
            "zklink_ops_transactions_submitted_total",
            "Primary transactions broadcast, by contract method"
        );
        describe_counter!(
            "zklink_ops_messages_proven_total",
            "L2→L1 messages proven on L1"
        );
        describe_counter!(
            "zklink_ops_messages_relayed_total",
            "L2→L1 messages finalized on L1"
        );
        describe_gauge!(
            "zklink_ops_bridge_status",
            "Last observed bridge status, 0 (SENT) to 4 (RELAYED)"
        );
    }

    pub fn record_task_started(&self, task: &'static str) {
        counter!("zklink_ops_tasks_started_total", "task" => task).increment(1);
    }

    pub fn record_task_succeeded(&self, task: &'static str, duration: Duration) {
        counter!("zklink_ops_tasks_succeeded_total", "task" => task).increment(1);
        histogram!("zklink_ops_task_duration_seconds", "task" => task)
            .record(duration.as_secs_f64());
    }

    pub fn record_task_failed(&self, task: &'static str, kind: &'static str, duration: Duration) {
        counter!("zklink_ops_tasks_failed_total", "task" => task, "kind" => kind).increment(1);
        histogram!("zklink_ops_task_duration_seconds", "task" => task)
            .record(duration.as_secs_f64());
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
