// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for dnscentral.
//!
//! All metrics carry the namespace prefix `dnscentral_`.
//!
//! # Metrics Categories
//!
//! - **Operation Metrics** - Count and time every public central operation
//! - **Resource Lifecycle Metrics** - Track resource creation, updates, and deletions
//! - **Error Metrics** - Track failed operations by error kind
//! - **Policy Metrics** - Track authorization denials per rule
//! - **Notification Metrics** - Track emitted and dispatched notifications
//!
//! # Example
//!
//! ```rust,no_run
//! use dnscentral::metrics::record_operation_success;
//!
//! record_operation_success("domain", "create", std::time::Duration::from_millis(12));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all dnscentral metrics
const METRICS_NAMESPACE: &str = "dnscentral";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Operation Metrics
// ============================================================================

/// Total number of central operations by resource type, operation and status
///
/// Labels:
/// - `resource_type`: Kind of resource (`domain`, `record`, `server`, `tsigkey`, `diagnostics`)
/// - `operation`: Operation name (`create`, `get`, `list`, `update`, `delete`, `sync_all`, ...)
/// - `status`: Outcome (`success`, `error`)
pub static OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_operations_total"),
        "Total number of central operations by resource type, operation and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "operation", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of central operations in seconds
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `operation`: Operation name
pub static OPERATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_operation_duration_seconds"),
        "Duration of central operations in seconds by resource type and operation",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type", "operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Resource Lifecycle Metrics
// ============================================================================

/// Total number of resources created
///
/// Labels:
/// - `resource_type`: Kind of resource created
pub static RESOURCES_CREATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_created_total"),
        "Total number of resources created by type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of resources updated
///
/// Labels:
/// - `resource_type`: Kind of resource updated
pub static RESOURCES_UPDATED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_updated_total"),
        "Total number of resources updated by type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of resources deleted
///
/// Labels:
/// - `resource_type`: Kind of resource deleted
pub static RESOURCES_DELETED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_deleted_total"),
        "Total number of resources deleted by type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by resource type and error kind
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `error_type`: Error kind (`not_found`, `forbidden`, `bad_request`, `backend_error`, ...)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and error kind",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Policy Metrics
// ============================================================================

/// Total number of policy denials
///
/// Labels:
/// - `rule`: Rule name that denied the request (e.g. `create_domain`)
pub static POLICY_DENIALS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_policy_denials_total"),
        "Total number of policy denials by rule",
    );
    let counter = CounterVec::new(opts, &["rule"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Notification Metrics
// ============================================================================

/// Total number of notifications emitted by the central service
///
/// Labels:
/// - `event_type`: Event type (e.g. `domain.create`)
pub static NOTIFICATIONS_EMITTED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_notifications_emitted_total"),
        "Total number of notifications emitted by event type",
    );
    let counter = CounterVec::new(opts, &["event_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of inbound notifications handed to handlers
///
/// Labels:
/// - `handler`: Canonical handler name
/// - `status`: Outcome (`success`, `error`)
pub static NOTIFICATIONS_DISPATCHED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_notifications_dispatched_total"),
        "Total number of notifications dispatched to handlers by handler and status",
    );
    let counter = CounterVec::new(opts, &["handler", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful operation
///
/// # Arguments
/// * `resource_type` - The kind of resource operated on (e.g., `domain`)
/// * `operation` - The operation name (e.g., `create`)
/// * `duration` - Duration of the operation
pub fn record_operation_success(resource_type: &str, operation: &str, duration: Duration) {
    OPERATIONS_TOTAL
        .with_label_values(&[resource_type, operation, "success"])
        .inc();
    OPERATION_DURATION_SECONDS
        .with_label_values(&[resource_type, operation])
        .observe(duration.as_secs_f64());
}

/// Record a failed operation
///
/// # Arguments
/// * `resource_type` - The kind of resource operated on
/// * `operation` - The operation name
/// * `error_type` - Error kind label, see [`crate::errors::CentralError::kind`]
/// * `duration` - Duration of the operation before failure
pub fn record_operation_error(
    resource_type: &str,
    operation: &str,
    error_type: &str,
    duration: Duration,
) {
    OPERATIONS_TOTAL
        .with_label_values(&[resource_type, operation, "error"])
        .inc();
    OPERATION_DURATION_SECONDS
        .with_label_values(&[resource_type, operation])
        .observe(duration.as_secs_f64());
    record_error(resource_type, error_type);
}

/// Record resource creation
pub fn record_resource_created(resource_type: &str) {
    RESOURCES_CREATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record resource update
pub fn record_resource_updated(resource_type: &str) {
    RESOURCES_UPDATED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record resource deletion
pub fn record_resource_deleted(resource_type: &str) {
    RESOURCES_DELETED_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}

/// Record an error
///
/// # Arguments
/// * `resource_type` - The kind of resource where error occurred
/// * `error_type` - Error kind (e.g., `not_found`, `backend_error`)
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Record a policy denial for `rule`
pub fn record_policy_denial(rule: &str) {
    POLICY_DENIALS_TOTAL.with_label_values(&[rule]).inc();
}

/// Record an emitted notification
pub fn record_notification_emitted(event_type: &str) {
    NOTIFICATIONS_EMITTED_TOTAL
        .with_label_values(&[event_type])
        .inc();
}

/// Record the outcome of handing one notification to one handler
///
/// # Arguments
/// * `handler` - Canonical handler name
/// * `success` - Whether the handler completed without error
pub fn record_notification_dispatched(handler: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    NOTIFICATIONS_DISPATCHED_TOTAL
        .with_label_values(&[handler, status])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
