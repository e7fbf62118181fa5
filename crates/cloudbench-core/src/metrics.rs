//! Central metrics registry and metric definitions
//!
//! Prometheus metrics for cleanup runs and timed benchmark actions.
//! Metrics are registered lazily on first access using once_cell::Lazy.

use once_cell::sync::Lazy;
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

// ===== Cleanup Metrics =====

/// Resources that reached a terminal cleanup state, by outcome
/// (`deleted`, `failed_delete`, `failed_timeout`, `skipped`)
pub static CLEANUP_RESOURCES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cloudbench_cleanup_resources_total",
        "Total number of resources processed by cleanup",
        &["service", "resource", "outcome"]
    )
    .expect("Failed to register cleanup resources counter")
});

/// Delete calls issued, including retries
pub static CLEANUP_DELETE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cloudbench_cleanup_delete_attempts_total",
        "Total number of delete calls issued by cleanup",
        &["service", "resource"]
    )
    .expect("Failed to register cleanup delete attempts counter")
});

/// Listing calls that failed for one resource type and scope
pub static CLEANUP_LIST_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cloudbench_cleanup_list_failures_total",
        "Total number of failed resource listings",
        &["service", "resource"]
    )
    .expect("Failed to register cleanup list failures counter")
});

/// Wall-clock time spent cleaning up one resource type
pub static CLEANUP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "cloudbench_cleanup_duration_seconds",
        "Cleanup duration per resource type in seconds",
        &["service", "resource"],
        // Buckets: 100ms .. 10min
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]
    )
    .expect("Failed to register cleanup duration histogram")
});

// ===== Atomic Action Metrics =====

/// Duration of named benchmark sub-actions
pub static ATOMIC_ACTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "cloudbench_atomic_action_duration_seconds",
        "Atomic action duration in seconds",
        &["action"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 60.0]
    )
    .expect("Failed to register atomic action duration histogram")
});
