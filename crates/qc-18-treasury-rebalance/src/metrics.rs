//! # Rebalance Metrics
//!
//! Prometheus metrics for monitoring the rebalance coordinator.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-treasury-rebalance = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `rebalance_operations_committed_total` - Counter of committed operations (by operation)
//! - `rebalance_operations_rejected_total` - Counter of rejected operations (by category)
//! - `rebalance_approvals_total` - Counter of recorded approvals
//! - `rebalance_phase` - Gauge of the current phase (0=Registration .. 3=Finalized)

use crate::domain::Phase;
use crate::error::ErrorCategory;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Committed operations, labeled by operation name
    pub static ref OPERATIONS_COMMITTED: IntCounterVec = register_int_counter_vec!(
        "rebalance_operations_committed_total",
        "Total number of committed rebalance operations",
        &["operation"]
    )
    .expect("Failed to create OPERATIONS_COMMITTED metric");

    /// Rejected operations, labeled by error category
    pub static ref OPERATIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "rebalance_operations_rejected_total",
        "Total number of rejected rebalance operations",
        &["category"]
    )
    .expect("Failed to create OPERATIONS_REJECTED metric");

    /// Approvals recorded across all senders
    pub static ref APPROVALS: IntCounter = register_int_counter!(
        "rebalance_approvals_total",
        "Total number of approvals recorded"
    )
    .expect("Failed to create APPROVALS metric");

    /// Current phase (0=Registration, 1=Registered, 2=Approved, 3=Finalized)
    pub static ref PHASE: IntGauge = register_int_gauge!(
        "rebalance_phase",
        "Current rebalance phase (0=Registration, 1=Registered, 2=Approved, 3=Finalized)"
    )
    .expect("Failed to create PHASE metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record a committed operation
#[cfg(feature = "metrics")]
pub fn record_commit(operation: &str) {
    OPERATIONS_COMMITTED.with_label_values(&[operation]).inc();
}

/// Record a rejected operation by category
#[cfg(feature = "metrics")]
pub fn record_rejection(category: ErrorCategory) {
    OPERATIONS_REJECTED
        .with_label_values(&[category.as_str()])
        .inc();
}

#[cfg(feature = "metrics")]
pub fn record_approval() {
    APPROVALS.inc();
}

/// Update the phase gauge
#[cfg(feature = "metrics")]
pub fn set_phase(phase: Phase) {
    PHASE.set(i64::from(phase.as_u8()));
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_commit(_operation: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejection(_category: ErrorCategory) {}

#[cfg(not(feature = "metrics"))]
pub fn record_approval() {}

#[cfg(not(feature = "metrics"))]
pub fn set_phase(_phase: Phase) {}
