//! Metrics module for fees-service.
//! Provides Prometheus metrics for payment plan operations and per-tenant metering.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("fees_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Plan operations counter (per-tenant metering)
pub static PLAN_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Enrollment operations counter (per-tenant metering)
pub static ENROLLMENT_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Payments recorded counter (per-tenant metering)
pub static PAYMENTS_RECORDED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Payment amount counter (monetary tracking)
pub static PAYMENT_AMOUNT_TOTAL: OnceLock<prometheus::CounterVec> = OnceLock::new();

/// Reminder dispatch counter by outcome
pub static REMINDERS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Installments reclassified by the overdue sweep
pub static OVERDUE_SWEPT_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    PLAN_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "fees_plan_operations_total",
                "Total plan operations by tenant and operation type"
            ),
            &["tenant_id", "operation"]
        )
        .expect("Failed to register PLAN_OPERATIONS_TOTAL")
    });

    ENROLLMENT_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "fees_enrollment_operations_total",
                "Total enrollment operations by tenant and operation type"
            ),
            &["tenant_id", "operation"]
        )
        .expect("Failed to register ENROLLMENT_OPERATIONS_TOTAL")
    });

    PAYMENTS_RECORDED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "fees_payments_recorded_total",
                "Total payments recorded by tenant"
            ),
            &["tenant_id"]
        )
        .expect("Failed to register PAYMENTS_RECORDED_TOTAL")
    });

    PAYMENT_AMOUNT_TOTAL.get_or_init(|| {
        prometheus::register_counter_vec!(
            prometheus::opts!(
                "fees_payment_amount_total",
                "Total payment amount collected by tenant"
            ),
            &["tenant_id"]
        )
        .expect("Failed to register PAYMENT_AMOUNT_TOTAL")
    });

    REMINDERS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "fees_reminders_total",
                "Total reminder dispatches by tenant and outcome"
            ),
            &["tenant_id", "outcome"]
        )
        .expect("Failed to register REMINDERS_TOTAL")
    });

    OVERDUE_SWEPT_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "fees_overdue_swept_total",
                "Total installments reclassified as overdue by tenant"
            ),
            &["tenant_id"]
        )
        .expect("Failed to register OVERDUE_SWEPT_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("fees_errors_total", "Total errors by type for alerting"),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}

/// Record a plan operation.
pub fn record_plan_operation(tenant_id: &str, operation: &str) {
    if let Some(counter) = PLAN_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[tenant_id, operation]).inc();
    }
}

/// Record an enrollment operation.
pub fn record_enrollment_operation(tenant_id: &str, operation: &str) {
    if let Some(counter) = ENROLLMENT_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[tenant_id, operation]).inc();
    }
}

/// Record a payment and its amount.
pub fn record_payment(tenant_id: &str, amount: f64) {
    if let Some(counter) = PAYMENTS_RECORDED_TOTAL.get() {
        counter.with_label_values(&[tenant_id]).inc();
    }
    if let Some(counter) = PAYMENT_AMOUNT_TOTAL.get() {
        counter.with_label_values(&[tenant_id]).inc_by(amount.abs());
    }
}

/// Record a reminder dispatch.
pub fn record_reminder(tenant_id: &str, outcome: &str) {
    if let Some(counter) = REMINDERS_TOTAL.get() {
        counter.with_label_values(&[tenant_id, outcome]).inc();
    }
}

/// Record installments swept to overdue.
pub fn record_overdue_swept(tenant_id: &str, count: u64) {
    if let Some(counter) = OVERDUE_SWEPT_TOTAL.get() {
        counter.with_label_values(&[tenant_id]).inc_by(count);
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
