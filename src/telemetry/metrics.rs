//! Metric instrument factories for kcenter-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! When no provider is installed these are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("kcenter-rs")
}

/// Counter: AI tasks submitted.
/// Labels: `task`, `result` ("ok" | "invalid" | "error").
pub fn tasks_submitted() -> Counter<u64> {
    meter()
        .u64_counter("kcenter.ai.tasks.submitted")
        .with_description("Number of AI tasks submitted to the worker queue")
        .build()
}

/// Counter: result polls, by observed status.
/// Labels: `status`.
pub fn tasks_polled() -> Counter<u64> {
    meter()
        .u64_counter("kcenter.ai.tasks.polled")
        .with_description("Number of AI task result polls")
        .build()
}

/// Counter: broker round-trips (probe, enqueue, read, delete).
/// Labels: `operation`, `result` ("ok" | "miss" | "error").
pub fn broker_operations() -> Counter<u64> {
    meter()
        .u64_counter("kcenter.ai.broker.operations")
        .with_description("Number of broker operations")
        .build()
}

/// Histogram: broker round-trip latency in milliseconds.
/// Labels: `operation`.
pub fn broker_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("kcenter.ai.broker.duration_ms")
        .with_description("Broker operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
