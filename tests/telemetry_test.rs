//! Telemetry initialization and span helpers.

use kcenter_rs::model::{TaskId, TaskStatus};
use kcenter_rs::telemetry::task::{record_status, start_task_span};
use kcenter_rs::telemetry::{TelemetryConfig, init_telemetry};

#[test]
fn telemetry_initializes_without_endpoint() {
    // Only one global subscriber per process; a second init returns Err,
    // which is fine here.
    let guard = init_telemetry(TelemetryConfig {
        endpoint: None,
        service_name: "kcenter-test".to_string(),
        log_level: "debug".to_string(),
    });
    if let Ok(guard) = guard {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn task_span_records_status() {
    let span = start_task_span("fetch", &TaskId::generate());
    record_status(&span, &TaskStatus::Other("PROGRESS".to_string()));
    record_status(&span, &TaskStatus::Success);
}
