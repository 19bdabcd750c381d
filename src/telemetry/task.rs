//! Span helpers for AI task operations.

use crate::model::{TaskId, TaskStatus};
use tracing::Span;

/// Start a span for one client operation on a task.
///
/// `ai.task.status` is declared empty; fill it with [`record_status`].
pub fn start_task_span(operation: &str, task_id: &TaskId) -> Span {
    tracing::info_span!(
        "ai.task",
        "ai.operation" = operation,
        "ai.task.id" = %task_id,
        "ai.task.status" = tracing::field::Empty,
    )
}

/// Record the observed status on a span from [`start_task_span`].
pub fn record_status(span: &Span, status: &TaskStatus) {
    span.record("ai.task.status", status.as_str());
}
