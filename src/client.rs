//! Task client: one task's lifecycle against the broker.
//!
//! Stateless between calls. Everything about a task after submission lives
//! under its result key, written by the worker.

use crate::broker::{Broker, RedisBroker};
use crate::codec::{self, ResultEnvelope};
use crate::config::BrokerConfig;
use crate::error::{Error, Result};
use crate::model::{TaskId, TaskResult, TaskStatus};
use crate::telemetry::task::{record_status, start_task_span};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, warn};

/// Reported in place of a result record that does not decode.
pub const MALFORMED_RESULT_ERROR: &str = "malformed result envelope";

#[derive(Debug, Clone)]
pub struct TaskClient {
    broker: Arc<dyn Broker>,
    queue: String,
    result_ttl: Duration,
}

impl TaskClient {
    pub fn new(broker: Arc<dyn Broker>, queue: impl Into<String>, result_ttl: Duration) -> Self {
        Self {
            broker,
            queue: queue.into(),
            result_ttl,
        }
    }

    /// Connect to Redis with `config` and probe it.
    pub async fn connect(config: &BrokerConfig) -> Result<Self> {
        let broker = RedisBroker::connect(config).await?;
        Ok(Self::new(
            Arc::new(broker),
            config.queue.clone(),
            config.result_ttl,
        ))
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Advisory retention for result records. Expiry is enforced by the
    /// worker, not here.
    pub fn result_ttl(&self) -> Duration {
        self.result_ttl
    }

    pub fn backend_name(&self) -> &'static str {
        self.broker.backend_name()
    }

    pub async fn probe(&self) -> Result<()> {
        self.broker.probe().await
    }

    /// Enqueue a call to `task_name`. The returned id is valid for polling
    /// as soon as this returns, before any worker has seen the message.
    pub async fn submit(&self, task_name: &str, kwargs: Map<String, Value>) -> Result<TaskId> {
        let task_id = TaskId::generate();
        let span = start_task_span("submit", &task_id);

        async {
            let payload = codec::encode_submit(task_name, kwargs, &task_id, &self.queue)?;
            self.broker.enqueue(&self.queue, payload).await?;
            debug!(task = task_name, queue = %self.queue, "task enqueued");
            Ok::<_, Error>(task_id.clone())
        }
        .instrument(span)
        .await
    }

    /// Current view of a task.
    ///
    /// A missing record is `PENDING`. A record that fails to decode is
    /// reported as a `FAILURE` rather than an error.
    pub async fn fetch(&self, task_id: &TaskId) -> Result<TaskResult> {
        let span = start_task_span("fetch", task_id);

        let result = async {
            let Some(bytes) = self.broker.read_result(task_id).await? else {
                return Ok::<_, Error>(TaskResult::pending(task_id.clone()));
            };
            Ok(match codec::decode_result(&bytes) {
                Ok(envelope) => normalize(task_id.clone(), envelope),
                Err(e) => {
                    warn!(error = %e, "undecodable result record");
                    TaskResult {
                        status: TaskStatus::Failure,
                        error: Some(MALFORMED_RESULT_ERROR.to_string()),
                        ..TaskResult::pending(task_id.clone())
                    }
                }
            })
        }
        .instrument(span.clone())
        .await?;

        record_status(&span, &result.status);
        Ok(result)
    }

    pub async fn status(&self, task_id: &TaskId) -> Result<TaskStatus> {
        Ok(self.fetch(task_id).await?.status)
    }

    /// Forget a task's result. Idempotent.
    pub async fn delete(&self, task_id: &TaskId) -> Result<()> {
        self.broker
            .delete_result(task_id)
            .instrument(start_task_span("delete", task_id))
            .await
    }
}

/// Map a worker record onto the caller-facing shape.
fn normalize(task_id: TaskId, envelope: ResultEnvelope) -> TaskResult {
    let ResultEnvelope {
        status,
        result,
        traceback,
        date_done,
    } = envelope;

    let (result, error) = match status {
        TaskStatus::Success => (result, None),
        TaskStatus::Failure => (None, traceback),
        _ => (None, None),
    };

    TaskResult {
        task_id,
        status,
        result,
        error,
        started_at: None,
        completed_at: date_done,
    }
}
