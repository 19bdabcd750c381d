//! Task service: validation and optional-dependency gating.
//!
//! The subsystem is either `Live` with a connected client or `Disabled`.
//! Every entry point matches on that once, so `NotConfigured` has a single
//! origin and a disabled service never touches I/O.

use crate::broker::Broker;
use crate::client::TaskClient;
use crate::config::{BrokerConfig, DEFAULT_QUEUE, DEFAULT_RESULT_TTL};
use crate::error::{Error, Result};
use crate::model::{TaskId, TaskInput, TaskResult, TaskStatus};
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub enum TaskService {
    Live(TaskClient),
    Disabled,
}

impl TaskService {
    /// Bootstrap from optional broker settings. Never fails: a missing
    /// address or a broker that does not answer the startup probe both
    /// yield `Disabled`.
    pub async fn connect(config: Option<&BrokerConfig>) -> Self {
        let Some(config) = config else {
            info!("no task broker configured; AI task endpoints disabled");
            return TaskService::Disabled;
        };

        match TaskClient::connect(config).await {
            Ok(client) => {
                info!(queue = %config.queue, "AI task service enabled");
                TaskService::Live(client)
            }
            Err(e) => {
                warn!(error = %e, addr = %config.addr, "task broker unavailable; AI task endpoints disabled");
                TaskService::Disabled
            }
        }
    }

    /// Live service over an already-constructed broker, using default queue
    /// settings.
    pub fn with_broker(broker: Arc<dyn Broker>) -> Self {
        TaskService::Live(TaskClient::new(broker, DEFAULT_QUEUE, DEFAULT_RESULT_TTL))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, TaskService::Live(_))
    }

    /// `NotConfigured` unless live.
    pub fn ensure_enabled(&self) -> Result<()> {
        self.client().map(|_| ())
    }

    fn client(&self) -> Result<&TaskClient> {
        match self {
            TaskService::Live(client) => Ok(client),
            TaskService::Disabled => Err(Error::NotConfigured),
        }
    }

    /// Validate and enqueue one task.
    pub async fn submit(&self, input: TaskInput) -> Result<TaskId> {
        let client = self.client()?;
        let kind = input.kind();
        let labels = |result: &'static str| {
            [
                KeyValue::new("task", kind.to_string()),
                KeyValue::new("result", result),
            ]
        };

        if let Err(e) = input.validate() {
            metrics::tasks_submitted().add(1, &labels("invalid"));
            return Err(e);
        }

        match client.submit(kind.task_name(), input.kwargs()).await {
            Ok(task_id) => {
                metrics::tasks_submitted().add(1, &labels("ok"));
                info!(task_id = %task_id, task = kind.task_name(), "AI task submitted");
                Ok(task_id)
            }
            Err(e) => {
                metrics::tasks_submitted().add(1, &labels("error"));
                Err(e)
            }
        }
    }

    pub async fn summarize(&self, text: String, max_length: Option<i64>) -> Result<TaskId> {
        self.submit(TaskInput::Summarize { text, max_length }).await
    }

    pub async fn extract_keywords(
        &self,
        text: String,
        max_keywords: Option<i64>,
    ) -> Result<TaskId> {
        self.submit(TaskInput::ExtractKeywords { text, max_keywords })
            .await
    }

    pub async fn normalize_request(
        &self,
        request: String,
        schema: Map<String, Value>,
    ) -> Result<TaskId> {
        self.submit(TaskInput::NormalizeRequest { request, schema })
            .await
    }

    pub async fn fetch(&self, task_id: &TaskId) -> Result<TaskResult> {
        let result = self.client()?.fetch(task_id).await?;
        metrics::tasks_polled().add(1, &[KeyValue::new("status", result.status.to_string())]);
        Ok(result)
    }

    pub async fn status(&self, task_id: &TaskId) -> Result<TaskStatus> {
        self.client()?.status(task_id).await
    }

    pub async fn delete(&self, task_id: &TaskId) -> Result<()> {
        self.client()?.delete(task_id).await?;
        info!(task_id = %task_id, "AI task result deleted");
        Ok(())
    }

    /// Probe the broker on behalf of a health check.
    pub async fn probe(&self) -> Result<&TaskClient> {
        let client = self.client()?;
        client.probe().await?;
        Ok(client)
    }
}
