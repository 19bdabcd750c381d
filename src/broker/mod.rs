//! Broker adapter: the key-value + list store shared with the worker.
//!
//! Four operations cover everything the bridge needs: push an envelope onto
//! a queue list, read a result key, delete a result key, and probe liveness.
//! Implementations must be safe to share across request handlers; pooling
//! and reconnects belong to the underlying client.

pub mod memory;
pub mod redis;

pub use memory::MemoryBroker;
pub use self::redis::RedisBroker;

use crate::error::Result;
use crate::model::TaskId;
use async_trait::async_trait;

/// Prefix the worker uses when storing task results.
pub const RESULT_KEY_PREFIX: &str = "celery-task-meta-";

/// Key holding the result record for `task_id`.
pub fn result_key(task_id: &TaskId) -> String {
    format!("{RESULT_KEY_PREFIX}{task_id}")
}

#[async_trait]
pub trait Broker: Send + Sync + std::fmt::Debug {
    /// Round-trip liveness check.
    async fn probe(&self) -> Result<()>;

    /// Prepend `payload` to the list named `queue`.
    async fn enqueue(&self, queue: &str, payload: Vec<u8>) -> Result<()>;

    /// Raw result record, or `None` if the worker has not written one.
    async fn read_result(&self, task_id: &TaskId) -> Result<Option<Vec<u8>>>;

    /// Remove the result record. Absent keys are not an error.
    async fn delete_result(&self, task_id: &TaskId) -> Result<()>;

    /// Short backend label for logs and health output.
    fn backend_name(&self) -> &'static str;
}
