//! In-process broker with the same key layout as Redis.
//!
//! Lists and keys live in `DashMap`s. Lets the service run embedded and backs
//! the test suite; `set_reachable(false)` simulates an outage.

use super::{Broker, result_key};
use crate::error::{Error, Result};
use crate::model::TaskId;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug)]
struct Inner {
    lists: DashMap<String, VecDeque<Vec<u8>>>,
    keys: DashMap<String, Vec<u8>>,
    reachable: AtomicBool,
    calls: AtomicU64,
}

/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    inner: Arc<Inner>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                lists: DashMap::new(),
                keys: DashMap::new(),
                reachable: AtomicBool::new(true),
                calls: AtomicU64::new(0),
            }),
        }
    }

    /// Toggle simulated outages. While unreachable every call fails.
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of trait calls made so far, including failed ones.
    pub fn call_count(&self) -> u64 {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn queue_len(&self, queue: &str) -> usize {
        self.inner.lists.get(queue).map(|l| l.len()).unwrap_or(0)
    }

    /// Queue contents, head first (most recently pushed at index 0).
    pub fn queue_items(&self, queue: &str) -> Vec<Vec<u8>> {
        self.inner
            .lists
            .get(queue)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Write a raw value under an arbitrary key, as a worker would.
    pub fn set_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.inner.keys.insert(key.into(), value.into());
    }

    /// Write a result record for `task_id`.
    pub fn put_result(&self, task_id: &TaskId, value: impl Into<Vec<u8>>) {
        self.set_raw(result_key(task_id), value);
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.inner.keys.contains_key(key)
    }

    fn check(&self) -> Result<()> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::unreachable("memory broker marked unreachable"))
        }
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn probe(&self) -> Result<()> {
        self.check()
    }

    async fn enqueue(&self, queue: &str, payload: Vec<u8>) -> Result<()> {
        self.check()?;
        self.inner
            .lists
            .entry(queue.to_string())
            .or_default()
            .push_front(payload);
        Ok(())
    }

    async fn read_result(&self, task_id: &TaskId) -> Result<Option<Vec<u8>>> {
        self.check()?;
        Ok(self
            .inner
            .keys
            .get(&result_key(task_id))
            .map(|v| v.value().clone()))
    }

    async fn delete_result(&self, task_id: &TaskId) -> Result<()> {
        self.check()?;
        self.inner.keys.remove(&result_key(task_id));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
