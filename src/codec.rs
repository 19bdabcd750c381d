//! Wire format shared with the worker ecosystem.
//!
//! Submissions are a protocol-2 style task message: an inner [`TaskEnvelope`]
//! serialized to a JSON string and carried in the `body` of an outer
//! [`QueueMessage`]. Results are read back as a [`ResultEnvelope`].
//!
//! Field names and nesting are an interoperability contract; every shape is
//! a typed struct so submit and inspect paths cannot drift apart.

use crate::error::{Error, Result};
use crate::model::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const CONTENT_ENCODING: &str = "utf-8";
pub const CONTENT_TYPE: &str = "application/json";
/// Declared but not applied: the body is plain JSON text.
pub const BODY_ENCODING: &str = "base64";
pub const DELIVERY_MODE_PERSISTENT: u8 = 2;
pub const TASK_LANG: &str = "py";

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Header block, carried both inside the body and on the outer message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHeaders {
    pub lang: String,
    pub task: String,
    pub id: String,
    pub root_id: String,
    pub parent_id: Option<String>,
    pub group: Option<String>,
}

/// The task call itself; serialized into [`QueueMessage::body`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub id: String,
    pub task: String,
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
    pub retries: u32,
    pub utctime: String,
    pub headers: TaskHeaders,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub exchange: String,
    pub routing_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageProperties {
    pub correlation_id: String,
    pub reply_to: String,
    pub delivery_mode: u8,
    pub delivery_info: DeliveryInfo,
    pub priority: u8,
    pub body_encoding: String,
    pub delivery_tag: String,
}

/// The list element pushed onto the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub body: String,
    #[serde(rename = "content-encoding")]
    pub content_encoding: String,
    #[serde(rename = "content-type")]
    pub content_type: String,
    pub headers: TaskHeaders,
    pub properties: MessageProperties,
}

impl QueueMessage {
    /// Parse the inner envelope back out of `body`.
    pub fn envelope(&self) -> Result<TaskEnvelope> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Encode one task call into the bytes written to the queue list.
///
/// `reply_to` and `delivery_tag` get fresh ids on every call; the task id is
/// reused for the envelope id, both header blocks and `correlation_id`.
pub fn encode_submit(
    task_name: &str,
    kwargs: Map<String, Value>,
    task_id: &TaskId,
    queue: &str,
) -> Result<Vec<u8>> {
    let headers = TaskHeaders {
        lang: TASK_LANG.to_string(),
        task: task_name.to_string(),
        id: task_id.to_string(),
        root_id: task_id.to_string(),
        parent_id: None,
        group: None,
    };

    let envelope = TaskEnvelope {
        id: task_id.to_string(),
        task: task_name.to_string(),
        args: Vec::new(),
        kwargs,
        retries: 0,
        utctime: chrono::Utc::now().to_rfc3339(),
        headers: headers.clone(),
    };

    let message = QueueMessage {
        body: serde_json::to_string(&envelope)?,
        content_encoding: CONTENT_ENCODING.to_string(),
        content_type: CONTENT_TYPE.to_string(),
        headers,
        properties: MessageProperties {
            correlation_id: task_id.to_string(),
            reply_to: Uuid::new_v4().to_string(),
            delivery_mode: DELIVERY_MODE_PERSISTENT,
            delivery_info: DeliveryInfo {
                exchange: String::new(),
                routing_key: queue.to_string(),
            },
            priority: 0,
            body_encoding: BODY_ENCODING.to_string(),
            delivery_tag: Uuid::new_v4().to_string(),
        },
    };

    Ok(serde_json::to_vec(&message)?)
}

/// Parse a queue list element. Used by tests and operator tooling.
pub fn decode_submit(bytes: &[u8]) -> Result<QueueMessage> {
    Ok(serde_json::from_slice(bytes)?)
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What the worker writes under the result key. `children` is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultEnvelope {
    pub status: TaskStatus,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub traceback: Option<String>,
    #[serde(default)]
    pub date_done: Option<String>,
}

/// Decode a result record.
///
/// Anything that is not a JSON object with a string `status` is
/// [`Error::MalformedResult`]; unknown status strings pass through.
pub fn decode_result(bytes: &[u8]) -> Result<ResultEnvelope> {
    serde_json::from_slice(bytes).map_err(|e| Error::MalformedResult(e.to_string()))
}
