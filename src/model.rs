//! Core data model for the AI task bridge.
//!
//! A task is one invocation of a remote AI worker function. The server only
//! ever knows its id and whatever the worker last wrote under its result key;
//! all lifecycle state lives in the broker.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Task Kind
// ---------------------------------------------------------------------------

/// The closed set of task kinds the worker ecosystem understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Summarize,
    ExtractKeywords,
    NormalizeRequest,
}

impl TaskKind {
    /// Fully-qualified task name registered on the worker side.
    pub fn task_name(self) -> &'static str {
        match self {
            TaskKind::Summarize => "ai_worker.tasks.summarize",
            TaskKind::ExtractKeywords => "ai_worker.tasks.extract_keywords",
            TaskKind::NormalizeRequest => "ai_worker.tasks.normalize_request",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskKind::Summarize => "summarize",
            TaskKind::ExtractKeywords => "keywords",
            TaskKind::NormalizeRequest => "normalize",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for TaskKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "summarize" => Ok(TaskKind::Summarize),
            "keywords" | "extract_keywords" => Ok(TaskKind::ExtractKeywords),
            "normalize" | "normalize_request" => Ok(TaskKind::NormalizeRequest),
            other => Err(Error::InvalidInput(format!("unknown task kind: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Task Status
// ---------------------------------------------------------------------------

/// Status of a task as last reported by the worker.
///
/// `Pending` is synthesized when no result record exists. Status strings the
/// worker writes that fall outside the known set are kept verbatim in
/// `Other`; callers treat them as failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
    Retry,
    Revoked,
    Other(String),
}

impl TaskStatus {
    /// Terminal states: the worker will not write again.
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Failure | TaskStatus::Revoked
        )
    }

    /// States that represent a failed or abandoned invocation.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            TaskStatus::Failure | TaskStatus::Revoked | TaskStatus::Other(_)
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Started => "STARTED",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failure => "FAILURE",
            TaskStatus::Retry => "RETRY",
            TaskStatus::Revoked => "REVOKED",
            TaskStatus::Other(s) => s,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => TaskStatus::Pending,
            "STARTED" => TaskStatus::Started,
            "SUCCESS" => TaskStatus::Success,
            "FAILURE" => TaskStatus::Failure,
            "RETRY" => TaskStatus::Retry,
            "REVOKED" => TaskStatus::Revoked,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task Id
// ---------------------------------------------------------------------------

/// Correlation id for a task. Doubles as the suffix of its result key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Fresh random id in canonical hyphenated form (36 chars).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Task Input
// ---------------------------------------------------------------------------

/// Validated-on-demand input for one task kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskInput {
    Summarize {
        text: String,
        max_length: Option<i64>,
    },
    ExtractKeywords {
        text: String,
        max_keywords: Option<i64>,
    },
    NormalizeRequest {
        request: String,
        schema: Map<String, Value>,
    },
}

impl TaskInput {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskInput::Summarize { .. } => TaskKind::Summarize,
            TaskInput::ExtractKeywords { .. } => TaskKind::ExtractKeywords,
            TaskInput::NormalizeRequest { .. } => TaskKind::NormalizeRequest,
        }
    }

    /// Reject inputs the worker cannot act on.
    pub fn validate(&self) -> Result<()> {
        match self {
            TaskInput::Summarize { text, .. } | TaskInput::ExtractKeywords { text, .. } => {
                if text.is_empty() {
                    return Err(Error::InvalidInput("text is required".to_string()));
                }
            }
            TaskInput::NormalizeRequest { request, schema } => {
                if request.is_empty() {
                    return Err(Error::InvalidInput("request is required".to_string()));
                }
                if schema.is_empty() {
                    return Err(Error::InvalidInput("schema is required".to_string()));
                }
            }
        }
        Ok(())
    }

    /// Named arguments for the worker call.
    ///
    /// Non-positive limits are dropped so the worker applies its own default.
    pub fn kwargs(&self) -> Map<String, Value> {
        let mut kwargs = Map::new();
        match self {
            TaskInput::Summarize { text, max_length } => {
                kwargs.insert("text".to_string(), Value::from(text.as_str()));
                if let Some(n) = max_length.filter(|n| *n > 0) {
                    kwargs.insert("max_length".to_string(), Value::from(n));
                }
            }
            TaskInput::ExtractKeywords { text, max_keywords } => {
                kwargs.insert("text".to_string(), Value::from(text.as_str()));
                if let Some(n) = max_keywords.filter(|n| *n > 0) {
                    kwargs.insert("max_keywords".to_string(), Value::from(n));
                }
            }
            TaskInput::NormalizeRequest { request, schema } => {
                kwargs.insert("request".to_string(), Value::from(request.as_str()));
                kwargs.insert("schema".to_string(), Value::Object(schema.clone()));
            }
        }
        kwargs
    }

    /// Build an input from a kind and a loose JSON object (CLI entry point).
    pub fn from_params(kind: TaskKind, params: &Value) -> Result<Self> {
        let obj = params
            .as_object()
            .ok_or_else(|| Error::InvalidInput("params must be a JSON object".to_string()))?;
        let string = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let int = |key: &str| obj.get(key).and_then(Value::as_i64);

        Ok(match kind {
            TaskKind::Summarize => TaskInput::Summarize {
                text: string("text"),
                max_length: int("max_length"),
            },
            TaskKind::ExtractKeywords => TaskInput::ExtractKeywords {
                text: string("text"),
                max_keywords: int("max_keywords"),
            },
            TaskKind::NormalizeRequest => TaskInput::NormalizeRequest {
                request: string("request"),
                schema: match obj.get("schema") {
                    None | Some(Value::Null) => Map::new(),
                    Some(Value::Object(m)) => m.clone(),
                    Some(_) => {
                        return Err(Error::InvalidInput(
                            "schema must be a JSON object".to_string(),
                        ));
                    }
                },
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Task Result
// ---------------------------------------------------------------------------

/// Caller-facing view of a task's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl TaskResult {
    /// No result record yet.
    pub fn pending(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }
}
