//! /api/ai handlers.

use super::ApiState;
use crate::error::{Error, Result};
use crate::model::{TaskId, TaskInput, TaskResult};
use axum::extract::rejection::JsonRejection;
use axum::Json;
use axum::extract::{OriginalUri, Path, State};
use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: String,
    pub max_length: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordsRequest {
    #[serde(default)]
    pub text: String,
    pub max_keywords: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    #[serde(default)]
    pub request: String,
    /// Must be a JSON object; arrays and scalars are rejected at parse time.
    #[serde(default)]
    pub schema: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: TaskId,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Decode a submit body. A disabled service answers 503 before the payload
/// is looked at.
fn body<T>(state: &ApiState, payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    state.service.ensure_enabled()?;
    payload
        .map(|Json(v)| v)
        .map_err(|e| Error::InvalidInput(e.body_text()))
}

/// Run the submission on its own task: once the broker write starts, a
/// client disconnect must not abort it.
async fn submit(
    state: ApiState,
    input: TaskInput,
    message: &str,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let service = state.service.clone();
    let task_id = tokio::spawn(async move { service.submit(input).await })
        .await
        .map_err(|e| Error::Other(format!("submit task aborted: {e}")))??;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            task_id,
            message: message.to_string(),
        }),
    ))
}

pub async fn handle_summarize(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let req = body(&state, payload)?;
    let input = TaskInput::Summarize {
        text: req.text,
        max_length: req.max_length,
    };
    submit(state, input, "summarization task submitted").await
}

pub async fn handle_keywords(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<KeywordsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let req = body(&state, payload)?;
    let input = TaskInput::ExtractKeywords {
        text: req.text,
        max_keywords: req.max_keywords,
    };
    submit(state, input, "keyword extraction task submitted").await
}

pub async fn handle_normalize(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<NormalizeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let req = body(&state, payload)?;
    let input = TaskInput::NormalizeRequest {
        request: req.request,
        schema: req.schema.unwrap_or_default(),
    };
    submit(state, input, "request normalization task submitted").await
}

// ---------------------------------------------------------------------------
// /tasks/{id}
// ---------------------------------------------------------------------------

fn task_id(raw: &str) -> Result<TaskId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidInput("task id is required".to_string()));
    }
    Ok(TaskId::from(raw))
}

pub async fn handle_task_get(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResult>> {
    let id = task_id(&id)?;
    Ok(Json(state.service.fetch(&id).await?))
}

pub async fn handle_task_delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = task_id(&id)?;
    state.service.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: format!("task {id} deleted"),
    }))
}

/// Missing id on the collection path.
pub async fn handle_task_missing_id() -> Error {
    Error::InvalidInput("task id is required".to_string())
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

pub async fn handle_unknown_route(OriginalUri(uri): OriginalUri) -> Error {
    Error::RouteNotFound(uri.path().to_string())
}

pub async fn handle_method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> Error {
    Error::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

// ---------------------------------------------------------------------------
// /health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub queue: String,
}

pub async fn handle_health(State(state): State<ApiState>) -> Result<Json<HealthResponse>> {
    let client = state.service.probe().await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        backend: client.backend_name().to_string(),
        queue: client.queue().to_string(),
    }))
}
