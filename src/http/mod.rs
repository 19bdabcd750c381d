//! HTTP surface for the AI task bridge.
//!
//! [`router`] returns routes rooted at `/api/ai` so the host application can
//! merge them behind its own authentication and CORS layers. [`serve`] is the
//! standalone entry point used by the `kcenter` binary.

pub mod error;
pub mod handlers;

use crate::error::{Error, Result};
use crate::service::TaskService;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const API_PREFIX: &str = "/api/ai";

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<TaskService>,
}

impl ApiState {
    pub fn new(service: TaskService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn router(state: ApiState) -> Router {
    let routes = Router::new()
        .route("/summarize", post(handlers::handle_summarize))
        .route("/keywords", post(handlers::handle_keywords))
        .route("/normalize", post(handlers::handle_normalize))
        .route(
            "/tasks",
            get(handlers::handle_task_missing_id).delete(handlers::handle_task_missing_id),
        )
        .route(
            "/tasks/",
            get(handlers::handle_task_missing_id).delete(handlers::handle_task_missing_id),
        )
        .route(
            "/tasks/{id}",
            get(handlers::handle_task_get).delete(handlers::handle_task_delete),
        )
        .route("/health", get(handlers::handle_health))
        .method_not_allowed_fallback(handlers::handle_method_not_allowed)
        .fallback(handlers::handle_unknown_route)
        .with_state(state);

    Router::new().nest(API_PREFIX, routes)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: ApiState, addr: &str) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Other(format!("failed to bind {addr}: {e}")))?;
    tracing::info!(addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down API");
        })
        .await
        .map_err(|e| Error::Other(format!("server error: {e}")))
}
