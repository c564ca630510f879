//! HTTP command API.
//!
//! Thin front end over the orchestrator: submit a command, poll a task,
//! request a global stop. Handlers never block on plugin execution; the
//! submit path schedules `handle_command` in the background and returns
//! the task id immediately.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use synapse_core::{CoreError, PluginDescriptor, TaskId, TaskRecord, TaskStatus};

use crate::orchestrator::Orchestrator;
use crate::registry::PluginRegistry;

/// Shared state for the HTTP handlers.
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub registry: Arc<PluginRegistry>,
}

/// Request body for command submission.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    /// Full command text.
    pub text: String,
}

/// Response body for command submission.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// Id of the created task; poll `/api/task/{id}` for the outcome.
    pub task_id: String,
}

/// Response body for a task status query.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskRecord> for TaskResponse {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id.into_inner(),
            status: record.status,
            plugin_id: record.plugin_id.map(|id| id.into_inner()),
            result: record.result_message,
            error: record.error_message,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response body for a stop request.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub message: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create the HTTP router for the hub.
pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/command", post(submit_command))
        .route("/api/task/:id", get(get_task))
        .route("/api/stop", post(stop))
        .route("/api/plugins", get(list_plugins))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Submit a command. Fast: creates the task record and schedules
/// execution in the background.
async fn submit_command(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<CommandRequest>,
) -> impl IntoResponse {
    if req.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Empty command text".to_string(),
            }),
        )
            .into_response();
    }

    match state.orchestrator.create_task(&req.text).await {
        Ok(task_id) => {
            state.orchestrator.clone().spawn_handle(task_id.clone());
            (
                StatusCode::ACCEPTED,
                Json(CommandResponse {
                    task_id: task_id.into_inner(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to create task");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Task status query.
async fn get_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let task_id = TaskId::new(id);
    match state.orchestrator.task_status(&task_id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(TaskResponse::from(record))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: CoreError::TaskNotFound(task_id.into_inner()).to_string(),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Global cooperative stop.
async fn stop(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let message = state.orchestrator.abort_active_task();
    Json(StopResponse { message })
}

/// Loaded plugin descriptors, for diagnostics.
async fn list_plugins(State(state): State<Arc<ApiState>>) -> Json<Vec<PluginDescriptor>> {
    Json(state.registry.descriptors().to_vec())
}
