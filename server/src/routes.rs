//! HTTP route handlers for the TaskFlow server.
//!
//! This module provides the task API consumed by the dashboard:
//!
//! - `GET /tasks?filter=` - list the authenticated user's tasks
//! - `POST /tasks` - create a task
//! - `PATCH /tasks` - update a task (id in the body)
//! - `DELETE /tasks?id=` - delete a task
//! - `GET /health` - health check endpoint
//!
//! All task routes require a bearer token (see [`crate::auth`]) and scope
//! every statement to the authenticated user. Response envelopes follow the
//! dashboard contract: `{"tasks": [...]}`, `{"task": {...}}`, and
//! `{"success": true}`.
//!
//! # Example
//!
//! ```rust,no_run
//! use taskflow_server::routes::{create_router, AppState};
//! use taskflow_server::config::Config;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("failed to load config");
//!     let state = AppState::new(config).expect("failed to build state");
//!     let app = create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::auth::authenticate;
use crate::config::Config;
use crate::error::ServerError;
use crate::supabase::SupabaseClient;
use crate::types::{NewTask, Task, TaskFilter, TaskPatch};

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,

    /// Supabase client for auth validation and task storage.
    pub supabase: Arc<SupabaseClient>,

    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Creates application state from configuration, building the Supabase
    /// client.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] when the Supabase client cannot be created.
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let supabase = SupabaseClient::new(&config.supabase_url, &config.supabase_anon_key)?;
        Ok(Self {
            config: Arc::new(config),
            supabase: Arc::new(supabase),
            start_time: Instant::now(),
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("start_time", &self.start_time)
            .finish_non_exhaustive()
    }
}

/// Creates the application router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/tasks",
            get(get_tasks)
                .post(post_task)
                .patch(patch_task)
                .delete(delete_task),
        )
        .route("/health", get(get_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Request / Response Types
// ============================================================================

/// Query parameters for `GET /tasks`.
#[derive(Debug, Deserialize)]
struct ListParams {
    filter: Option<String>,
}

/// Query parameters for `DELETE /tasks`.
#[derive(Debug, Deserialize)]
struct DeleteParams {
    id: Option<String>,
}

/// Response envelope for task lists.
#[derive(Debug, Serialize)]
struct TasksResponse {
    tasks: Vec<Task>,
}

/// Response envelope for a single task.
#[derive(Debug, Serialize)]
struct TaskResponse {
    task: Task,
}

/// Response envelope for deletions.
#[derive(Debug, Serialize)]
struct SuccessResponse {
    success: bool,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tasks - lists the authenticated user's tasks, due date ascending.
///
/// The optional `filter` parameter narrows to the dashboard views
/// (`today`, `upcoming`, `completed`, `priority`); unknown values are
/// ignored.
async fn get_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<TasksResponse>, ServerError> {
    let session = authenticate(&state.config, &state.supabase, &headers).await?;
    let filter = params.filter.as_deref().and_then(TaskFilter::from_query);

    let tasks = state
        .supabase
        .list_tasks(session.forward_jwt.as_deref(), &session.user.id, filter)
        .await?;

    debug!(user = %session.user.id, count = tasks.len(), "listed tasks");
    Ok(Json(TasksResponse { tasks }))
}

/// POST /tasks - creates a task for the authenticated user.
async fn post_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new_task): Json<NewTask>,
) -> Result<Json<TaskResponse>, ServerError> {
    let session = authenticate(&state.config, &state.supabase, &headers).await?;
    new_task.validate().map_err(ServerError::Validation)?;

    let task = state
        .supabase
        .create_task(session.forward_jwt.as_deref(), &session.user.id, &new_task)
        .await?;

    info!(user = %session.user.id, task = %task.id, "task created");
    Ok(Json(TaskResponse { task }))
}

/// PATCH /tasks - updates a task. The task id travels in the body.
async fn patch_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<TaskResponse>, ServerError> {
    let session = authenticate(&state.config, &state.supabase, &headers).await?;

    let task_id = patch
        .id
        .clone()
        .ok_or_else(|| ServerError::Validation("Task ID is required".to_string()))?;
    patch.validate().map_err(ServerError::Validation)?;

    let task = state
        .supabase
        .update_task(
            session.forward_jwt.as_deref(),
            &session.user.id,
            &task_id,
            &patch,
        )
        .await?;

    info!(user = %session.user.id, task = %task.id, "task updated");
    Ok(Json(TaskResponse { task }))
}

/// DELETE /tasks?id= - deletes a task by id.
async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DeleteParams>,
) -> Result<Json<SuccessResponse>, ServerError> {
    let session = authenticate(&state.config, &state.supabase, &headers).await?;

    let task_id = params
        .id
        .ok_or_else(|| ServerError::Validation("Task ID is required".to_string()))?;

    state
        .supabase
        .delete_task(session.forward_jwt.as_deref(), &session.user.id, &task_id)
        .await?;

    info!(user = %session.user.id, task = %task_id, "task deleted");
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /health - liveness probe with uptime.
async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
