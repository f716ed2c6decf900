//! Supabase client for auth validation and task storage.
//!
//! This module owns all communication with the hosted Supabase project:
//!
//! - JWT validation via the `/auth/v1/user` endpoint
//! - Task CRUD via the PostgREST `/rest/v1/tasks` endpoint
//!
//! Every task statement carries an explicit `user_id` equality filter in
//! addition to forwarding the caller's JWT, so a task can never be read or
//! written across users even if row-level security is misconfigured.
//!
//! # Architecture
//!
//! The [`SupabaseClient`] is shared across the application via `Arc` and
//! uses a pooled `reqwest` client with a 5 second timeout. The snake_case
//! database row format stays private to this module; rows convert into the
//! camelCase [`Task`] surface type on the way out.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{NewTask, Priority, Task, TaskFilter, TaskPatch};

/// Default timeout for Supabase API requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum length of an upstream error message kept for diagnostics.
const MAX_ERROR_BODY_LEN: usize = 512;

/// Errors that can occur when interacting with Supabase.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// The provided JWT is invalid or expired.
    #[error("unauthorized: invalid or expired JWT")]
    Unauthorized,

    /// The request to Supabase timed out.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Supabase is unreachable.
    #[error("supabase unavailable: {0}")]
    Unavailable(String),

    /// The response from Supabase could not be parsed.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Client configuration error.
    #[error("client configuration error: {0}")]
    Configuration(String),

    /// The targeted row does not exist (or belongs to another user).
    #[error("no matching task")]
    RowNotFound,

    /// Supabase returned an error status.
    #[error("upstream error: {status} - {message}")]
    Upstream {
        /// HTTP status code from Supabase.
        status: u16,
        /// Error message from Supabase, truncated.
        message: String,
    },
}

/// User information returned from Supabase JWT validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupabaseUser {
    /// The unique identifier for the user (UUID format).
    pub id: String,

    /// The user's email address, if available.
    pub email: Option<String>,
}

/// A task row in the snake_case database format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRow {
    id: String,
    user_id: String,
    title: String,
    #[serde(default)]
    description: String,
    due_date: String,
    #[serde(default)]
    due_time: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    reminder: Option<i64>,
    #[serde(default)]
    completed: bool,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            due_time: row.due_time,
            priority: row.priority,
            reminder: row.reminder,
            completed: row.completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Client for the Supabase auth and PostgREST endpoints.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    /// The underlying HTTP client.
    http_client: Client,

    /// The base URL of the Supabase project (e.g. `https://xxx.supabase.co`).
    base_url: String,

    /// The Supabase anonymous/public key for API authentication.
    anon_key: String,
}

impl SupabaseClient {
    /// Creates a new Supabase client.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::Configuration`] if the HTTP client cannot be
    /// created.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Result<Self, SupabaseError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let anon_key = anon_key.into();

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                SupabaseError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http_client,
            base_url,
            anon_key,
        })
    }

    /// Validates a Supabase JWT by calling `/auth/v1/user`.
    ///
    /// Letting Supabase validate the token keeps revocation handling on
    /// their side; no key material lives in this server.
    ///
    /// # Errors
    ///
    /// - [`SupabaseError::Unauthorized`] - the JWT is invalid or expired
    /// - [`SupabaseError::Timeout`] / [`SupabaseError::Unavailable`] -
    ///   Supabase could not be reached
    /// - [`SupabaseError::InvalidResponse`] - unexpected response format
    pub async fn validate_jwt(&self, jwt: &str) -> Result<SupabaseUser, SupabaseError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .request(self.http_client.get(&url), Some(jwt))
            .send()
            .await
            .map_err(map_transport_error)?;

        match response.status() {
            StatusCode::OK => {
                let user: SupabaseUser = response
                    .json()
                    .await
                    .map_err(|e| SupabaseError::InvalidResponse(e.to_string()))?;
                debug!(user_id = %user.id, "JWT validated");
                Ok(user)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SupabaseError::Unauthorized),
            status => Err(upstream_error(status, response).await),
        }
    }

    /// Lists a user's tasks ordered by due date ascending, optionally
    /// narrowed by a dashboard filter.
    ///
    /// # Errors
    ///
    /// Returns a [`SupabaseError`] when Supabase rejects or cannot service
    /// the query.
    pub async fn list_tasks(
        &self,
        jwt: Option<&str>,
        user_id: &str,
        filter: Option<TaskFilter>,
    ) -> Result<Vec<Task>, SupabaseError> {
        let user_filter = format!("eq.{user_id}");
        let mut request = self
            .request(self.http_client.get(self.tasks_url()), jwt)
            .query(&[
                ("select", "*"),
                ("user_id", user_filter.as_str()),
                ("order", "due_date.asc"),
            ]);

        if let Some(filter) = filter {
            let (column, clause) = filter_clause(filter, Utc::now().date_naive());
            request = request.query(&[(column, clause)]);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let rows: Vec<TaskRow> = decode_rows(response).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Inserts a task for a user, stamping creation and update timestamps.
    ///
    /// # Errors
    ///
    /// Returns a [`SupabaseError`] when the insert is rejected or the
    /// created row cannot be read back.
    pub async fn create_task(
        &self,
        jwt: Option<&str>,
        user_id: &str,
        task: &NewTask,
    ) -> Result<Task, SupabaseError> {
        let now = Utc::now();
        let body = json!({
            "user_id": user_id,
            "title": task.title,
            "description": task.description,
            "due_date": task.due_date,
            "due_time": task.due_time,
            "priority": task.priority,
            "reminder": task.reminder,
            "completed": task.completed,
            "created_at": now,
            "updated_at": now,
        });

        let response = self
            .request(self.http_client.post(self.tasks_url()), jwt)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let rows: Vec<TaskRow> = decode_rows(response).await?;
        rows.into_iter().next().map(Task::from).ok_or_else(|| {
            SupabaseError::InvalidResponse("insert returned no representation".to_string())
        })
    }

    /// Applies a patch to one of the user's tasks, stamping the update
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseError::RowNotFound`] when no row matches the id and
    /// user, or another [`SupabaseError`] for transport and upstream
    /// failures.
    pub async fn update_task(
        &self,
        jwt: Option<&str>,
        user_id: &str,
        task_id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, SupabaseError> {
        let response = self
            .request(self.http_client.patch(self.tasks_url()), jwt)
            .query(&[
                ("id", &format!("eq.{task_id}")),
                ("user_id", &format!("eq.{user_id}")),
            ])
            .header("Prefer", "return=representation")
            .json(&patch_payload(patch))
            .send()
            .await
            .map_err(map_transport_error)?;

        let rows: Vec<TaskRow> = decode_rows(response).await?;
        rows.into_iter()
            .next()
            .map(Task::from)
            .ok_or(SupabaseError::RowNotFound)
    }

    /// Deletes one of the user's tasks. Deleting a task that does not exist
    /// is not an error, matching SQL delete semantics.
    ///
    /// # Errors
    ///
    /// Returns a [`SupabaseError`] for transport and upstream failures.
    pub async fn delete_task(
        &self,
        jwt: Option<&str>,
        user_id: &str,
        task_id: &str,
    ) -> Result<(), SupabaseError> {
        let response = self
            .request(self.http_client.delete(self.tasks_url()), jwt)
            .query(&[
                ("id", &format!("eq.{task_id}")),
                ("user_id", &format!("eq.{user_id}")),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::UNAUTHORIZED {
            Err(SupabaseError::Unauthorized)
        } else {
            Err(upstream_error(status, response).await)
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/rest/v1/tasks", self.base_url)
    }

    /// Attaches the API key and bearer auth. PostgREST statements forward
    /// the user's JWT when present so row-level security applies; auth-less
    /// modes fall back to the anon key.
    fn request(&self, builder: RequestBuilder, jwt: Option<&str>) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(jwt.unwrap_or(&self.anon_key))
    }
}

/// Maps a PostgREST filter to its query clause.
fn filter_clause(filter: TaskFilter, today: NaiveDate) -> (&'static str, String) {
    match filter {
        TaskFilter::Today => ("due_date", format!("eq.{}", today.format("%Y-%m-%d"))),
        TaskFilter::Upcoming => ("due_date", format!("gt.{}", today.format("%Y-%m-%d"))),
        TaskFilter::Completed => ("completed", "eq.true".to_string()),
        TaskFilter::Priority => ("priority", "eq.high".to_string()),
    }
}

/// Builds the PostgREST update payload from a patch: only present fields are
/// written, an explicit `null` clears `due_time`/`reminder`, and the update
/// timestamp is always stamped.
fn patch_payload(patch: &TaskPatch) -> Map<String, Value> {
    let mut payload = Map::new();
    if let Some(title) = &patch.title {
        payload.insert("title".to_string(), json!(title));
    }
    if let Some(description) = &patch.description {
        payload.insert("description".to_string(), json!(description));
    }
    if let Some(due_date) = &patch.due_date {
        payload.insert("due_date".to_string(), json!(due_date));
    }
    if let Some(due_time) = &patch.due_time {
        payload.insert("due_time".to_string(), json!(due_time));
    }
    if let Some(priority) = patch.priority {
        payload.insert("priority".to_string(), json!(priority));
    }
    if let Some(reminder) = &patch.reminder {
        payload.insert("reminder".to_string(), json!(reminder));
    }
    if let Some(completed) = patch.completed {
        payload.insert("completed".to_string(), json!(completed));
    }
    payload.insert("updated_at".to_string(), json!(Utc::now()));
    payload
}

/// Decodes a row-set response, mapping auth and upstream failures.
async fn decode_rows(response: Response) -> Result<Vec<TaskRow>, SupabaseError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(SupabaseError::Unauthorized);
    }
    if !status.is_success() {
        return Err(upstream_error(status, response).await);
    }

    response
        .json()
        .await
        .map_err(|e| SupabaseError::InvalidResponse(e.to_string()))
}

/// Maps a transport-level failure onto the error taxonomy.
fn map_transport_error(err: reqwest::Error) -> SupabaseError {
    if err.is_timeout() {
        SupabaseError::Timeout(REQUEST_TIMEOUT)
    } else {
        SupabaseError::Unavailable(err.to_string())
    }
}

/// Builds an [`SupabaseError::Upstream`] from an error response, keeping a
/// truncated body for diagnostics.
async fn upstream_error(status: StatusCode, response: Response) -> SupabaseError {
    let mut message = response.text().await.unwrap_or_default();
    message.truncate(MAX_ERROR_BODY_LEN);
    warn!(status = status.as_u16(), %message, "supabase error response");
    SupabaseError::Upstream {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_clause_maps_dashboard_views() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(
            filter_clause(TaskFilter::Today, today),
            ("due_date", "eq.2025-06-15".to_string())
        );
        assert_eq!(
            filter_clause(TaskFilter::Upcoming, today),
            ("due_date", "gt.2025-06-15".to_string())
        );
        assert_eq!(
            filter_clause(TaskFilter::Completed, today),
            ("completed", "eq.true".to_string())
        );
        assert_eq!(
            filter_clause(TaskFilter::Priority, today),
            ("priority", "eq.high".to_string())
        );
    }

    #[test]
    fn patch_payload_writes_present_fields_only() {
        let patch = TaskPatch {
            id: Some("t1".to_string()),
            title: Some("Renamed".to_string()),
            completed: Some(true),
            ..TaskPatch::default()
        };
        let payload = patch_payload(&patch);

        assert_eq!(payload["title"], json!("Renamed"));
        assert_eq!(payload["completed"], json!(true));
        assert!(payload.contains_key("updated_at"));
        assert!(!payload.contains_key("due_date"));
        assert!(!payload.contains_key("reminder"));
        // The row id is targeted via the query string, never the body.
        assert!(!payload.contains_key("id"));
    }

    #[test]
    fn patch_payload_null_clears_reminder() {
        let patch = TaskPatch {
            id: Some("t1".to_string()),
            reminder: Some(None),
            due_time: Some(None),
            ..TaskPatch::default()
        };
        let payload = patch_payload(&patch);

        assert_eq!(payload["reminder"], Value::Null);
        assert_eq!(payload["due_time"], Value::Null);
    }

    #[test]
    fn task_row_converts_to_surface_type() {
        let row: TaskRow = serde_json::from_value(json!({
            "id": "t1",
            "user_id": "u1",
            "title": "Write report",
            "due_date": "2025-06-15",
            "due_time": "14:00",
            "priority": "high",
            "reminder": 60,
            "completed": false,
            "created_at": "2025-06-01T10:00:00Z",
            "updated_at": "2025-06-01T10:00:00Z"
        }))
        .unwrap();

        let task = Task::from(row);
        assert_eq!(task.id, "t1");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.reminder, Some(60));
        assert_eq!(task.due_time.as_deref(), Some("14:00"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = SupabaseClient::new("https://x.supabase.co/", "anon").unwrap();
        assert_eq!(client.tasks_url(), "https://x.supabase.co/rest/v1/tasks");
    }
}
