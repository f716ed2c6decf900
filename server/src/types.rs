//! Task types for the TaskFlow server.
//!
//! This module defines the task record exposed by the HTTP API and the
//! request payloads for creating and updating tasks. All types serialize to
//! camelCase JSON on the API surface; the snake_case database row format is
//! private to the [`supabase`](crate::supabase) module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// A task record as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: String,

    /// Owning user.
    pub user_id: String,

    /// Task title.
    pub title: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Calendar date the task is due (`YYYY-MM-DD`).
    pub due_date: String,

    /// Optional time of day the task is due (`HH:MM` or `HH:MM:SS`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,

    /// Priority level.
    #[serde(default)]
    pub priority: Priority,

    /// Reminder lead time in minutes before the due moment, or `null` for
    /// no reminder.
    #[serde(default)]
    pub reminder: Option<i64>,

    /// Whether the task is completed.
    #[serde(default)]
    pub completed: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    /// Task title. Must not be empty.
    pub title: String,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Calendar date the task is due (`YYYY-MM-DD`).
    pub due_date: String,

    /// Optional time of day the task is due.
    #[serde(default)]
    pub due_time: Option<String>,

    /// Priority level.
    #[serde(default)]
    pub priority: Priority,

    /// Reminder lead time in minutes, or `null` for no reminder.
    #[serde(default)]
    pub reminder: Option<i64>,

    /// Whether the task starts out completed.
    #[serde(default)]
    pub completed: bool,
}

impl NewTask {
    /// Validates the payload, returning a client-facing message on failure.
    ///
    /// # Errors
    ///
    /// Returns a description of the first failed check: empty title, a due
    /// date that is not `YYYY-MM-DD`, an unparseable due time, or a negative
    /// reminder.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        validate_due_date(&self.due_date)?;
        if let Some(due_time) = &self.due_time {
            validate_due_time(due_time)?;
        }
        validate_reminder(self.reminder)?;
        Ok(())
    }
}

/// Payload for updating a task.
///
/// Absent fields are left unchanged. For `due_time` and `reminder` an
/// explicit `null` clears the value, while omitting the field keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// Task to update. Required.
    #[serde(default)]
    pub id: Option<String>,

    /// New title.
    #[serde(default)]
    pub title: Option<String>,

    /// New description.
    #[serde(default)]
    pub description: Option<String>,

    /// New due date.
    #[serde(default)]
    pub due_date: Option<String>,

    /// New due time; `Some(None)` clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<Option<String>>,

    /// New priority.
    #[serde(default)]
    pub priority: Option<Priority>,

    /// New reminder lead; `Some(None)` clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<Option<i64>>,

    /// New completion state.
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Validates the patch, returning a client-facing message on failure.
    ///
    /// # Errors
    ///
    /// Returns a description of the first failed check. The presence of `id`
    /// is checked separately by the route handler so it can map to the
    /// original "Task ID is required" response.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("title must not be empty".to_string());
            }
        }
        if let Some(due_date) = &self.due_date {
            validate_due_date(due_date)?;
        }
        if let Some(Some(due_time)) = &self.due_time {
            validate_due_time(due_time)?;
        }
        if let Some(reminder) = self.reminder {
            validate_reminder(reminder)?;
        }
        Ok(())
    }
}

/// Server-side list filters, mirroring the dashboard's task views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    /// Tasks due today.
    Today,
    /// Tasks due after today.
    Upcoming,
    /// Completed tasks.
    Completed,
    /// High-priority tasks.
    Priority,
}

impl TaskFilter {
    /// Parses a `filter` query parameter. Unknown values select no filter,
    /// matching the permissive behavior of the dashboard API.
    #[must_use]
    pub fn from_query(raw: &str) -> Option<Self> {
        match raw {
            "today" => Some(Self::Today),
            "upcoming" => Some(Self::Upcoming),
            "completed" => Some(Self::Completed),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

fn validate_due_date(due_date: &str) -> Result<(), String> {
    chrono::NaiveDate::parse_from_str(due_date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("dueDate '{due_date}' is not a YYYY-MM-DD date"))
}

fn validate_due_time(due_time: &str) -> Result<(), String> {
    chrono::NaiveTime::parse_from_str(due_time, "%H:%M:%S")
        .or_else(|_| chrono::NaiveTime::parse_from_str(due_time, "%H:%M"))
        .map(|_| ())
        .map_err(|_| format!("dueTime '{due_time}' is not a HH:MM[:SS] time"))
}

fn validate_reminder(reminder: Option<i64>) -> Result<(), String> {
    match reminder {
        Some(minutes) if minutes < 0 => {
            Err("reminder must be a non-negative number of minutes".to_string())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task() -> NewTask {
        NewTask {
            title: "Write report".to_string(),
            description: String::new(),
            due_date: "2025-06-15".to_string(),
            due_time: Some("14:00".to_string()),
            priority: Priority::High,
            reminder: Some(60),
            completed: false,
        }
    }

    #[test]
    fn task_serializes_camel_case() {
        let task = Task {
            id: "t1".to_string(),
            user_id: "u1".to_string(),
            title: "Write report".to_string(),
            description: String::new(),
            due_date: "2025-06-15".to_string(),
            due_time: None,
            priority: Priority::Medium,
            reminder: None,
            completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(task).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["dueDate"], "2025-06-15");
        assert_eq!(json["priority"], "medium");
        assert!(json.get("dueTime").is_none());
    }

    #[test]
    fn valid_new_task_passes() {
        assert!(new_task().validate().is_ok());
    }

    #[test]
    fn empty_title_rejected() {
        let mut task = new_task();
        task.title = "   ".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn bad_due_date_rejected() {
        let mut task = new_task();
        task.due_date = "June 15th".to_string();
        assert!(task.validate().is_err());
    }

    #[test]
    fn bad_due_time_rejected() {
        let mut task = new_task();
        task.due_time = Some("25:99".to_string());
        assert!(task.validate().is_err());
    }

    #[test]
    fn negative_reminder_rejected() {
        let mut task = new_task();
        task.reminder = Some(-10);
        assert!(task.validate().is_err());
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: TaskPatch = serde_json::from_str(r#"{"id": "t1", "reminder": null}"#).unwrap();
        assert_eq!(patch.reminder, Some(None));
        assert_eq!(patch.due_time, None);

        let patch: TaskPatch =
            serde_json::from_str(r#"{"id": "t1", "reminder": 30, "dueTime": "09:00"}"#).unwrap();
        assert_eq!(patch.reminder, Some(Some(30)));
        assert_eq!(patch.due_time, Some(Some("09:00".to_string())));
    }

    #[test]
    fn patch_validation_checks_present_fields_only() {
        let patch = TaskPatch {
            id: Some("t1".to_string()),
            completed: Some(true),
            ..TaskPatch::default()
        };
        assert!(patch.validate().is_ok());

        let patch = TaskPatch {
            id: Some("t1".to_string()),
            due_date: Some("nope".to_string()),
            ..TaskPatch::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn filter_parses_known_values() {
        assert_eq!(TaskFilter::from_query("today"), Some(TaskFilter::Today));
        assert_eq!(TaskFilter::from_query("upcoming"), Some(TaskFilter::Upcoming));
        assert_eq!(TaskFilter::from_query("completed"), Some(TaskFilter::Completed));
        assert_eq!(TaskFilter::from_query("priority"), Some(TaskFilter::Priority));
        assert_eq!(TaskFilter::from_query("everything"), None);
    }

    #[test]
    fn priority_round_trips() {
        for (priority, text) in [
            (Priority::Low, "\"low\""),
            (Priority::Medium, "\"medium\""),
            (Priority::High, "\"high\""),
        ] {
            assert_eq!(serde_json::to_string(&priority).unwrap(), text);
            let parsed: Priority = serde_json::from_str(text).unwrap();
            assert_eq!(parsed, priority);
        }
    }
}
