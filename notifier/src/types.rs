//! Reminder records and alert events for the TaskFlow notifier.
//!
//! This module defines the persisted reminder schema and the payload carried
//! on the alert channel when a reminder fires. All types serialize to
//! camelCase JSON; `fireAt` is stored as epoch milliseconds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized display data captured when a reminder is scheduled.
///
/// The snapshot lets a fired alert render without re-fetching the task; a
/// task edited or deleted after its reminder fired still shows the data it
/// had at scheduling time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    /// Task title.
    pub title: String,

    /// Calendar date the task is due, as supplied by the caller
    /// (e.g. `2025-06-15`).
    pub due_date: String,

    /// Optional time of day the task is due, 24-hour `HH:MM` or `HH:MM:SS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
}

/// One pending reminder, keyed by task id in the persisted collection.
///
/// At most one entry exists per task; scheduling the same task again replaces
/// the earlier entry and its timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEntry {
    /// Opaque task identifier.
    pub task_id: String,

    /// Absolute moment the alert should fire, persisted as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fire_at: DateTime<Utc>,

    /// Display snapshot captured at scheduling time.
    pub summary: TaskSummary,
}

impl ReminderEntry {
    /// Returns `true` if this entry's fire moment is strictly in the future
    /// relative to `now`.
    #[must_use]
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.fire_at > now
    }
}

/// Payload published on the alert channel when a reminder fires.
///
/// Subscribers (typically a UI layer) render the in-app alert from this and
/// forward the user's dismissal back via
/// [`NotificationService::dismiss`](crate::service::NotificationService::dismiss).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderAlert {
    /// Task the reminder belongs to.
    pub task_id: String,

    /// Task title at scheduling time.
    pub title: String,

    /// Due date at scheduling time.
    pub due_date: String,

    /// Due time at scheduling time, if any.
    pub due_time: Option<String>,
}

impl ReminderAlert {
    /// Builds the alert payload for a reminder entry.
    #[must_use]
    pub fn from_entry(entry: &ReminderEntry) -> Self {
        Self {
            task_id: entry.task_id.clone(),
            title: entry.summary.title.clone(),
            due_date: entry.summary.due_date.clone(),
            due_time: entry.summary.due_time.clone(),
        }
    }
}
