//! The reminder notification service.
//!
//! [`NotificationService`] is the single entry point to the reminder
//! subsystem: it owns the store, timer registry, and alert presenter
//! privately, and exposes `schedule` / `cancel` plus the alert channel.
//! Construct it once per process with [`NotificationService::start`], which
//! runs restart recovery before returning so that timers armed before a
//! restart are re-armed before any new scheduling happens.
//!
//! Scheduling translates a task's due date, optional due time, and reminder
//! lead minutes into an absolute fire moment. Tasks without a reminder are
//! ignored, unparseable dates are skipped (logged, never surfaced), and a
//! fire moment already in the past is silently dropped - a reminder is never
//! fired retroactively.
//!
//! # Example
//!
//! ```no_run
//! use taskflow_notifier::config::Config;
//! use taskflow_notifier::service::{NotificationService, ScheduleRequest};
//!
//! # async fn demo() -> taskflow_notifier::error::Result<()> {
//! let service = NotificationService::start(&Config::from_env()?)?;
//! let mut alerts = service.subscribe();
//!
//! service.schedule(ScheduleRequest {
//!     task_id: "task-1".to_string(),
//!     title: "Write report".to_string(),
//!     due_date: "2025-06-15".to_string(),
//!     due_time: Some("14:00".to_string()),
//!     reminder_minutes: Some(60),
//! });
//!
//! if let Ok(alert) = alerts.recv().await {
//!     println!("{} is due", alert.title);
//!     service.dismiss();
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, info};

use crate::alert::{AlertOptions, AlertPresenter};
use crate::config::Config;
use crate::error::Result;
use crate::registry::TimerRegistry;
use crate::store::{FileReminderStore, ReminderStore};
use crate::types::{ReminderAlert, ReminderEntry, TaskSummary};

/// A request to schedule a reminder for a task.
///
/// Mirrors the fields the task layer holds right after a task is created or
/// updated. `reminder_minutes` is the lead time before the due moment;
/// `None` means the task has no reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Opaque task identifier.
    pub task_id: String,

    /// Task title, captured into the alert summary.
    pub title: String,

    /// Calendar date the task is due (`YYYY-MM-DD`).
    pub due_date: String,

    /// Optional time of day (`HH:MM` or `HH:MM:SS`). Midnight when absent.
    pub due_time: Option<String>,

    /// Minutes before the due moment at which to fire, or `None` for no
    /// reminder.
    pub reminder_minutes: Option<i64>,
}

/// Singleton service owning the reminder subsystem for one process.
pub struct NotificationService {
    registry: TimerRegistry,
    presenter: Arc<AlertPresenter>,
}

impl NotificationService {
    /// Starts the service with file-backed persistence under the configured
    /// data directory, running restart recovery before returning.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Currently infallible in practice (recovery treats unreadable storage
    /// as empty); the `Result` reserves room for stores that can fail to
    /// open.
    pub fn start(config: &Config) -> Result<Self> {
        let store = Arc::new(FileReminderStore::new(config.reminders_path()));
        Ok(Self::with_store(config, store))
    }

    /// Starts the service over a caller-provided store, running restart
    /// recovery before returning.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn with_store(config: &Config, store: Arc<dyn ReminderStore>) -> Self {
        let options = AlertOptions {
            sound: config.sound,
            desktop_notifications: config.desktop_notifications,
            sound_file: config.sound_file.clone(),
        };
        let presenter = Arc::new(AlertPresenter::new(options, config.channel_capacity));
        let registry = TimerRegistry::new(store, Arc::clone(&presenter));

        let recovered = registry.recover_all();
        info!(recovered, "notification service started");

        Self {
            registry,
            presenter,
        }
    }

    /// Schedules (or reschedules) the reminder for a task.
    ///
    /// Returns the armed entry, or `None` when nothing was scheduled:
    /// the task has no reminder, the due date/time cannot be resolved, or
    /// the computed fire moment is not in the future. Scheduling again for
    /// the same task replaces the earlier reminder.
    ///
    /// Never fails: storage problems are contained and logged.
    pub fn schedule(&self, request: ScheduleRequest) -> Option<ReminderEntry> {
        let minutes = request.reminder_minutes?;
        if minutes < 0 {
            debug!(task_id = %request.task_id, minutes, "negative reminder lead, not scheduling");
            return None;
        }

        let Some(due_moment) = due_moment(&request.due_date, request.due_time.as_deref()) else {
            debug!(
                task_id = %request.task_id,
                due_date = %request.due_date,
                "unresolvable due date/time, not scheduling"
            );
            return None;
        };

        let fire_at = due_moment - Duration::minutes(minutes);
        if fire_at <= Utc::now() {
            debug!(
                task_id = %request.task_id,
                fire_at = %fire_at,
                "reminder moment already passed, not scheduling"
            );
            return None;
        }

        let entry = ReminderEntry {
            task_id: request.task_id,
            fire_at,
            summary: TaskSummary {
                title: request.title,
                due_date: request.due_date,
                due_time: request.due_time,
            },
        };
        self.registry.arm(entry.clone());
        Some(entry)
    }

    /// Cancels any reminder for a task: the live timer is stopped and the
    /// persisted entry removed. A task with no reminder is a no-op, not an
    /// error.
    pub fn cancel(&self, task_id: &str) {
        self.registry.disarm(task_id);
    }

    /// Subscribes to fired-reminder alerts.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<ReminderAlert> {
        self.presenter.subscribe()
    }

    /// Dismisses the currently visible alert.
    pub fn dismiss(&self) {
        self.presenter.dismiss();
    }

    /// Returns `true` while an alert is visible.
    #[must_use]
    pub fn alert_open(&self) -> bool {
        self.presenter.is_alert_open()
    }

    /// Number of armed, not-yet-fired reminder timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.registry.live_timer_count()
    }
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("pending", &self.pending_count())
            .field("alert_open", &self.alert_open())
            .finish_non_exhaustive()
    }
}

/// Resolves a due date plus optional time-of-day into an absolute moment.
///
/// The combination is interpreted in the machine's local timezone, matching
/// how the task layer's date strings are entered. Returns `None` for
/// unparseable input or a local time skipped by a DST transition; an
/// ambiguous local time takes the earlier mapping.
#[must_use]
pub fn due_moment(due_date: &str, due_time: Option<&str>) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(due_date, "%Y-%m-%d").ok()?;
    let time = match due_time {
        None => NaiveTime::MIN,
        Some(raw) if raw.is_empty() => NaiveTime::MIN,
        Some(raw) => parse_due_time(raw)?,
    };

    match Local.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(moment) => Some(moment.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _) => Some(earlier.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

/// Parses a 24-hour `HH:MM` or `HH:MM:SS` time of day.
fn parse_due_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}
