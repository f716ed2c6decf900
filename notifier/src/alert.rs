//! Alert presentation for fired reminders.
//!
//! When a reminder's timer elapses, the [`AlertPresenter`] renders the
//! user-visible consequence: a looping audible cue, a desktop notification
//! (auto-dismissed after five seconds), and a [`ReminderAlert`] published on
//! a broadcast channel for the UI layer to render as an in-app alert. The
//! in-app alert is the guaranteed minimum - cue and desktop notification
//! failures are logged and skipped, never surfaced.
//!
//! A process-wide guard prevents overlapping alerts: while one alert is open,
//! further fired reminders are dropped (not queued). The guard clears only
//! when the visible alert is dismissed via [`AlertPresenter::dismiss`], which
//! also silences the cue.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;

use chrono::{NaiveDate, NaiveTime};
use notify_rust::{Notification, Timeout};
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{debug, warn};

use crate::audio::{self, CueHandle, CueSource};
use crate::types::ReminderAlert;

/// How long a desktop notification stays up before auto-dismissing.
const DESKTOP_NOTIFICATION_TIMEOUT_MS: u32 = 5000;

/// Application name attached to desktop notifications.
const APP_NAME: &str = "taskflow";

/// Presentation options for fired reminders.
#[derive(Debug, Clone)]
pub struct AlertOptions {
    /// Whether to play an audible cue.
    pub sound: bool,

    /// Whether to raise a desktop notification.
    pub desktop_notifications: bool,

    /// Path of the primary cue asset.
    pub sound_file: PathBuf,
}

impl AlertOptions {
    /// Options with sound and desktop notifications disabled. The broadcast
    /// channel still carries alerts; useful for tests and embedders with
    /// their own presentation layer.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            sound: false,
            desktop_notifications: false,
            sound_file: PathBuf::new(),
        }
    }
}

/// Process-wide flag preventing a second alert while one is visible.
///
/// Owned exclusively by the presenter; set when an alert is presented and
/// cleared only by explicit dismissal.
#[derive(Debug, Default)]
struct DialogGuard {
    open: AtomicBool,
}

impl DialogGuard {
    /// Atomically claims the guard. Returns `false` when an alert is already
    /// open, in which case the caller must drop its alert.
    fn try_acquire(&self) -> bool {
        self.open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.open.store(false, Ordering::Release);
    }
}

/// Renders fired reminders to the user.
///
/// The presenter owns the dialog guard, the active cue handle, and the alert
/// broadcast channel. It is shared behind an `Arc` between the timer registry
/// (which fires alerts) and the embedding application (which subscribes and
/// dismisses).
pub struct AlertPresenter {
    guard: DialogGuard,
    sender: Sender<ReminderAlert>,
    options: AlertOptions,
    cue_sources: Vec<Box<dyn CueSource>>,
    active_cue: Mutex<Option<CueHandle>>,
}

impl AlertPresenter {
    /// Creates a presenter with the given options and alert channel capacity.
    #[must_use]
    pub fn new(options: AlertOptions, channel_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(channel_capacity);
        let cue_sources = audio::default_chain(&options.sound_file);
        Self {
            guard: DialogGuard::default(),
            sender,
            options,
            cue_sources,
            active_cue: Mutex::new(None),
        }
    }

    /// Subscribes to fired-reminder alerts.
    ///
    /// Only alerts fired after subscribing are received.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<ReminderAlert> {
        self.sender.subscribe()
    }

    /// Presents a fired reminder.
    ///
    /// Returns `false` when an alert is already open - the new alert is
    /// dropped, matching the one-alert-at-a-time contract. Otherwise starts
    /// the cue, raises the desktop notification (both best-effort), and
    /// publishes the alert for the in-app layer.
    pub fn present(&self, alert: ReminderAlert) -> bool {
        if !self.guard.try_acquire() {
            debug!(task_id = %alert.task_id, "alert already open, dropping reminder");
            return false;
        }

        if self.options.sound {
            if let Some(handle) = audio::play_cue(&self.cue_sources) {
                *self
                    .active_cue
                    .lock()
                    .unwrap_or_else(|e| e.into_inner()) = Some(handle);
            }
        }

        if self.options.desktop_notifications {
            raise_desktop_notification(&alert);
        }

        match self.sender.send(alert) {
            Ok(receivers) => {
                debug!(receivers, "reminder alert published");
            }
            Err(_) => {
                warn!("no alert subscribers; in-app alert will not render");
            }
        }
        true
    }

    /// Dismisses the currently visible alert: stops the cue and clears the
    /// guard. This is the only way the guard clears. Safe to call when no
    /// alert is open.
    pub fn dismiss(&self) {
        if let Some(handle) = self
            .active_cue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.stop();
        }
        self.guard.clear();
    }

    /// Returns `true` while an alert is visible.
    #[must_use]
    pub fn is_alert_open(&self) -> bool {
        self.guard.is_open()
    }
}

impl std::fmt::Debug for AlertPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertPresenter")
            .field("open", &self.guard.is_open())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Raises the desktop notification on a background thread; failures are
/// logged and never block the in-app alert.
fn raise_desktop_notification(alert: &ReminderAlert) {
    let body = format!(
        "Your task \"{}\" is {}",
        alert.title,
        due_description(&alert.due_date, alert.due_time.as_deref())
    );

    thread::spawn(move || {
        if let Err(err) = Notification::new()
            .summary("Task Reminder")
            .body(&body)
            .appname(APP_NAME)
            .timeout(Timeout::Milliseconds(DESKTOP_NOTIFICATION_TIMEOUT_MS))
            .show()
        {
            warn!("desktop notification failed: {err}");
        }
    });
}

/// Formats a `YYYY-MM-DD` due date for display, e.g. `"Sun, Jun 15"`.
/// Unparseable input is returned unchanged.
#[must_use]
pub fn format_due_date(due_date: &str) -> String {
    match NaiveDate::parse_from_str(due_date, "%Y-%m-%d") {
        Ok(date) => date.format("%a, %b %-d").to_string(),
        Err(_) => due_date.to_string(),
    }
}

/// Formats a 24-hour `HH:MM[:SS]` due time on a 12-hour clock with an AM/PM
/// suffix, e.g. `"2:00 PM"`. Unparseable input is returned unchanged.
#[must_use]
pub fn format_due_time(due_time: &str) -> String {
    NaiveTime::parse_from_str(due_time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(due_time, "%H:%M"))
        .map(|time| time.format("%-I:%M %p").to_string())
        .unwrap_or_else(|_| due_time.to_string())
}

/// Human-readable due phrase: `"due at 2:00 PM on Sun, Jun 15"`, or
/// `"due on Sun, Jun 15"` when no time is set.
#[must_use]
pub fn due_description(due_date: &str, due_time: Option<&str>) -> String {
    match due_time {
        Some(time) if !time.is_empty() => format!(
            "due at {} on {}",
            format_due_time(time),
            format_due_date(due_date)
        ),
        _ => format!("due on {}", format_due_date(due_date)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(task_id: &str) -> ReminderAlert {
        ReminderAlert {
            task_id: task_id.to_string(),
            title: "Write report".to_string(),
            due_date: "2025-06-15".to_string(),
            due_time: Some("14:00".to_string()),
        }
    }

    fn presenter() -> AlertPresenter {
        AlertPresenter::new(AlertOptions::silent(), 8)
    }

    #[test]
    fn second_alert_while_open_is_dropped() {
        let presenter = presenter();
        let mut rx = presenter.subscribe();

        assert!(presenter.present(alert("task-1")));
        assert!(presenter.is_alert_open());

        // A reminder firing while the alert is open is dropped, not queued.
        assert!(!presenter.present(alert("task-2")));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.task_id, "task-1");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dismiss_clears_guard_and_allows_next_alert() {
        let presenter = presenter();
        let _rx = presenter.subscribe();

        assert!(presenter.present(alert("task-1")));
        presenter.dismiss();
        assert!(!presenter.is_alert_open());

        assert!(presenter.present(alert("task-2")));
    }

    #[test]
    fn dismiss_without_open_alert_is_safe() {
        let presenter = presenter();
        presenter.dismiss();
        presenter.dismiss();
        assert!(!presenter.is_alert_open());
    }

    #[test]
    fn present_without_subscribers_still_opens() {
        let presenter = presenter();
        assert!(presenter.present(alert("task-1")));
        assert!(presenter.is_alert_open());
    }

    #[test]
    fn subscriber_receives_payload() {
        let presenter = presenter();
        let mut rx = presenter.subscribe();

        presenter.present(alert("task-1"));
        let received = rx.try_recv().unwrap();
        assert_eq!(received.title, "Write report");
        assert_eq!(received.due_time.as_deref(), Some("14:00"));
    }

    #[test]
    fn due_date_formats_weekday_month_day() {
        assert_eq!(format_due_date("2025-06-15"), "Sun, Jun 15");
        assert_eq!(format_due_date("2025-06-09"), "Mon, Jun 9");
        assert_eq!(format_due_date("2025-12-01"), "Mon, Dec 1");
    }

    #[test]
    fn unparseable_due_date_passes_through() {
        assert_eq!(format_due_date("someday"), "someday");
        assert_eq!(format_due_date(""), "");
    }

    #[test]
    fn due_time_formats_twelve_hour() {
        assert_eq!(format_due_time("14:00"), "2:00 PM");
        assert_eq!(format_due_time("09:05"), "9:05 AM");
        assert_eq!(format_due_time("00:30"), "12:30 AM");
        assert_eq!(format_due_time("12:00"), "12:00 PM");
        assert_eq!(format_due_time("23:59"), "11:59 PM");
    }

    #[test]
    fn due_time_accepts_seconds() {
        assert_eq!(format_due_time("14:00:30"), "2:00 PM");
    }

    #[test]
    fn unparseable_due_time_passes_through() {
        assert_eq!(format_due_time("noonish"), "noonish");
    }

    #[test]
    fn due_description_with_and_without_time() {
        assert_eq!(
            due_description("2025-06-15", Some("14:00")),
            "due at 2:00 PM on Sun, Jun 15"
        );
        assert_eq!(due_description("2025-06-15", None), "due on Sun, Jun 15");
        assert_eq!(due_description("2025-06-15", Some("")), "due on Sun, Jun 15");
    }
}
