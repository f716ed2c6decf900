//! Integration tests for the notification service lifecycle.
//!
//! These tests exercise the full schedule -> fire -> dismiss path over
//! file-backed persistence, including restart recovery and the
//! one-alert-at-a-time guard, using tokio's paused clock.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Local, Utc};
use tempfile::TempDir;
use tokio::sync::broadcast::error::TryRecvError;

use taskflow_notifier::config::Config;
use taskflow_notifier::service::{NotificationService, ScheduleRequest};
use taskflow_notifier::store::{FileReminderStore, ReminderCollection, ReminderStore};
use taskflow_notifier::types::{ReminderEntry, TaskSummary};

// =============================================================================
// Test Helpers
// =============================================================================

/// Creates a service with file persistence inside a fresh temp directory.
fn start_service(dir: &TempDir) -> NotificationService {
    let config = Config::headless(dir.path());
    NotificationService::start(&config).unwrap()
}

/// A schedule request whose alert fires `fire_in_secs` from now.
///
/// The due moment is placed an hour after the fire moment and the lead time
/// set to 60 minutes, mirroring how the task layer calls in.
fn request_firing_in(task_id: &str, fire_in_secs: i64) -> ScheduleRequest {
    let due = Local::now() + ChronoDuration::seconds(fire_in_secs) + ChronoDuration::hours(1);
    ScheduleRequest {
        task_id: task_id.to_string(),
        title: format!("{task_id} title"),
        due_date: due.format("%Y-%m-%d").to_string(),
        due_time: Some(due.format("%H:%M:%S").to_string()),
        reminder_minutes: Some(60),
    }
}

/// A persisted entry as a previous process run would have left it.
fn stored_entry(task_id: &str, fire_in_secs: i64) -> ReminderEntry {
    ReminderEntry {
        task_id: task_id.to_string(),
        fire_at: Utc::now() + ChronoDuration::seconds(fire_in_secs),
        summary: TaskSummary {
            title: format!("{task_id} title"),
            due_date: "2025-06-15".to_string(),
            due_time: Some("14:00".to_string()),
        },
    }
}

/// Lets spawned timer tasks run to completion on the paused clock.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Schedule / Fire / Dismiss
// =============================================================================

#[tokio::test(start_paused = true)]
async fn scheduled_reminder_fires_and_is_consumed() {
    let dir = TempDir::new().unwrap();
    let service = start_service(&dir);
    let mut alerts = service.subscribe();

    let entry = service.schedule(request_firing_in("task-1", 90)).unwrap();
    assert!(entry.fire_at > Utc::now());

    tokio::time::advance(Duration::from_secs(95)).await;
    settle().await;

    let alert = alerts.try_recv().unwrap();
    assert_eq!(alert.task_id, "task-1");
    assert_eq!(alert.title, "task-1 title");
    assert!(service.alert_open());

    // Fired and consumed: storage is empty again.
    let store = FileReminderStore::new(dir.path().join("reminders.json"));
    assert!(store.load().unwrap().is_empty());

    service.dismiss();
    assert!(!service.alert_open());
}

#[tokio::test(start_paused = true)]
async fn canceled_reminder_never_fires() {
    let dir = TempDir::new().unwrap();
    let service = start_service(&dir);
    let mut alerts = service.subscribe();

    service.schedule(request_firing_in("task-1", 60)).unwrap();
    service.cancel("task-1");

    tokio::time::advance(Duration::from_secs(3600)).await;
    settle().await;

    assert!(matches!(alerts.try_recv(), Err(TryRecvError::Empty)));
    assert_eq!(service.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn second_fire_while_alert_open_is_dropped() {
    let dir = TempDir::new().unwrap();
    let service = start_service(&dir);
    let mut alerts = service.subscribe();

    service.schedule(request_firing_in("task-1", 30)).unwrap();
    service.schedule(request_firing_in("task-2", 31)).unwrap();

    tokio::time::advance(Duration::from_secs(35)).await;
    settle().await;

    // The first alert opened; the second fired a second later and was
    // dropped, not queued.
    let alert = alerts.try_recv().unwrap();
    assert_eq!(alert.task_id, "task-1");
    assert!(matches!(alerts.try_recv(), Err(TryRecvError::Empty)));

    // Dismissal reopens the pipeline for future alerts.
    service.dismiss();
    service.schedule(request_firing_in("task-3", 30)).unwrap();
    tokio::time::advance(Duration::from_secs(35)).await;
    settle().await;
    assert_eq!(alerts.try_recv().unwrap().task_id, "task-3");
}

#[tokio::test(start_paused = true)]
async fn rescheduling_replaces_the_pending_reminder() {
    let dir = TempDir::new().unwrap();
    let service = start_service(&dir);
    let mut alerts = service.subscribe();

    service.schedule(request_firing_in("task-1", 60)).unwrap();
    service.schedule(request_firing_in("task-1", 600)).unwrap();
    assert_eq!(service.pending_count(), 1);

    // Nothing at the first deadline.
    tokio::time::advance(Duration::from_secs(65)).await;
    settle().await;
    assert!(matches!(alerts.try_recv(), Err(TryRecvError::Empty)));

    tokio::time::advance(Duration::from_secs(600)).await;
    settle().await;
    assert_eq!(alerts.try_recv().unwrap().task_id, "task-1");
}

// =============================================================================
// Restart Recovery
// =============================================================================

#[tokio::test(start_paused = true)]
async fn recovery_rearms_pending_and_discards_expired() {
    let dir = TempDir::new().unwrap();
    let store = FileReminderStore::new(dir.path().join("reminders.json"));

    let mut entries = ReminderCollection::new();
    let pending = stored_entry("pending", 300);
    let expired = stored_entry("expired", -300);
    entries.insert(pending.task_id.clone(), pending.clone());
    entries.insert(expired.task_id.clone(), expired);
    store.save(&entries).unwrap();

    // "Restart": a fresh service over the same data directory.
    let service = start_service(&dir);
    let mut alerts = service.subscribe();

    // Only the future entry survives recovery, and it is armed.
    let remaining = store.load().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining["pending"], pending);
    assert_eq!(service.pending_count(), 1);

    tokio::time::advance(Duration::from_secs(301)).await;
    settle().await;

    let alert = alerts.try_recv().unwrap();
    assert_eq!(alert.task_id, "pending");
    assert!(matches!(alerts.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn recovery_treats_corrupt_storage_as_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("reminders.json"), "{ definitely not json").unwrap();

    let service = start_service(&dir);
    assert_eq!(service.pending_count(), 0);

    // The service is fully usable afterwards.
    service.schedule(request_firing_in("task-1", 60)).unwrap();
    assert_eq!(service.pending_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn schedule_in_the_past_leaves_no_trace() {
    let dir = TempDir::new().unwrap();
    let service = start_service(&dir);

    let due = Local::now() - ChronoDuration::minutes(30);
    let request = ScheduleRequest {
        task_id: "task-1".to_string(),
        title: "late".to_string(),
        due_date: due.format("%Y-%m-%d").to_string(),
        due_time: Some(due.format("%H:%M").to_string()),
        reminder_minutes: Some(60),
    };
    assert!(service.schedule(request).is_none());

    let store = FileReminderStore::new(dir.path().join("reminders.json"));
    assert!(store.load().unwrap().is_empty());
    assert_eq!(service.pending_count(), 0);
}
