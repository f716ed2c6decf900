//! TaskFlow Notifier - task reminder scheduling and alerting.
//!
//! This crate implements the reminder subsystem of TaskFlow: given a task's
//! due date, optional due time, and a reminder lead time in minutes, it
//! computes an absolute fire moment, arms a durable timer that survives
//! process restarts, and raises a user-visible alert exactly once when the
//! timer elapses.
//!
//! # Overview
//!
//! The [`service::NotificationService`] is the single entry point: construct
//! it once at process start (which re-arms reminders persisted by a previous
//! run), then call `schedule` after every task create/update and `cancel`
//! after every delete. Fired reminders arrive on a broadcast channel as
//! [`types::ReminderAlert`] values; the embedding UI renders them and calls
//! `dismiss` when the user closes the alert.
//!
//! While an alert is open, further fired reminders are dropped rather than
//! queued, and a reminder whose moment passed while the process was stopped
//! is discarded at startup rather than shown late.
//!
//! # Modules
//!
//! - [`service`]: the notification service (schedule / cancel / alerts)
//! - [`registry`]: durable timer bookkeeping and restart recovery
//! - [`alert`]: alert presentation and the one-alert-at-a-time guard
//! - [`audio`]: audible cue sources with ordered fallback
//! - [`store`]: persistence port for pending reminders
//! - [`types`]: reminder records and alert events
//! - [`config`]: configuration from environment variables
//! - [`error`]: error types for notifier operations

pub mod alert;
pub mod audio;
pub mod config;
pub mod error;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;

pub use alert::{AlertOptions, AlertPresenter};
pub use config::Config;
pub use error::{NotifierError, Result};
pub use registry::TimerRegistry;
pub use service::{due_moment, NotificationService, ScheduleRequest};
pub use store::{FileReminderStore, MemoryReminderStore, ReminderCollection, ReminderStore};
pub use types::{ReminderAlert, ReminderEntry, TaskSummary};
