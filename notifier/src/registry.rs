//! Durable timer bookkeeping for pending reminders.
//!
//! The [`TimerRegistry`] is the only component that starts or stops reminder
//! delays. It keeps the persisted collection and the live timers consistent:
//! at most one live timer exists per task id, every persisted non-expired
//! entry has a corresponding timer after recovery, and a reminder is consumed
//! the moment it fires (fire-once - it is never re-armed automatically).
//!
//! Registry state lives behind a `std::sync::Mutex` that is only held for
//! synchronous read-modify-write sections, never across an await, so a whole
//! logical operation on the persisted collection cannot interleave with
//! another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::alert::AlertPresenter;
use crate::store::{ReminderCollection, ReminderStore};
use crate::types::{ReminderAlert, ReminderEntry};

/// Owns the persisted reminder collection and its live timers.
pub struct TimerRegistry {
    store: Arc<dyn ReminderStore>,
    presenter: Arc<AlertPresenter>,
    timers: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl TimerRegistry {
    /// Creates a registry over the given store and presenter.
    #[must_use]
    pub fn new(store: Arc<dyn ReminderStore>, presenter: Arc<AlertPresenter>) -> Self {
        Self {
            store,
            presenter,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Arms a reminder: persists the entry (replacing any earlier entry for
    /// the same task) and starts its in-process delay. An existing live timer
    /// for the task is canceled first - never two timers for one task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&self, entry: ReminderEntry) {
        let mut entries = self.load_entries();
        entries.insert(entry.task_id.clone(), entry.clone());
        self.persist(&entries);
        self.spawn_timer(entry);
    }

    /// Cancels the live timer and removes the persisted entry for a task.
    /// Idempotent: a task with no reminder, or whose reminder already fired,
    /// is a no-op.
    pub fn disarm(&self, task_id: &str) {
        if let Some(handle) = lock(&self.timers).remove(task_id) {
            handle.abort();
            debug!(task_id, "reminder timer canceled");
        }

        let mut entries = self.load_entries();
        if entries.remove(task_id).is_some() {
            self.persist(&entries);
        }
    }

    /// Restart recovery: reads the persisted collection, discards entries
    /// whose fire moment has already passed (a reminder missed while the
    /// process was stopped is not shown retroactively), writes the pruned
    /// collection back in one pass, and re-arms the rest against the current
    /// clock. Returns the number of re-armed reminders.
    ///
    /// Must be called from within a tokio runtime.
    pub fn recover_all(&self) -> usize {
        let now = Utc::now();
        let entries = self.load_entries();
        let (pending, expired): (Vec<ReminderEntry>, Vec<ReminderEntry>) =
            entries.into_values().partition(|e| e.is_pending(now));

        if !expired.is_empty() {
            info!(
                count = expired.len(),
                "discarding reminders that expired while the process was stopped"
            );
        }

        let pruned: ReminderCollection = pending
            .iter()
            .map(|e| (e.task_id.clone(), e.clone()))
            .collect();
        self.persist(&pruned);

        let count = pending.len();
        for entry in pending {
            self.spawn_timer(entry);
        }
        if count > 0 {
            info!(count, "re-armed persisted reminders");
        }
        count
    }

    /// Number of timers that have been armed and not yet fired or canceled.
    #[must_use]
    pub fn live_timer_count(&self) -> usize {
        lock(&self.timers)
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Starts the in-process delay for an entry, replacing any live timer for
    /// the same task. On elapse the alert is presented, then the entry is
    /// consumed from storage.
    fn spawn_timer(&self, entry: ReminderEntry) {
        // Cancel first so two timers never coexist for one task.
        if let Some(old) = lock(&self.timers).remove(&entry.task_id) {
            old.abort();
        }

        let delay = (entry.fire_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        debug!(
            task_id = %entry.task_id,
            delay_ms = delay.as_millis() as u64,
            "reminder timer armed"
        );

        let task_id = entry.task_id.clone();
        let store = Arc::clone(&self.store);
        let presenter = Arc::clone(&self.presenter);
        let timers = Arc::clone(&self.timers);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if !presenter.present(ReminderAlert::from_entry(&entry)) {
                debug!(task_id = %entry.task_id, "fired reminder dropped while another alert is open");
            }

            consume_entry(store.as_ref(), &entry);
            lock(&timers).remove(&entry.task_id);
        });

        lock(&self.timers).insert(task_id, handle);
    }

    fn load_entries(&self) -> ReminderCollection {
        self.store.load().unwrap_or_else(|err| {
            warn!(error = %err, "failed to read persisted reminders, starting empty");
            ReminderCollection::new()
        })
    }

    fn persist(&self, entries: &ReminderCollection) {
        if let Err(err) = self.store.save(entries) {
            // Contained: a persistence failure must not break the live timer
            // or the task-save flow that triggered it.
            warn!(error = %err, "failed to persist reminders");
        }
    }
}

impl std::fmt::Debug for TimerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerRegistry")
            .field("live_timers", &self.live_timer_count())
            .finish_non_exhaustive()
    }
}

/// Removes a fired entry from storage, but only if storage still holds this
/// exact schedule - a replacement armed between fire and consume survives.
fn consume_entry(store: &dyn ReminderStore, entry: &ReminderEntry) {
    let mut entries = match store.load() {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "failed to read persisted reminders after fire");
            return;
        }
    };

    if entries.get(&entry.task_id) == Some(entry) {
        entries.remove(&entry.task_id);
        if let Err(err) = store.save(&entries) {
            warn!(error = %err, "failed to remove fired reminder from storage");
        }
    }
}

fn lock<'a>(
    timers: &'a Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
) -> MutexGuard<'a, HashMap<String, JoinHandle<()>>> {
    timers.lock().unwrap_or_else(|e| e.into_inner())
}
