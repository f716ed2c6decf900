//! TaskFlow Notifier - reminder daemon and control CLI.
//!
//! The `run` command starts the notification service: persisted reminders
//! are recovered and re-armed, and fired alerts are rendered to the terminal
//! until dismissed with Enter. The remaining commands inspect and edit the
//! persisted collection; a stored reminder is picked up the next time the
//! daemon starts.
//!
//! # Environment Variables
//!
//! See the [`taskflow_notifier::config`] module for available configuration.

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, Utc};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use taskflow_notifier::alert::due_description;
use taskflow_notifier::config::Config;
use taskflow_notifier::service::{due_moment, NotificationService};
use taskflow_notifier::store::{FileReminderStore, ReminderStore};
use taskflow_notifier::types::{ReminderEntry, TaskSummary};

/// TaskFlow Notifier - task reminder daemon.
///
/// Schedules reminders for tasks with due dates and raises an audible,
/// dismissable alert when each reminder comes due.
#[derive(Parser, Debug)]
#[command(name = "taskflow-notifier")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    TASKFLOW_DATA_DIR                   Data directory (default: ~/.taskflow)
    TASKFLOW_SOUND_FILE                 Primary alert sound (default: <data>/notify.wav)
    TASKFLOW_CHANNEL_CAPACITY           Alert channel capacity (default: 64)
    TASKFLOW_NO_SOUND                   Set to disable alert sounds
    TASKFLOW_NO_DESKTOP_NOTIFICATIONS   Set to disable desktop notifications

EXAMPLES:
    # Store a reminder: due tomorrow at 2 PM, alert an hour early
    taskflow-notifier schedule --title 'Write report' \\
        --due-date 2025-06-15 --due-time 14:00 --reminder 60

    # Run the daemon (re-arms stored reminders)
    taskflow-notifier run
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the reminder daemon.
    ///
    /// Recovers persisted reminders, arms their timers, and renders fired
    /// alerts to the terminal. Press Enter to dismiss an alert; ctrl-c exits.
    Run,

    /// Store a reminder for the daemon to arm.
    Schedule {
        /// Task identifier (generated when omitted).
        #[arg(long)]
        task_id: Option<String>,

        /// Task title shown in the alert.
        #[arg(long)]
        title: String,

        /// Due date, YYYY-MM-DD.
        #[arg(long)]
        due_date: String,

        /// Due time, HH:MM or HH:MM:SS (midnight when omitted).
        #[arg(long)]
        due_time: Option<String>,

        /// Minutes before the due moment to fire the alert.
        #[arg(long)]
        reminder: i64,
    },

    /// Remove a stored reminder.
    Cancel {
        /// Task identifier of the reminder to remove.
        task_id: String,
    },

    /// List stored reminders.
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;
            runtime.block_on(run_daemon())
        }
        Command::Schedule {
            task_id,
            title,
            due_date,
            due_time,
            reminder,
        } => run_schedule(task_id, title, due_date, due_time, reminder),
        Command::Cancel { task_id } => run_cancel(&task_id),
        Command::List => run_list(),
    }
}

/// Runs the daemon: recovery, then alert rendering until ctrl-c.
async fn run_daemon() -> Result<()> {
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    let service = NotificationService::start(&config).context("Failed to start service")?;
    let mut alerts = service.subscribe();

    info!(
        pending = service.pending_count(),
        data_dir = %config.data_dir.display(),
        "daemon started"
    );
    println!(
        "Watching {} pending reminder(s). Press ctrl-c to exit.",
        service.pending_count()
    );

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            alert = alerts.recv() => match alert {
                Ok(alert) => {
                    println!();
                    println!("  == Task Reminder ==");
                    println!("  {}", alert.title);
                    println!(
                        "  {}",
                        due_description(&alert.due_date, alert.due_time.as_deref())
                    );
                    println!("  [press Enter to dismiss]");
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "alert channel lagged");
                }
                Err(RecvError::Closed) => break,
            },
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(_)) => {
                    if service.alert_open() {
                        service.dismiss();
                        println!("  (dismissed)");
                    }
                }
                Ok(None) | Err(_) => {
                    // stdin closed; keep running on timers and ctrl-c alone.
                    stdin_open = false;
                }
            },
            _ = signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Stores a reminder entry for the daemon to recover.
fn run_schedule(
    task_id: Option<String>,
    title: String,
    due_date: String,
    due_time: Option<String>,
    reminder: i64,
) -> Result<()> {
    if reminder < 0 {
        bail!("--reminder must be a non-negative number of minutes");
    }

    let Some(due) = due_moment(&due_date, due_time.as_deref()) else {
        bail!("could not resolve due date/time '{due_date}' / {due_time:?}");
    };
    let fire_at = due - Duration::minutes(reminder);
    if fire_at <= Utc::now() {
        bail!(
            "reminder moment {} is already in the past",
            fire_at.with_timezone(&Local)
        );
    }

    let task_id = task_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = FileReminderStore::new(config.reminders_path());

    let mut entries = store.load().context("Failed to read stored reminders")?;
    entries.insert(
        task_id.clone(),
        ReminderEntry {
            task_id: task_id.clone(),
            fire_at,
            summary: TaskSummary {
                title: title.clone(),
                due_date,
                due_time,
            },
        },
    );
    store.save(&entries).context("Failed to store reminder")?;

    println!(
        "Stored reminder for \"{title}\" ({task_id}); fires {}",
        fire_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

/// Removes a stored reminder by task id.
fn run_cancel(task_id: &str) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = FileReminderStore::new(config.reminders_path());

    let mut entries = store.load().context("Failed to read stored reminders")?;
    match entries.remove(task_id) {
        Some(entry) => {
            store.save(&entries).context("Failed to store reminders")?;
            println!("Removed reminder for \"{}\"", entry.summary.title);
        }
        None => println!("No stored reminder for {task_id}"),
    }
    Ok(())
}

/// Prints stored reminders, soonest first.
fn run_list() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let store = FileReminderStore::new(config.reminders_path());

    let entries = store.load().context("Failed to read stored reminders")?;
    if entries.is_empty() {
        println!("No stored reminders.");
        return Ok(());
    }

    let mut sorted: Vec<_> = entries.into_values().collect();
    sorted.sort_by_key(|entry| entry.fire_at);

    let now = Utc::now();
    for entry in sorted {
        let state = if entry.is_pending(now) { "pending" } else { "expired" };
        println!(
            "{}  {}  [{}]  {}",
            entry.fire_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            entry.summary.title,
            state,
            entry.task_id,
        );
    }
    Ok(())
}

/// Initializes tracing with an env-filterable subscriber.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
