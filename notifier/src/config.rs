//! Configuration module for the TaskFlow notifier.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `TASKFLOW_DATA_DIR` | No | `~/.taskflow` | Directory holding `reminders.json` |
//! | `TASKFLOW_SOUND_FILE` | No | `<data_dir>/notify.wav` | Primary alert cue asset |
//! | `TASKFLOW_CHANNEL_CAPACITY` | No | 64 | Alert channel capacity |
//! | `TASKFLOW_NO_SOUND` | No | - | Set to `true`/`1` to silence alert cues |
//! | `TASKFLOW_NO_DESKTOP_NOTIFICATIONS` | No | - | Set to `true`/`1` to skip desktop notifications |
//!
//! # Example
//!
//! ```no_run
//! use taskflow_notifier::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Data dir: {}", config.data_dir.display());
//! ```

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Default alert channel capacity.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Default data directory name relative to home.
const DEFAULT_DATA_DIR: &str = ".taskflow";

/// File name of the persisted reminder collection inside the data directory.
const REMINDERS_FILE: &str = "reminders.json";

/// Default file name of the primary cue asset inside the data directory.
const SOUND_FILE: &str = "notify.wav";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the TaskFlow notifier.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the persisted reminder collection.
    pub data_dir: PathBuf,

    /// Path to the primary alert cue asset (WAV). When the file is missing
    /// or unreadable the presenter falls back to the embedded cue, then to a
    /// synthesized tone.
    pub sound_file: PathBuf,

    /// Capacity of the alert broadcast channel.
    pub channel_capacity: usize,

    /// Whether alert cues play sound.
    pub sound: bool,

    /// Whether fired alerts raise a desktop notification.
    pub desktop_notifications: bool,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `TASKFLOW_CHANNEL_CAPACITY` is set but is not a positive integer
    /// - The home directory cannot be determined (needed for default paths)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Optional: TASKFLOW_DATA_DIR (default: ~/.taskflow)
        let data_dir = match env::var("TASKFLOW_DATA_DIR") {
            Ok(val) => PathBuf::from(val),
            Err(_) => {
                let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
                base_dirs.home_dir().join(DEFAULT_DATA_DIR)
            }
        };

        // Optional: TASKFLOW_SOUND_FILE (default: <data_dir>/notify.wav)
        let sound_file = env::var("TASKFLOW_SOUND_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join(SOUND_FILE));

        // Optional: TASKFLOW_CHANNEL_CAPACITY (default: 64, must be > 0)
        let channel_capacity = match env::var("TASKFLOW_CHANNEL_CAPACITY") {
            Ok(val) => {
                let capacity = val
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "TASKFLOW_CHANNEL_CAPACITY".to_string(),
                        message: format!("expected positive integer, got '{val}'"),
                    })?;
                if capacity == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "TASKFLOW_CHANNEL_CAPACITY".to_string(),
                        message: "channel capacity must be greater than 0".to_string(),
                    });
                }
                capacity
            }
            Err(_) => DEFAULT_CHANNEL_CAPACITY,
        };

        let sound = !env_flag("TASKFLOW_NO_SOUND");
        let desktop_notifications = !env_flag("TASKFLOW_NO_DESKTOP_NOTIFICATIONS");

        Ok(Self {
            data_dir,
            sound_file,
            channel_capacity,
            sound,
            desktop_notifications,
        })
    }

    /// Creates a configuration rooted at the given data directory, with sound
    /// and desktop notifications disabled. Intended for tests and embedders
    /// that provide their own presentation layer.
    #[must_use]
    pub fn headless(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let sound_file = data_dir.join(SOUND_FILE);
        Self {
            data_dir,
            sound_file,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            sound: false,
            desktop_notifications: false,
        }
    }

    /// Path of the persisted reminder collection.
    #[must_use]
    pub fn reminders_path(&self) -> PathBuf {
        self.data_dir.join(REMINDERS_FILE)
    }
}

/// Returns `true` when the named environment variable is set to a truthy value.
fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|val| val == "1" || val.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
