//! Configuration module for the TaskFlow server.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `TASKFLOW_SUPABASE_URL` | Yes | - | Supabase project URL |
//! | `TASKFLOW_SUPABASE_ANON_KEY` | Yes | - | Supabase anon/public key |
//! | `PORT` | No | 8080 | HTTP server port |
//! | `TASKFLOW_API_TOKEN` | No | - | Static bearer token for local development |
//! | `TASKFLOW_UNSAFE_NO_AUTH` | No | false | Disable auth entirely (dev only) |

use std::env;

use thiserror::Error;

/// Default HTTP server port.
const DEFAULT_PORT: u16 = 8080;

/// Errors that occur during configuration loading and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required configuration value is missing.
    #[error("missing required configuration: {0}")]
    Missing(String),

    /// A configuration value failed to parse or is invalid.
    #[error("invalid configuration value for '{key}': {reason}")]
    Invalid {
        /// The configuration key that has an invalid value.
        key: String,
        /// Description of why the value is invalid.
        reason: String,
    },
}

/// Configuration for the TaskFlow server.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,

    /// Supabase project URL (e.g. `https://xxx.supabase.co`).
    pub supabase_url: String,

    /// Supabase anonymous/public key.
    pub supabase_anon_key: String,

    /// Optional static bearer token accepted alongside Supabase JWTs.
    pub api_token: Option<String>,

    /// Disables authentication entirely. Development only.
    pub unsafe_no_auth: bool,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let supabase_url = env::var("TASKFLOW_SUPABASE_URL")
            .map_err(|_| ConfigError::Missing("TASKFLOW_SUPABASE_URL".to_string()))?;
        let supabase_anon_key = env::var("TASKFLOW_SUPABASE_ANON_KEY")
            .map_err(|_| ConfigError::Missing("TASKFLOW_SUPABASE_ANON_KEY".to_string()))?;

        let port = match env::var("PORT") {
            Ok(val) => val.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT".to_string(),
                reason: format!("expected port number, got '{val}'"),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let api_token = env::var("TASKFLOW_API_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        let unsafe_no_auth = env::var("TASKFLOW_UNSAFE_NO_AUTH")
            .map(|val| val == "1" || val.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            port,
            supabase_url,
            supabase_anon_key,
            api_token,
            unsafe_no_auth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to run tests with isolated environment variables.
    fn with_clean_env<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let keys = [
            "PORT",
            "TASKFLOW_SUPABASE_URL",
            "TASKFLOW_SUPABASE_ANON_KEY",
            "TASKFLOW_API_TOKEN",
            "TASKFLOW_UNSAFE_NO_AUTH",
        ];
        let saved: Vec<(String, Option<String>)> = keys
            .iter()
            .map(|k| ((*k).to_string(), env::var(k).ok()))
            .collect();
        for k in keys {
            env::remove_var(k);
        }

        let result = f();

        for (k, v) in saved {
            match v {
                Some(val) => env::set_var(&k, val),
                None => env::remove_var(&k),
            }
        }
        result
    }

    #[test]
    #[serial]
    fn missing_supabase_url_is_an_error() {
        with_clean_env(|| {
            let err = Config::from_env().unwrap_err();
            assert_eq!(err, ConfigError::Missing("TASKFLOW_SUPABASE_URL".to_string()));
        });
    }

    #[test]
    #[serial]
    fn minimal_config_applies_defaults() {
        with_clean_env(|| {
            env::set_var("TASKFLOW_SUPABASE_URL", "https://x.supabase.co");
            env::set_var("TASKFLOW_SUPABASE_ANON_KEY", "anon");

            let config = Config::from_env().unwrap();
            assert_eq!(config.port, DEFAULT_PORT);
            assert_eq!(config.api_token, None);
            assert!(!config.unsafe_no_auth);
        });
    }

    #[test]
    #[serial]
    fn invalid_port_rejected() {
        with_clean_env(|| {
            env::set_var("TASKFLOW_SUPABASE_URL", "https://x.supabase.co");
            env::set_var("TASKFLOW_SUPABASE_ANON_KEY", "anon");
            env::set_var("PORT", "eighty");

            let err = Config::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }));
        });
    }

    #[test]
    #[serial]
    fn empty_api_token_is_ignored() {
        with_clean_env(|| {
            env::set_var("TASKFLOW_SUPABASE_URL", "https://x.supabase.co");
            env::set_var("TASKFLOW_SUPABASE_ANON_KEY", "anon");
            env::set_var("TASKFLOW_API_TOKEN", "");

            let config = Config::from_env().unwrap();
            assert_eq!(config.api_token, None);
        });
    }

    #[test]
    #[serial]
    fn unsafe_mode_flag_parses() {
        with_clean_env(|| {
            env::set_var("TASKFLOW_SUPABASE_URL", "https://x.supabase.co");
            env::set_var("TASKFLOW_SUPABASE_ANON_KEY", "anon");
            env::set_var("TASKFLOW_UNSAFE_NO_AUTH", "true");

            let config = Config::from_env().unwrap();
            assert!(config.unsafe_no_auth);
        });
    }
}
