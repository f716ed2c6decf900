//! TaskFlow Server - task CRUD and auth boundary.
//!
//! This crate serves the TaskFlow dashboard's task API. Task rows live in a
//! hosted Supabase project (PostgREST), and user identity comes from bearer
//! tokens validated against Supabase auth. The reminder subsystem
//! (`taskflow-notifier`) runs client-side and consumes this API only through
//! its task fields; the two crates share no code.
//!
//! # Modules
//!
//! - [`routes`]: HTTP route handlers and application state
//! - [`auth`]: bearer token authentication
//! - [`supabase`]: Supabase client (auth validation, task storage)
//! - [`types`]: task records and request payloads
//! - [`config`]: configuration from environment variables
//! - [`error`]: error types and HTTP response mapping

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod supabase;
pub mod types;

pub use auth::{AuthError, AuthSession, AuthedUser};
pub use config::Config;
pub use error::ServerError;
pub use routes::{create_router, AppState};
pub use supabase::{SupabaseClient, SupabaseError, SupabaseUser};
pub use types::{NewTask, Priority, Task, TaskFilter, TaskPatch};
