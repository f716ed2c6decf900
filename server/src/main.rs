//! TaskFlow Server - main entry point.
//!
//! This binary starts the task API server with structured logging and
//! graceful shutdown handling (SIGTERM/ctrl-c).
//!
//! # Configuration
//!
//! See [`taskflow_server::config`] for environment variable configuration.
//!
//! # Example
//!
//! ```bash
//! # Development mode (no auth)
//! TASKFLOW_SUPABASE_URL=https://xxx.supabase.co \
//! TASKFLOW_SUPABASE_ANON_KEY=anon-key \
//! TASKFLOW_UNSAFE_NO_AUTH=true \
//! cargo run --bin taskflow-server
//! ```

use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use taskflow_server::config::Config;
use taskflow_server::routes::{create_router, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load configuration");
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Required environment variables:");
            eprintln!("  TASKFLOW_SUPABASE_URL       - Supabase project URL");
            eprintln!("  TASKFLOW_SUPABASE_ANON_KEY  - Supabase anon/public key");
            eprintln!();
            eprintln!("Optional environment variables:");
            eprintln!("  PORT                        - HTTP server port (default: 8080)");
            eprintln!("  TASKFLOW_API_TOKEN          - Static bearer token for development");
            eprintln!("  TASKFLOW_UNSAFE_NO_AUTH     - Disable auth (dev only, set to 'true')");
            eprintln!("  RUST_LOG                    - Log level filter (default: info)");
            return ExitCode::from(1);
        }
    };

    let auth_mode = if config.unsafe_no_auth {
        "disabled (UNSAFE)"
    } else if config.api_token.is_some() {
        "supabase + static token"
    } else {
        "supabase"
    };
    info!(port = config.port, auth_mode, "TaskFlow server starting");

    let state = match AppState::new(config.clone()) {
        Ok(state) => state,
        Err(err) => {
            error!(error = %err, "Failed to initialize application state");
            return ExitCode::from(1);
        }
    };

    let app = create_router(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => {
            info!(addr = %bind_addr, "Listening");
            listener
        }
        Err(err) => {
            error!(error = %err, addr = %bind_addr, "Failed to bind");
            return ExitCode::from(1);
        }
    };

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    match result {
        Ok(()) => {
            info!("Server shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "Server error");
            ExitCode::from(1)
        }
    }
}

/// Completes when SIGTERM or ctrl-c is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received ctrl-c"),
        () = terminate => info!("Received SIGTERM"),
    }
}

/// Initializes tracing with an env-filterable subscriber.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
