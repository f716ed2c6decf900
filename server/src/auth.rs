//! Authentication for the task API.
//!
//! Every task route requires a bearer token in the `Authorization` header.
//! Tokens resolve to a user in this order:
//!
//! 1. **Unsafe mode** (`TASKFLOW_UNSAFE_NO_AUTH=true`) - no token required;
//!    all requests act as a fixed local user. Development only.
//! 2. **Static API token** (`TASKFLOW_API_TOKEN`) - the presented token is
//!    compared in constant time; a match acts as the local user.
//! 3. **Supabase JWT** - the token is validated upstream via
//!    `/auth/v1/user`, which also handles expiry and revocation.
//!
//! The resolved [`AuthSession`] carries the validated JWT (when there is
//! one) so task statements can forward it to PostgREST for row-level
//! security.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::supabase::{SupabaseClient, SupabaseError};

/// Fixed user id used by unsafe mode and the static API token.
pub const LOCAL_USER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Errors that can occur while authenticating a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The request carries no bearer token.
    #[error("missing bearer token")]
    MissingToken,

    /// The bearer token is invalid or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// The auth provider could not be reached to validate the token.
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    /// User identifier, used to scope every task statement.
    pub id: String,

    /// The user's email address, if known.
    pub email: Option<String>,
}

/// A resolved authentication session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// The authenticated user.
    pub user: AuthedUser,

    /// The validated JWT to forward to PostgREST, when the session came
    /// from Supabase. Local sessions (unsafe mode, static token) carry no
    /// JWT and fall back to the anon key.
    pub forward_jwt: Option<String>,
}

impl AuthSession {
    fn local() -> Self {
        Self {
            user: AuthedUser {
                id: LOCAL_USER_ID.to_string(),
                email: None,
            },
            forward_jwt: None,
        }
    }
}

/// Extracts the bearer token from the `Authorization` header.
#[must_use]
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Compares a presented token against the expected one in constant time.
#[must_use]
pub fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Authenticates a request against the configured modes.
///
/// # Errors
///
/// - [`AuthError::MissingToken`] - no bearer token and auth is enabled
/// - [`AuthError::InvalidToken`] - the token matched no mode
/// - [`AuthError::Unavailable`] - Supabase could not be reached
pub async fn authenticate(
    config: &Config,
    supabase: &SupabaseClient,
    headers: &HeaderMap,
) -> Result<AuthSession, AuthError> {
    if config.unsafe_no_auth {
        debug!("unsafe mode: skipping authentication");
        return Ok(AuthSession::local());
    }

    let token = extract_bearer(headers).ok_or(AuthError::MissingToken)?;

    if let Some(expected) = &config.api_token {
        if token_matches(token, expected) {
            debug!("request authenticated via static API token");
            return Ok(AuthSession::local());
        }
    }

    match supabase.validate_jwt(token).await {
        Ok(user) => Ok(AuthSession {
            user: AuthedUser {
                id: user.id,
                email: user.email,
            },
            forward_jwt: Some(token.to_string()),
        }),
        Err(SupabaseError::Unauthorized) => Err(AuthError::InvalidToken),
        Err(err) => Err(AuthError::Unavailable(err.to_string())),
    }
}
