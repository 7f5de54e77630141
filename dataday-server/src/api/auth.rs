//! Authentication middleware for dataday-server
//!
//! Two layers: a shared bearer token gating the daily escalation trigger,
//! and session-token authentication for end-user and admin routes.
//! Health and consent-link endpoints use neither.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{ApiError, AppState};

/// Environment variable overriding the stored cron trigger token
pub const CRON_TOKEN_ENV_VAR: &str = "ESCALATION_CRON_TOKEN";

/// Settings key holding the generated cron trigger token
const CRON_TOKEN_SETTING: &str = "escalation_cron_token";

/// Resolve the cron trigger token: environment variable first, then the
/// settings table. A missing setting is generated once and stored, so the
/// token survives restarts.
pub async fn load_cron_token(pool: &SqlitePool) -> dataday_common::Result<String> {
    if let Ok(token) = std::env::var(CRON_TOKEN_ENV_VAR) {
        if !token.is_empty() {
            info!("Using cron trigger token from {}", CRON_TOKEN_ENV_VAR);
            return Ok(token);
        }
    }

    let stored = dataday_common::db::init::setting_string(pool, CRON_TOKEN_SETTING, "").await?;
    if !stored.is_empty() {
        return Ok(stored);
    }

    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect();
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(CRON_TOKEN_SETTING)
        .bind(&token)
        .execute(pool)
        .await?;
    info!("Generated cron trigger token (stored in settings)");
    Ok(token)
}

/// Extract a bearer token from the Authorization header
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

/// Cron trigger authentication middleware
///
/// The daily escalation trigger carries a shared bearer token. Constant
/// per deployment, rotated by changing the setting or environment variable.
pub async fn cron_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match bearer_token(&request) {
        Some(token) if token == state.cron_token => Ok(next.run(request).await),
        Some(_) => {
            warn!("Escalation trigger rejected: wrong bearer token");
            Err(ApiError::Unauthorized("Invalid trigger token".to_string()))
        }
        None => Err(ApiError::Unauthorized(
            "Missing Authorization header".to_string(),
        )),
    }
}

/// Session authentication middleware
///
/// Verifies the bearer token against the session store and inserts the
/// resolved [`Session`](dataday_common::db::models::Session) into request
/// extensions for handlers to read.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?
        .to_string();

    let session = state
        .sessions
        .verify(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
