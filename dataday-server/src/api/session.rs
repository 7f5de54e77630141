//! Session endpoints (login / logout)

use axum::{extract::State, http::header::AUTHORIZATION, http::HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::extract::Json;
use crate::db::users;
use crate::session::hash_password;
use crate::{ApiError, AppState};

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_guid: String,
    pub display_name: String,
    pub is_admin: bool,
    pub expires_at: String,
}

/// POST /api/session
///
/// Verifies credentials and issues a session token. Unknown email and
/// wrong password return the same 401 message.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let creds = users::get_credentials_by_email(&state.db, &request.email)
        .await?
        .ok_or_else(invalid)?;

    if hash_password(&request.password, &creds.password_salt) != creds.password_hash {
        warn!(email = %request.email, "Login rejected: wrong password");
        return Err(invalid());
    }

    let session = state
        .sessions
        .create(&creds.user.guid, creds.user.is_admin)
        .await?;
    info!(user = %creds.user.guid, "Session created");

    Ok(Json(LoginResponse {
        token: session.token,
        user_guid: creds.user.guid,
        display_name: creds.user.display_name,
        is_admin: creds.user.is_admin,
        expires_at: session.expires_at.to_rfc3339(),
    }))
}

/// DELETE /api/session
///
/// Revokes the bearer token. Idempotent: an unknown or already-revoked
/// token still returns success.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    state.sessions.revoke(token).await?;
    Ok(Json(json!({ "success": true })))
}
