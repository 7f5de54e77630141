//! Consent endpoints
//!
//! The consent link pages are public: the member guid embedded in the
//! link is the only credential an invited contact holds. The bulk
//! send-all action is session-protected and operates on the caller's
//! own support circle.

use axum::{
    extract::{Path, State},
    Extension,
};
use dataday_common::db::models::Session;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::api::extract::Json;
use crate::db::{members, users};
use crate::escalation::consent::{send_consent_requests, ConsentSendOutcome};
use crate::{ApiError, AppState};

/// GET /consent/{member_guid}
///
/// Sanitized view for the consent page: the invited person sees who added
/// them and their current consent state, never contact addresses or
/// counters.
pub async fn summary(
    State(state): State<AppState>,
    Path(member_guid): Path<String>,
) -> Result<Json<members::ConsentSummary>, ApiError> {
    let summary = members::consent_summary(&state.db, &member_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Unknown consent link".to_string()))?;
    Ok(Json(summary))
}

/// Consent response body
#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub consented: bool,
}

/// POST /consent/{member_guid}
///
/// Records the invited person's grant or denial. Last write wins, so
/// re-submitting the same answer is harmless. An unknown guid performs no
/// writes and returns 404.
pub async fn respond(
    State(state): State<AppState>,
    Path(member_guid): Path<String>,
    Json(request): Json<ConsentRequest>,
) -> Result<Json<Value>, ApiError> {
    let found =
        members::record_consent(&state.db, &member_guid, request.consented, "web_link").await?;
    if !found {
        return Err(ApiError::NotFound("Unknown consent link".to_string()));
    }

    info!(
        member = %member_guid,
        consented = request.consented,
        "Consent response recorded"
    );
    Ok(Json(json!({
        "success": true,
        "consent_given": request.consented,
    })))
}

/// Response to the bulk consent send
#[derive(Debug, Serialize)]
pub struct SendAllResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: ConsentSendOutcome,
}

/// POST /api/consent/send-all
///
/// Sends a consent request to every active member of the caller's support
/// circle who has not yet granted consent.
pub async fn send_all(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<SendAllResponse>, ApiError> {
    let user = users::get_user(&state.db, &session.user_guid)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let outcome = send_consent_requests(&state.db, &state.notifier, &user).await?;
    info!(
        user = %user.guid,
        requested = outcome.requested,
        failed = outcome.failed,
        skipped = outcome.skipped,
        "Bulk consent send complete"
    );

    Ok(Json(SendAllResponse {
        success: true,
        outcome,
    }))
}
