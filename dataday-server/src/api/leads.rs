//! Admin lead CRM endpoints
//!
//! All handlers sit behind the session middleware and additionally
//! require the session's admin flag. A non-admin session gets 401
//! rather than 403, so the endpoints do not confirm their existence
//! to regular users.

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use dataday_common::db::models::{Lead, LeadStatus, Session};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::extract::Json;
use crate::db::leads;
use crate::{ApiError, AppState};

fn require_admin(session: &Session) -> Result<(), ApiError> {
    if session.is_admin {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("Admin session required".to_string()))
    }
}

/// Query parameters for lead listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// GET /api/admin/leads
///
/// Lists leads, newest first, optionally filtered by status.
pub async fn list_leads(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    require_admin(&session)?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            LeadStatus::parse(s)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown lead status: {}", s)))?,
        ),
        None => None,
    };

    let leads = leads::list_leads(&state.db, status).await?;
    Ok(Json(leads))
}

/// Lead creation body
#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub phone: String,
    pub name: Option<String>,
}

/// POST /api/admin/leads
///
/// Creates a lead in 'new' status.
pub async fn create_lead(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateLeadRequest>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&session)?;

    if request.phone.trim().is_empty() {
        return Err(ApiError::BadRequest("Phone must not be empty".to_string()));
    }

    let guid = leads::create_lead(&state.db, request.phone.trim(), request.name.as_deref()).await?;
    info!(lead = %guid, "Lead created");
    Ok(Json(json!({ "success": true, "guid": guid })))
}

/// Status update body
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /api/admin/leads/{guid}/status
///
/// Moves a lead along the call flow. Backward or skipping transitions are
/// rejected with 400; 'lost' is reachable from any non-terminal status.
pub async fn update_lead_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(guid): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Lead>, ApiError> {
    require_admin(&session)?;

    let new_status = LeadStatus::parse(&request.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown lead status: {}", request.status)))?;

    let lead = leads::update_status(&state.db, &guid, new_status).await?;
    info!(lead = %guid, status = new_status.as_str(), "Lead status updated");
    Ok(Json(lead))
}
