//! Escalation trigger endpoint

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::escalation::{process_escalations, RunSummary};
use crate::{ApiError, AppState};

/// Response to the escalation trigger
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub summary: RunSummary,
}

/// POST /api/escalations/process
///
/// Runs the full escalation pipeline for every user. Safe to invoke more
/// than once per day: already-claimed (user, date) pairs are skipped.
pub async fn process(State(state): State<AppState>) -> Result<Json<ProcessResponse>, ApiError> {
    info!("Escalation trigger received");
    let summary = process_escalations(&state.db, &state.notifier).await?;

    Ok(Json(ProcessResponse {
        success: true,
        message: summary.describe(),
        timestamp: Utc::now().to_rfc3339(),
        summary,
    }))
}
