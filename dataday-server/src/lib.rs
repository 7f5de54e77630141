//! dataday-server library - goal accountability escalation service
//!
//! Hosts the daily escalation pipeline (miss detection, escalation policy,
//! consent gate, notification dispatch) and the consent / session / admin
//! CRM HTTP endpoints around it.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;

pub mod api;
pub mod db;
pub mod error;
pub mod escalation;
pub mod notify;
pub mod session;

pub use error::ApiError;

use notify::Notifier;
use session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Notification dispatcher (email + SMS)
    pub notifier: Arc<Notifier>,
    /// Session store backing authenticated end-user and admin requests
    pub sessions: Arc<dyn SessionStore>,
    /// Bearer token expected on the daily escalation trigger
    pub cron_token: String,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        notifier: Arc<Notifier>,
        sessions: Arc<dyn SessionStore>,
        cron_token: String,
    ) -> Self {
        Self {
            db,
            notifier,
            sessions,
            cron_token,
        }
    }
}

/// Build application router
///
/// Route groups:
/// - cron-protected: the daily escalation trigger
/// - session-protected: consent bulk send and the admin lead CRM
/// - public: health, consent links, login/logout
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};
    use tower_http::trace::TraceLayer;

    // Daily trigger, authenticated by the cron bearer token
    let cron = Router::new()
        .route("/api/escalations/process", post(api::escalations::process))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::cron_auth_middleware,
        ));

    // End-user / admin routes, authenticated by session token
    let session_protected = Router::new()
        .route("/api/consent/send-all", post(api::consent::send_all))
        .route(
            "/api/admin/leads",
            get(api::leads::list_leads).post(api::leads::create_lead),
        )
        .route(
            "/api/admin/leads/:guid/status",
            put(api::leads::update_lead_status),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::session_auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route(
            "/consent/:member_guid",
            get(api::consent::summary).post(api::consent::respond),
        )
        .route(
            "/api/session",
            post(api::session::login).delete(api::session::logout),
        )
        .merge(api::health::health_routes());

    Router::new()
        .merge(cron)
        .merge(session_protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
