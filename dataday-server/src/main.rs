//! dataday-server - Goal accountability escalation service
//!
//! Users set goals and log daily progress; when goals are missed, the
//! escalation pipeline notifies the user's consented Emergency Support Team
//! via email (Resend) and SMS (Twilio). An external scheduler invokes the
//! daily trigger over HTTP.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use dataday_common::config::{self, ServerConfig};
use dataday_common::db::init::init_database;
use dataday_server::api::auth::load_cron_token;
use dataday_server::notify::Notifier;
use dataday_server::session::SqliteSessionStore;
use dataday_server::{build_router, AppState};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "dataday-server", about = "Goal accountability escalation service")]
struct Args {
    /// Root folder holding the database (overrides DATADAY_ROOT and config file)
    #[arg(long)]
    root_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting dataday-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    // Resolve root folder: CLI arg > env var > config file > OS default
    let root_folder = config::resolve_root_folder(args.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)?;

    let db_path = config::database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("✓ Database initialized");

    // Cron token for the daily escalation trigger (generated on first run,
    // ESCALATION_CRON_TOKEN env var overrides)
    let cron_token = load_cron_token(&pool).await?;
    info!("✓ Escalation cron token loaded");

    // Notification providers from environment; unset credentials leave the
    // channel failing per-contact at dispatch time, which the pipeline logs
    let notifier = Notifier::from_env(&pool).await?;
    if std::env::var("RESEND_API_KEY").unwrap_or_default().is_empty() {
        warn!("RESEND_API_KEY not set - email dispatch will fail");
    }
    if std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default().is_empty() {
        warn!("TWILIO_AUTH_TOKEN not set - SMS dispatch will fail");
    }

    let sessions = Arc::new(SqliteSessionStore::new(pool.clone()).await?);

    let state = AppState::new(pool.clone(), Arc::new(notifier), sessions, cron_token);
    let app = build_router(state);

    let server_config = ServerConfig::load(&pool).await?;
    let listener = tokio::net::TcpListener::bind(server_config.bind_addr()).await?;
    info!("dataday-server listening on http://{}", server_config.bind_addr());
    info!("Health check: http://{}/health", server_config.bind_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
