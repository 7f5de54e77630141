//! HTTP API module for dataday-server

pub mod auth;
pub mod consent;
pub mod escalations;
pub mod extract;
pub mod health;
pub mod leads;
pub mod session;

pub use auth::load_cron_token;
