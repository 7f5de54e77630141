//! # Dataday Common Library
//!
//! Shared code for the dataday escalation service including:
//! - Database models and initialization
//! - Error types
//! - Configuration and root folder resolution
//! - Timezone-aware day arithmetic

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
