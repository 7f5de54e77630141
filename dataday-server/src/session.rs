//! Session store
//!
//! Explicit session abstraction (create / verify / revoke) backed by a
//! database table, replacing cookie-held mutable session state. Handlers
//! depend on the [`SessionStore`] trait, so tests can substitute their own
//! store without cookies or HTTP round-trips.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dataday_common::db::init::setting_i64;
use dataday_common::db::models::Session;
use dataday_common::time::parse_db_timestamp;
use dataday_common::Result;
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};

/// Length of generated session tokens
const TOKEN_LEN: usize = 48;

/// Durable session store: create, verify, revoke
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a session for the user; returns the stored session with token
    async fn create(&self, user_guid: &str, is_admin: bool) -> Result<Session>;

    /// Look up a token; returns None for unknown or expired tokens
    async fn verify(&self, token: &str) -> Result<Option<Session>>;

    /// Revoke a token; unknown tokens are a no-op
    async fn revoke(&self, token: &str) -> Result<()>;
}

/// SQLite-backed session store
pub struct SqliteSessionStore {
    pool: SqlitePool,
    timeout_seconds: i64,
}

impl SqliteSessionStore {
    /// Create a store, reading the session timeout from settings
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let timeout_seconds = setting_i64(&pool, "session_timeout_seconds", 1_209_600).await?;
        Ok(Self {
            pool,
            timeout_seconds,
        })
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, user_guid: &str, is_admin: bool) -> Result<Session> {
        let token = generate_token();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::seconds(self.timeout_seconds);

        sqlx::query(
            "INSERT INTO sessions (token, user_guid, is_admin, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token)
        .bind(user_guid)
        .bind(is_admin)
        .bind(created_at.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Session {
            token,
            user_guid: user_guid.to_string(),
            is_admin,
            created_at,
            expires_at,
        })
    }

    async fn verify(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, user_guid, is_admin, created_at, expires_at
             FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at = parse_db_timestamp(&row.get::<String, _>("expires_at"))?;
        if expires_at <= Utc::now() {
            // Expired sessions are removed on sight
            self.revoke(token).await?;
            return Ok(None);
        }

        Ok(Some(Session {
            token: row.get("token"),
            user_guid: row.get("user_guid"),
            is_admin: row.get("is_admin"),
            created_at: parse_db_timestamp(&row.get::<String, _>("created_at"))?,
            expires_at,
        }))
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Salted password hash: SHA-256 over salt + password, as lowercase hex
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate a random password salt
pub fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}
