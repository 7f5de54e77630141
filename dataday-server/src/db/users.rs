//! User database operations

use dataday_common::db::models::{SubscriptionTier, User};
use dataday_common::time::parse_db_timestamp;
use dataday_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::session::{generate_salt, hash_password};

/// A user row together with its login credentials
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
    pub password_salt: String,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let tier: String = row.get("subscription_tier");
    let subscription_tier = SubscriptionTier::parse(&tier)
        .ok_or_else(|| Error::Internal(format!("Unknown subscription tier: {}", tier)))?;

    Ok(User {
        guid: row.get("guid"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        timezone: row.get("timezone"),
        subscription_tier,
        is_admin: row.get("is_admin"),
        created_at: parse_db_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_db_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

/// List all users (the daily run iterates every user)
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(
        "SELECT guid, email, display_name, timezone, subscription_tier, is_admin, created_at, updated_at
         FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(user_from_row).collect()
}

/// Fetch a user by guid
pub async fn get_user(pool: &SqlitePool, guid: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT guid, email, display_name, timezone, subscription_tier, is_admin, created_at, updated_at
         FROM users WHERE guid = ?",
    )
    .bind(guid)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Fetch a user with credentials by email (login path)
pub async fn get_credentials_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<UserCredentials>> {
    let row = sqlx::query(
        "SELECT guid, email, display_name, timezone, subscription_tier, is_admin,
                password_hash, password_salt, created_at, updated_at
         FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(UserCredentials {
        user: user_from_row(&row)?,
        password_hash: row.get("password_hash"),
        password_salt: row.get("password_salt"),
    }))
}

/// Create a user with a salted password hash; returns the new guid
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    display_name: &str,
    timezone: &str,
    tier: SubscriptionTier,
    password: &str,
) -> Result<String> {
    let guid = Uuid::new_v4().to_string();
    let salt = generate_salt();
    let hash = hash_password(password, &salt);

    sqlx::query(
        "INSERT INTO users (guid, email, display_name, timezone, subscription_tier,
                            password_hash, password_salt)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(email)
    .bind(display_name)
    .bind(timezone)
    .bind(tier.as_str())
    .bind(&hash)
    .bind(&salt)
    .execute(pool)
    .await?;

    Ok(guid)
}
