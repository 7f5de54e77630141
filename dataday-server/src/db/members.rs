//! Support circle member database operations

use chrono::Utc;
use dataday_common::db::models::{ContactChannel, SupportCircleMember};
use dataday_common::time::parse_db_timestamp;
use dataday_common::{Error, Result};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

const MEMBER_COLUMNS: &str = "guid, user_guid, name, relationship, preferred_channel, email, \
                              phone, consent_given, consent_date, consent_method, is_active, \
                              contact_count, response_count, created_at, updated_at";

fn member_from_row(row: &SqliteRow) -> Result<SupportCircleMember> {
    let channel: String = row.get("preferred_channel");
    let consent_date: Option<String> = row.get("consent_date");

    Ok(SupportCircleMember {
        guid: row.get("guid"),
        user_guid: row.get("user_guid"),
        name: row.get("name"),
        relationship: row.get("relationship"),
        preferred_channel: ContactChannel::parse(&channel)
            .ok_or_else(|| Error::Internal(format!("Unknown contact channel: {}", channel)))?,
        email: row.get("email"),
        phone: row.get("phone"),
        consent_given: row.get("consent_given"),
        consent_date: consent_date.as_deref().map(parse_db_timestamp).transpose()?,
        consent_method: row.get("consent_method"),
        is_active: row.get("is_active"),
        contact_count: row.get("contact_count"),
        response_count: row.get("response_count"),
        created_at: parse_db_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_db_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

/// All active members for a user (consent state untouched; the consent
/// gate filters further)
pub async fn active_members(pool: &SqlitePool, user_guid: &str) -> Result<Vec<SupportCircleMember>> {
    let sql = format!(
        "SELECT {} FROM support_circle_members WHERE user_guid = ? AND is_active = 1 ORDER BY created_at",
        MEMBER_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(user_guid).fetch_all(pool).await?;
    rows.iter().map(member_from_row).collect()
}

/// Active members who have not yet granted consent (NULL or denied)
pub async fn pending_consent_members(
    pool: &SqlitePool,
    user_guid: &str,
) -> Result<Vec<SupportCircleMember>> {
    let sql = format!(
        "SELECT {} FROM support_circle_members
         WHERE user_guid = ? AND is_active = 1
           AND (consent_given IS NULL OR consent_given = 0)
         ORDER BY created_at",
        MEMBER_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(user_guid).fetch_all(pool).await?;
    rows.iter().map(member_from_row).collect()
}

/// Fetch one member by guid
pub async fn get_member(pool: &SqlitePool, guid: &str) -> Result<Option<SupportCircleMember>> {
    let sql = format!(
        "SELECT {} FROM support_circle_members WHERE guid = ?",
        MEMBER_COLUMNS
    );
    let row = sqlx::query(&sql).bind(guid).fetch_optional(pool).await?;
    row.as_ref().map(member_from_row).transpose()
}

/// Sanitized view for the public consent page: no contact addresses,
/// no counters - only what the invited person needs to see
#[derive(Debug, Serialize)]
pub struct ConsentSummary {
    pub member_guid: String,
    pub member_name: String,
    pub relationship: Option<String>,
    pub consent_given: Option<bool>,
    pub user_guid: String,
    pub user_display_name: String,
}

/// Fetch the sanitized member/owner summary for the consent page
pub async fn consent_summary(pool: &SqlitePool, member_guid: &str) -> Result<Option<ConsentSummary>> {
    let row = sqlx::query(
        "SELECT m.guid AS member_guid, m.name AS member_name, m.relationship,
                m.consent_given, u.guid AS user_guid, u.display_name
         FROM support_circle_members m
         JOIN users u ON u.guid = m.user_guid
         WHERE m.guid = ?",
    )
    .bind(member_guid)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| ConsentSummary {
        member_guid: row.get("member_guid"),
        member_name: row.get("member_name"),
        relationship: row.get("relationship"),
        consent_given: row.get("consent_given"),
        user_guid: row.get("user_guid"),
        user_display_name: row.get("display_name"),
    }))
}

/// Record a consent response. Idempotent: last write wins, re-posting the
/// same boolean leaves the row in the same end state. Returns false when
/// the member does not exist (no writes performed).
pub async fn record_consent(
    pool: &SqlitePool,
    member_guid: &str,
    consented: bool,
    method: &str,
) -> Result<bool> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        "UPDATE support_circle_members
         SET consent_given = ?, consent_date = ?, consent_method = ?, updated_at = ?
         WHERE guid = ?",
    )
    .bind(consented)
    .bind(&now)
    .bind(method)
    .bind(&now)
    .bind(member_guid)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Increment contact counters for every successful dispatch, as one unit
/// of work. `contacted` holds one guid per dispatch; a member contacted
/// twice is incremented twice.
pub async fn increment_contact_counts(pool: &SqlitePool, contacted: &[String]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;

    for guid in contacted {
        sqlx::query(
            "UPDATE support_circle_members
             SET contact_count = contact_count + 1, updated_at = ?
             WHERE guid = ?",
        )
        .bind(&now)
        .bind(guid)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Add a member during onboarding; returns the new guid
pub async fn add_member(
    pool: &SqlitePool,
    user_guid: &str,
    name: &str,
    relationship: Option<&str>,
    preferred_channel: ContactChannel,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<String> {
    let guid = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO support_circle_members
             (guid, user_guid, name, relationship, preferred_channel, email, phone)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(user_guid)
    .bind(name)
    .bind(relationship)
    .bind(preferred_channel.as_str())
    .bind(email)
    .bind(phone)
    .execute(pool)
    .await?;

    Ok(guid)
}
