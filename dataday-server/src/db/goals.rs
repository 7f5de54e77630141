//! Goal database operations

use dataday_common::db::models::{Goal, GoalFrequency, GoalStatus};
use dataday_common::time::parse_db_timestamp;
use dataday_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn goal_from_row(row: &SqliteRow) -> Result<Goal> {
    let frequency: String = row.get("frequency");
    let status: String = row.get("status");

    Ok(Goal {
        guid: row.get("guid"),
        user_guid: row.get("user_guid"),
        title: row.get("title"),
        frequency: GoalFrequency::parse(&frequency)
            .ok_or_else(|| Error::Internal(format!("Unknown goal frequency: {}", frequency)))?,
        status: GoalStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown goal status: {}", status)))?,
        escalation_enabled: row.get("escalation_enabled"),
        created_at: parse_db_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_db_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

/// Goals eligible for the escalation walk: active, escalation enabled,
/// daily frequency. Weekly/monthly goals are stored but never escalated.
pub async fn escalatable_goals(pool: &SqlitePool, user_guid: &str) -> Result<Vec<Goal>> {
    let rows = sqlx::query(
        "SELECT guid, user_guid, title, frequency, status, escalation_enabled,
                created_at, updated_at
         FROM goals
         WHERE user_guid = ?
           AND status = 'active'
           AND escalation_enabled = 1
           AND frequency = 'daily'
         ORDER BY created_at",
    )
    .bind(user_guid)
    .fetch_all(pool)
    .await?;

    rows.iter().map(goal_from_row).collect()
}

/// Create a goal; returns the new guid
pub async fn create_goal(
    pool: &SqlitePool,
    user_guid: &str,
    title: &str,
    frequency: GoalFrequency,
) -> Result<String> {
    let guid = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO goals (guid, user_guid, title, frequency) VALUES (?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(user_guid)
    .bind(title)
    .bind(frequency.as_str())
    .execute(pool)
    .await?;

    Ok(guid)
}
