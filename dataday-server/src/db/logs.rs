//! Daily log database operations
//!
//! Logs are written when a user records progress and are immutable after
//! that. Skipped days get no row; the miss detector reads absence as a miss.

use chrono::NaiveDate;
use dataday_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Dates with a completed log for the goal, from `since` onward
pub async fn completed_dates(
    pool: &SqlitePool,
    goal_guid: &str,
    since: NaiveDate,
) -> Result<BTreeSet<NaiveDate>> {
    let rows: Vec<String> = sqlx::query_scalar(
        "SELECT log_date FROM daily_logs
         WHERE goal_guid = ? AND completed = 1 AND log_date >= ?
         ORDER BY log_date",
    )
    .bind(goal_guid)
    .bind(since.format("%Y-%m-%d").to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| Error::Internal(format!("Invalid log_date '{}': {}", s, e)))
        })
        .collect()
}

/// Record one day's progress; returns the new guid.
/// The (goal, date) UNIQUE constraint rejects a second row for the same day.
pub async fn record_log(
    pool: &SqlitePool,
    goal_guid: &str,
    user_guid: &str,
    log_date: NaiveDate,
    completed: bool,
    notes: Option<&str>,
) -> Result<String> {
    let guid = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO daily_logs (guid, goal_guid, user_guid, log_date, completed, notes)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&guid)
    .bind(goal_guid)
    .bind(user_guid)
    .bind(log_date.format("%Y-%m-%d").to_string())
    .bind(completed)
    .bind(notes)
    .execute(pool)
    .await?;

    Ok(guid)
}
