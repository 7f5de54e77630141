//! Escalation run ledger
//!
//! Each (user, local date) pair gets at most one escalation run.
//! Claiming a run is an INSERT OR IGNORE against a unique index, so
//! concurrent or repeated triggers for the same day collapse to a
//! single winner.

use chrono::NaiveDate;
use dataday_common::Result;
use sqlx::SqlitePool;

/// Try to claim the run for (user, date). Returns true when this caller
/// won the claim; false when the run already happened today.
pub async fn claim_run(pool: &SqlitePool, user_guid: &str, run_date: NaiveDate) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO escalation_runs (user_guid, run_date) VALUES (?, ?)",
    )
    .bind(user_guid)
    .bind(run_date.format("%Y-%m-%d").to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}
