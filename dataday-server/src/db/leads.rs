//! Lead CRM database operations (admin call flow)

use chrono::Utc;
use dataday_common::db::models::{Lead, LeadStatus};
use dataday_common::time::parse_db_timestamp;
use dataday_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

const LEAD_COLUMNS: &str =
    "guid, phone, name, status, contacted_at, qualified_at, converted_at, created_at, updated_at";

fn lead_from_row(row: &SqliteRow) -> Result<Lead> {
    let status: String = row.get("status");
    let parse_opt = |col: &str| -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        row.get::<Option<String>, _>(col)
            .as_deref()
            .map(parse_db_timestamp)
            .transpose()
    };

    Ok(Lead {
        guid: row.get("guid"),
        phone: row.get("phone"),
        name: row.get("name"),
        status: LeadStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown lead status: {}", status)))?,
        contacted_at: parse_opt("contacted_at")?,
        qualified_at: parse_opt("qualified_at")?,
        converted_at: parse_opt("converted_at")?,
        created_at: parse_db_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_db_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

/// List leads, optionally filtered by status, newest first
pub async fn list_leads(pool: &SqlitePool, status: Option<LeadStatus>) -> Result<Vec<Lead>> {
    let rows = match status {
        Some(status) => {
            let sql = format!(
                "SELECT {} FROM leads WHERE status = ? ORDER BY created_at DESC",
                LEAD_COLUMNS
            );
            sqlx::query(&sql)
                .bind(status.as_str())
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("SELECT {} FROM leads ORDER BY created_at DESC", LEAD_COLUMNS);
            sqlx::query(&sql).fetch_all(pool).await?
        }
    };
    rows.iter().map(lead_from_row).collect()
}

/// Fetch one lead by guid
pub async fn get_lead(pool: &SqlitePool, guid: &str) -> Result<Option<Lead>> {
    let sql = format!("SELECT {} FROM leads WHERE guid = ?", LEAD_COLUMNS);
    let row = sqlx::query(&sql).bind(guid).fetch_optional(pool).await?;
    row.as_ref().map(lead_from_row).transpose()
}

/// Create a lead in 'new' status; returns the new guid
pub async fn create_lead(pool: &SqlitePool, phone: &str, name: Option<&str>) -> Result<String> {
    let guid = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO leads (guid, phone, name) VALUES (?, ?, ?)")
        .bind(&guid)
        .bind(phone)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(guid)
}

/// Move a lead to a new status, enforcing the forward-only call flow.
/// Stamps the milestone timestamp for the status being entered.
pub async fn update_status(pool: &SqlitePool, guid: &str, new_status: LeadStatus) -> Result<Lead> {
    let lead = get_lead(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Lead not found: {}", guid)))?;

    if !lead.status.can_transition_to(new_status) {
        return Err(Error::InvalidInput(format!(
            "Invalid lead transition: {} -> {}",
            lead.status.as_str(),
            new_status.as_str()
        )));
    }

    let now = Utc::now().to_rfc3339();
    let milestone = match new_status {
        LeadStatus::Contacted => Some("contacted_at"),
        LeadStatus::Qualified => Some("qualified_at"),
        LeadStatus::Converted => Some("converted_at"),
        LeadStatus::New | LeadStatus::Lost => None,
    };

    let sql = match milestone {
        Some(col) => format!(
            "UPDATE leads SET status = ?, {} = ?, updated_at = ? WHERE guid = ?",
            col
        ),
        None => "UPDATE leads SET status = ?, updated_at = ? WHERE guid = ?".to_string(),
    };

    let mut query = sqlx::query(&sql).bind(new_status.as_str());
    if milestone.is_some() {
        query = query.bind(&now);
    }
    query.bind(&now).bind(guid).execute(pool).await?;

    get_lead(pool, guid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Lead not found: {}", guid)))
}
