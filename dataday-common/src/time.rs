//! Timezone-aware day arithmetic
//!
//! The miss detector counts whole calendar days. A "day" is anchored on the
//! user's stored IANA timezone, not UTC: a user in Denver logging at 23:00
//! local must not be marked missed because UTC already rolled over.
//! An unparseable or missing timezone falls back to UTC.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a timestamp column written either by this service (RFC 3339) or by
/// SQLite's CURRENT_TIMESTAMP default (`YYYY-MM-DD HH:MM:SS`, UTC)
pub fn parse_db_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| Error::Internal(format!("Invalid timestamp '{}': {}", s, e)))
}

/// Parse an IANA timezone name, falling back to UTC
pub fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Calendar date "today" as seen from the given timezone name
pub fn local_date(timezone: &str, at: DateTime<Utc>) -> NaiveDate {
    let tz = parse_timezone(timezone);
    at.with_timezone(&tz).date_naive()
}

/// Whole days elapsed from `since` to `today` (0 when same day or later)
pub fn days_since(since: NaiveDate, today: NaiveDate) -> i64 {
    (today - since).num_days().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timezone_valid() {
        assert_eq!(parse_timezone("America/Denver"), chrono_tz::America::Denver);
    }

    #[test]
    fn test_parse_timezone_invalid_falls_back_to_utc() {
        assert_eq!(parse_timezone("Not/AZone"), Tz::UTC);
        assert_eq!(parse_timezone(""), Tz::UTC);
    }

    #[test]
    fn test_local_date_lags_utc_west_of_greenwich() {
        // 2025-06-15 03:00 UTC is still 2025-06-14 in Denver (UTC-6 in June)
        let at = Utc.with_ymd_and_hms(2025, 6, 15, 3, 0, 0).unwrap();
        assert_eq!(
            local_date("America/Denver", at),
            NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
        );
        assert_eq!(
            local_date("UTC", at),
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
        );
    }

    #[test]
    fn test_parse_db_timestamp_formats() {
        let rfc = parse_db_timestamp("2025-06-15T03:00:00+00:00").unwrap();
        let sqlite = parse_db_timestamp("2025-06-15 03:00:00").unwrap();
        assert_eq!(rfc, sqlite);
        assert!(parse_db_timestamp("not a timestamp").is_err());
    }

    #[test]
    fn test_days_since() {
        let a = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(days_since(a, b), 5);
        assert_eq!(days_since(b, b), 0);
        // Creation date in the future clamps to zero
        assert_eq!(days_since(b, a), 0);
    }
}
