//! Miss detector
//!
//! Counts consecutive missed days for a goal, ending at "today" in the
//! user's timezone. A day is missed when no completed log exists for it;
//! skipped days have no row at all, so absence is the signal.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;

/// Count consecutive missed days ending at `today`.
///
/// Walks dates backward from `today`, stopping at the first day with a
/// completed log. A goal with no logs counts as missed since its creation
/// date (the creation day itself does not count). The walk never exceeds
/// `lookback_days`.
pub fn consecutive_misses(
    today: NaiveDate,
    created_on: NaiveDate,
    completed_dates: &BTreeSet<NaiveDate>,
    lookback_days: u32,
) -> u32 {
    let mut misses = 0;
    for offset in 0..lookback_days {
        let date = today - Duration::days(offset as i64);
        if completed_dates.contains(&date) {
            break;
        }
        if date <= created_on {
            break;
        }
        misses += 1;
    }
    misses
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_completed_today_means_zero_misses() {
        let today = date(2025, 6, 15);
        let completed = BTreeSet::from([today]);
        assert_eq!(consecutive_misses(today, date(2025, 6, 1), &completed, 14), 0);
    }

    #[test]
    fn test_last_completed_three_days_ago() {
        let today = date(2025, 6, 15);
        let completed = BTreeSet::from([date(2025, 6, 12)]);
        assert_eq!(consecutive_misses(today, date(2025, 6, 1), &completed, 14), 3);
    }

    #[test]
    fn test_zero_logs_counts_days_since_creation() {
        let today = date(2025, 6, 15);
        let completed = BTreeSet::new();
        assert_eq!(consecutive_misses(today, date(2025, 6, 10), &completed, 14), 5);
    }

    #[test]
    fn test_zero_logs_capped_by_lookback_window() {
        let today = date(2025, 6, 15);
        let completed = BTreeSet::new();
        // Created long ago: capped at the window
        assert_eq!(consecutive_misses(today, date(2024, 1, 1), &completed, 14), 14);
        assert_eq!(consecutive_misses(today, date(2024, 1, 1), &completed, 7), 7);
    }

    #[test]
    fn test_goal_created_today_has_no_misses() {
        let today = date(2025, 6, 15);
        let completed = BTreeSet::new();
        assert_eq!(consecutive_misses(today, today, &completed, 14), 0);
    }

    #[test]
    fn test_older_completions_do_not_interrupt_the_walk() {
        let today = date(2025, 6, 15);
        // Last completed 2025-06-10; the five days since are all missed
        let completed = BTreeSet::from([date(2025, 6, 10), date(2025, 6, 8)]);
        assert_eq!(consecutive_misses(today, date(2025, 6, 1), &completed, 14), 5);
    }
}
