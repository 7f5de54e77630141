//! Escalation policy
//!
//! Pure threshold function mapping consecutive-miss count and subscription
//! tier to an action. Recomputed fresh each run; there is no policy state,
//! so no double-notification bookkeeping beyond the contact counters the
//! notifier maintains.

use dataday_common::db::init::setting_i64;
use dataday_common::db::models::SubscriptionTier;
use dataday_common::Result;
use sqlx::SqlitePool;

/// Action tier, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EscalationAction {
    /// No action
    None,
    /// Internal encouragement to the goal owner only
    SelfNudge,
    /// Notify consented support circle members
    NotifySupportCircle,
    /// Notify every eligible member (sustained miss streak)
    NotifyAllContacts,
}

/// Miss-count thresholds, loaded from settings so business can retune
/// without a rebuild
#[derive(Debug, Clone, Copy)]
pub struct PolicyThresholds {
    /// Consecutive misses before a free-tier user's circle is notified
    pub free_days: u32,
    /// Consecutive misses before a premium user's circle is notified
    /// (premium shortens the delay)
    pub premium_days: u32,
    /// Additional misses beyond the circle threshold before broadcasting
    /// to all contacts
    pub broadcast_extra_days: u32,
}

impl PolicyThresholds {
    /// Load thresholds from the settings table
    pub async fn load(pool: &SqlitePool) -> Result<Self> {
        // Negative operator values clamp to zero rather than wrapping
        Ok(Self {
            free_days: setting_i64(pool, "escalation_threshold_free_days", 2)
                .await?
                .max(0) as u32,
            premium_days: setting_i64(pool, "escalation_threshold_premium_days", 1)
                .await?
                .max(0) as u32,
            broadcast_extra_days: setting_i64(pool, "escalation_broadcast_extra_days", 3)
                .await?
                .max(0) as u32,
        })
    }

    /// Circle-notify threshold for a tier
    pub fn circle_days(&self, tier: SubscriptionTier) -> u32 {
        match tier {
            SubscriptionTier::Free => self.free_days,
            SubscriptionTier::Premium => self.premium_days,
        }
    }
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            free_days: 2,
            premium_days: 1,
            broadcast_extra_days: 3,
        }
    }
}

/// Map a consecutive-miss count to an action for the given tier.
///
/// Monotonic: for a fixed tier, more misses never yields a lesser action.
pub fn escalation_action(
    consecutive_misses: u32,
    tier: SubscriptionTier,
    thresholds: &PolicyThresholds,
) -> EscalationAction {
    let circle = thresholds.circle_days(tier).max(1);
    let broadcast = circle + thresholds.broadcast_extra_days;

    if consecutive_misses == 0 {
        EscalationAction::None
    } else if consecutive_misses < circle {
        EscalationAction::SelfNudge
    } else if consecutive_misses < broadcast {
        EscalationAction::NotifySupportCircle
    } else {
        EscalationAction::NotifyAllContacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_misses_no_action() {
        let t = PolicyThresholds::default();
        assert_eq!(
            escalation_action(0, SubscriptionTier::Free, &t),
            EscalationAction::None
        );
        assert_eq!(
            escalation_action(0, SubscriptionTier::Premium, &t),
            EscalationAction::None
        );
    }

    #[test]
    fn test_free_tier_escalates_at_two_days() {
        let t = PolicyThresholds::default();
        assert_eq!(
            escalation_action(1, SubscriptionTier::Free, &t),
            EscalationAction::SelfNudge
        );
        assert_eq!(
            escalation_action(2, SubscriptionTier::Free, &t),
            EscalationAction::NotifySupportCircle
        );
    }

    #[test]
    fn test_premium_tier_escalates_same_day() {
        let t = PolicyThresholds::default();
        assert_eq!(
            escalation_action(1, SubscriptionTier::Premium, &t),
            EscalationAction::NotifySupportCircle
        );
    }

    #[test]
    fn test_sustained_streak_broadcasts() {
        let t = PolicyThresholds::default();
        assert_eq!(
            escalation_action(5, SubscriptionTier::Free, &t),
            EscalationAction::NotifyAllContacts
        );
        assert_eq!(
            escalation_action(4, SubscriptionTier::Premium, &t),
            EscalationAction::NotifyAllContacts
        );
    }

    #[test]
    fn test_monotonic_in_misses_for_fixed_tier() {
        let t = PolicyThresholds::default();
        for tier in [SubscriptionTier::Free, SubscriptionTier::Premium] {
            let mut previous = EscalationAction::None;
            for misses in 0..30 {
                let action = escalation_action(misses, tier, &t);
                assert!(
                    action >= previous,
                    "action regressed at {} misses for {:?}",
                    misses,
                    tier
                );
                previous = action;
            }
        }
    }

    #[tokio::test]
    async fn test_load_clamps_negative_settings() {
        use sqlx::sqlite::SqlitePoolOptions;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        dataday_common::db::init::create_schema(&pool).await.unwrap();
        dataday_common::db::init::init_default_settings(&pool).await.unwrap();

        sqlx::query("UPDATE settings SET value = '-5' WHERE key = 'escalation_threshold_free_days'")
            .execute(&pool)
            .await
            .unwrap();

        let t = PolicyThresholds::load(&pool).await.unwrap();
        assert_eq!(t.free_days, 0);
        // Circle notification still fires on the first miss, never disables
        assert_eq!(
            escalation_action(1, SubscriptionTier::Free, &t),
            EscalationAction::NotifySupportCircle
        );
    }

    #[test]
    fn test_degenerate_zero_threshold_still_nudges_first() {
        // A misconfigured threshold of 0 must not make 0 misses escalate
        let t = PolicyThresholds {
            free_days: 0,
            premium_days: 0,
            broadcast_extra_days: 3,
        };
        assert_eq!(
            escalation_action(0, SubscriptionTier::Free, &t),
            EscalationAction::None
        );
        assert_eq!(
            escalation_action(1, SubscriptionTier::Free, &t),
            EscalationAction::NotifySupportCircle
        );
    }
}
