//! Database models
//!
//! All rows use TEXT UUID primary keys (`guid`) and RFC 3339 timestamps.
//! Enum-valued columns are stored as snake_case TEXT with CHECK constraints;
//! the enums below provide the canonical string forms.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Subscription tier, drives escalation delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(SubscriptionTier::Free),
            "premium" => Some(SubscriptionTier::Premium),
            _ => None,
        }
    }
}

/// Goal target frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl GoalFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalFrequency::Daily => "daily",
            GoalFrequency::Weekly => "weekly",
            GoalFrequency::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(GoalFrequency::Daily),
            "weekly" => Some(GoalFrequency::Weekly),
            "monthly" => Some(GoalFrequency::Monthly),
            _ => None,
        }
    }
}

/// Goal lifecycle status. Goals are archived, never hard-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Paused => "paused",
            GoalStatus::Completed => "completed",
            GoalStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(GoalStatus::Active),
            "paused" => Some(GoalStatus::Paused),
            "completed" => Some(GoalStatus::Completed),
            "archived" => Some(GoalStatus::Archived),
            _ => None,
        }
    }
}

/// Preferred contact channel for a support circle member
///
/// `phone` is a stored preference from onboarding; dispatch treats it as SMS
/// (voice calls are not a delivery channel of this service).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactChannel {
    Email,
    Sms,
    Phone,
}

impl ContactChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactChannel::Email => "email",
            ContactChannel::Sms => "sms",
            ContactChannel::Phone => "phone",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(ContactChannel::Email),
            "sms" => Some(ContactChannel::Sms),
            "phone" => Some(ContactChannel::Phone),
            _ => None,
        }
    }

    /// Whether dispatch for this preference goes out as SMS
    pub fn is_sms(&self) -> bool {
        matches!(self, ContactChannel::Sms | ContactChannel::Phone)
    }
}

/// Sales lead status (admin CRM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(LeadStatus::New),
            "contacted" => Some(LeadStatus::Contacted),
            "qualified" => Some(LeadStatus::Qualified),
            "converted" => Some(LeadStatus::Converted),
            "lost" => Some(LeadStatus::Lost),
            _ => None,
        }
    }

    /// Valid forward transitions in the lead call flow.
    /// `lost` is reachable from any non-terminal stage.
    pub fn can_transition_to(&self, next: LeadStatus) -> bool {
        use LeadStatus::*;
        match (self, next) {
            (New, Contacted) | (Contacted, Qualified) | (Qualified, Converted) => true,
            (New, Lost) | (Contacted, Lost) | (Qualified, Lost) => true,
            _ => false,
        }
    }
}

/// Application user (goal owner)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub guid: String,
    pub email: String,
    pub display_name: String,
    /// IANA timezone name, e.g. "America/Denver"; falls back to UTC
    pub timezone: String,
    pub subscription_tier: SubscriptionTier,
    /// Grants access to the lead CRM endpoints
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub guid: String,
    pub user_guid: String,
    pub title: String,
    pub frequency: GoalFrequency,
    pub status: GoalStatus,
    pub escalation_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One daily progress entry. One row intended per (goal, date);
/// absence of a row for a date is what counts as a miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLog {
    pub guid: String,
    pub goal_guid: String,
    pub user_guid: String,
    pub log_date: NaiveDate,
    pub completed: bool,
    pub notes: Option<String>,
    pub media_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Emergency Support Team member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportCircleMember {
    pub guid: String,
    pub user_guid: String,
    pub name: String,
    pub relationship: Option<String>,
    pub preferred_channel: ContactChannel,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Tri-state: None = not yet asked, Some(false) = denied, Some(true) = granted
    pub consent_given: Option<bool>,
    pub consent_date: Option<DateTime<Utc>>,
    pub consent_method: Option<String>,
    pub is_active: bool,
    pub contact_count: i64,
    pub response_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupportCircleMember {
    /// Eligibility for escalation notifications: active AND explicit consent
    pub fn is_notifiable(&self) -> bool {
        self.is_active && self.consent_given == Some(true)
    }
}

/// Sales lead (admin CRM)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub guid: String,
    pub phone: String,
    pub name: Option<String>,
    pub status: LeadStatus,
    pub contacted_at: Option<DateTime<Utc>>,
    pub qualified_at: Option<DateTime<Utc>>,
    pub converted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authenticated session row backing the session store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_guid: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trips() {
        for tier in [SubscriptionTier::Free, SubscriptionTier::Premium] {
            assert_eq!(SubscriptionTier::parse(tier.as_str()), Some(tier));
        }
        for status in [
            GoalStatus::Active,
            GoalStatus::Paused,
            GoalStatus::Completed,
            GoalStatus::Archived,
        ] {
            assert_eq!(GoalStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SubscriptionTier::parse("platinum"), None);
    }

    #[test]
    fn test_lead_transitions() {
        assert!(LeadStatus::New.can_transition_to(LeadStatus::Contacted));
        assert!(LeadStatus::Contacted.can_transition_to(LeadStatus::Qualified));
        assert!(LeadStatus::Qualified.can_transition_to(LeadStatus::Converted));
        assert!(LeadStatus::New.can_transition_to(LeadStatus::Lost));
        // No skipping stages, no leaving terminal states
        assert!(!LeadStatus::New.can_transition_to(LeadStatus::Qualified));
        assert!(!LeadStatus::Converted.can_transition_to(LeadStatus::Lost));
        assert!(!LeadStatus::Lost.can_transition_to(LeadStatus::Contacted));
    }

    #[test]
    fn test_member_notifiable_requires_active_and_consent() {
        let mut member = SupportCircleMember {
            guid: "m1".to_string(),
            user_guid: "u1".to_string(),
            name: "Alice".to_string(),
            relationship: Some("sister".to_string()),
            preferred_channel: ContactChannel::Email,
            email: Some("alice@example.com".to_string()),
            phone: None,
            consent_given: Some(true),
            consent_date: None,
            consent_method: None,
            is_active: true,
            contact_count: 0,
            response_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(member.is_notifiable());

        member.consent_given = None;
        assert!(!member.is_notifiable());
        member.consent_given = Some(false);
        assert!(!member.is_notifiable());

        member.consent_given = Some(true);
        member.is_active = false;
        assert!(!member.is_notifiable());
    }

    #[test]
    fn test_phone_preference_dispatches_as_sms() {
        assert!(ContactChannel::Sms.is_sms());
        assert!(ContactChannel::Phone.is_sms());
        assert!(!ContactChannel::Email.is_sms());
    }
}
