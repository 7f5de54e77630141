//! Consent gate and consent request dispatch
//!
//! The daily run only ever contacts members who are active AND have
//! explicitly granted consent. Requesting consent is a separate operation
//! (the bulk send-all action), never part of the daily run.

use dataday_common::db::init::setting_string;
use dataday_common::db::models::{SupportCircleMember, User};
use dataday_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, warn};

use crate::db::members;
use crate::notify::{templates, ChannelKind, Notifier, OutboundMessage};

/// Filter members down to those eligible for escalation notifications.
///
/// The output is always a subset of the active members and never contains
/// a member whose consent is anything other than an explicit grant.
pub fn eligible_members(members: &[SupportCircleMember]) -> Vec<&SupportCircleMember> {
    members.iter().filter(|m| m.is_notifiable()).collect()
}

/// Outcome of a bulk consent-request send
#[derive(Debug, Default, Serialize)]
pub struct ConsentSendOutcome {
    /// Requests dispatched successfully
    pub requested: u32,
    /// Provider failures (logged, not retried)
    pub failed: u32,
    /// Members with no usable address for their preferred channel
    pub skipped: u32,
}

/// Send consent requests to every active member who has not yet granted
/// consent (`consent_given IS NULL OR 0`). Each member gets a unique
/// consent link dispatched on their preferred channel. Best-effort per
/// member: one failure does not block the rest.
pub async fn send_consent_requests(
    pool: &SqlitePool,
    notifier: &Notifier,
    user: &User,
) -> Result<ConsentSendOutcome> {
    let base_url = setting_string(pool, "consent_link_base_url", "https://mydataday.app").await?;
    let pending = members::pending_consent_members(pool, &user.guid).await?;

    let mut outcome = ConsentSendOutcome::default();

    for member in &pending {
        let link = format!("{}/consent/{}", base_url.trim_end_matches('/'), member.guid);
        let (subject, body) =
            templates::consent_request_message(&member.name, &user.display_name, &link);

        let Some(message) = message_for(member, subject, body) else {
            warn!(
                member = %member.guid,
                channel = member.preferred_channel.as_str(),
                "Member has no address for preferred channel, skipping consent request"
            );
            outcome.skipped += 1;
            continue;
        };

        match notifier.deliver(&message).await {
            Ok(_) => outcome.requested += 1,
            Err(e) => {
                error!(member = %member.guid, "Consent request dispatch failed: {}", e);
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Build the outbound message for a member's preferred channel.
/// Returns None when the member has no usable address.
pub fn message_for(
    member: &SupportCircleMember,
    subject: String,
    body: String,
) -> Option<OutboundMessage> {
    if member.preferred_channel.is_sms() {
        member.phone.as_ref().map(|phone| OutboundMessage {
            channel: ChannelKind::Sms,
            to: phone.clone(),
            subject,
            body,
        })
    } else {
        member.email.as_ref().map(|email| OutboundMessage {
            channel: ChannelKind::Email,
            to: email.clone(),
            subject,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dataday_common::db::models::ContactChannel;

    fn member(consent: Option<bool>, active: bool) -> SupportCircleMember {
        SupportCircleMember {
            guid: uuid::Uuid::new_v4().to_string(),
            user_guid: "u1".to_string(),
            name: "Member".to_string(),
            relationship: None,
            preferred_channel: ContactChannel::Email,
            email: Some("m@example.com".to_string()),
            phone: None,
            consent_given: consent,
            consent_date: None,
            consent_method: None,
            is_active: active,
            contact_count: 0,
            response_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_gate_excludes_all_non_granted_consent() {
        let members = vec![
            member(Some(true), true),
            member(Some(false), true),
            member(None, true),
            member(Some(true), false),
        ];
        let eligible = eligible_members(&members);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].guid, members[0].guid);
        // Subset of active members
        assert!(eligible.iter().all(|m| m.is_active));
    }

    #[test]
    fn test_message_for_routes_phone_preference_to_sms() {
        let mut m = member(Some(true), true);
        m.preferred_channel = ContactChannel::Phone;
        m.phone = Some("+15551234567".to_string());
        let msg = message_for(&m, "s".into(), "b".into()).unwrap();
        assert_eq!(msg.channel, ChannelKind::Sms);
        assert_eq!(msg.to, "+15551234567");
    }

    #[test]
    fn test_message_for_missing_address_is_none() {
        let mut m = member(Some(true), true);
        m.email = None;
        assert!(message_for(&m, "s".into(), "b".into()).is_none());
    }
}
