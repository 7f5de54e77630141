//! Escalation orchestrator
//!
//! Entry point for the daily trigger. Per user, the run is claimed through
//! the escalation_runs idempotency ledger before anything is dispatched:
//! a duplicate invocation the same day finds the claim already taken and
//! skips the user, giving at-most-once notification semantics per user per
//! day. Within a claimed run the pipeline is a linear series of awaited
//! calls; there is no fan-out concurrency.

use chrono::Duration;
use dataday_common::db::init::setting_i64;
use dataday_common::db::models::User;
use dataday_common::{time, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db::{goals, logs, members, runs};
use crate::escalation::consent::{eligible_members, message_for};
use crate::escalation::miss::consecutive_misses;
use crate::escalation::policy::{escalation_action, EscalationAction, PolicyThresholds};
use crate::notify::{templates, ChannelKind, Notifier, OutboundMessage};

/// Outcome of one escalation run across all users
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub users_processed: u32,
    /// Users whose (user, date) claim was already taken
    pub users_skipped: u32,
    pub notifications_sent: u32,
    pub notifications_failed: u32,
    pub nudges_sent: u32,
}

impl RunSummary {
    /// One-line human description for the trigger response
    pub fn describe(&self) -> String {
        format!(
            "processed {} users ({} skipped), {} notifications sent, {} failed, {} nudges",
            self.users_processed,
            self.users_skipped,
            self.notifications_sent,
            self.notifications_failed,
            self.nudges_sent
        )
    }
}

/// Run the escalation pipeline for every user
pub async fn process_escalations(pool: &SqlitePool, notifier: &Notifier) -> Result<RunSummary> {
    let thresholds = PolicyThresholds::load(pool).await?;
    let lookback_days = setting_i64(pool, "lookback_window_days", 14).await?.max(1) as u32;

    let users = crate::db::users::list_users(pool).await?;
    let mut summary = RunSummary::default();

    for user in &users {
        let today = time::local_date(&user.timezone, time::now());

        // Claim the (user, date) idempotency key before any dispatch
        if !runs::claim_run(pool, &user.guid, today).await? {
            summary.users_skipped += 1;
            continue;
        }
        summary.users_processed += 1;

        process_user(pool, notifier, user, &thresholds, lookback_days, &mut summary).await?;
    }

    info!("Escalation run complete: {}", summary.describe());
    Ok(summary)
}

/// Run the pipeline for one claimed user
async fn process_user(
    pool: &SqlitePool,
    notifier: &Notifier,
    user: &User,
    thresholds: &PolicyThresholds,
    lookback_days: u32,
    summary: &mut RunSummary,
) -> Result<()> {
    let today = time::local_date(&user.timezone, time::now());
    let since = today - Duration::days(lookback_days as i64);

    let user_goals = goals::escalatable_goals(pool, &user.guid).await?;
    // Members fetched once per user, lazily on first escalating goal
    let mut active = None;
    // One entry per successful dispatch; committed in a single transaction
    let mut contacted: Vec<String> = Vec::new();

    for goal in &user_goals {
        let completed = logs::completed_dates(pool, &goal.guid, since).await?;
        let created_on = time::local_date(&user.timezone, goal.created_at);
        let misses = consecutive_misses(today, created_on, &completed, lookback_days);

        let action = escalation_action(misses, user.subscription_tier, thresholds);
        match action {
            EscalationAction::None => {}
            EscalationAction::SelfNudge => {
                send_self_nudge(notifier, user, &goal.title, summary).await;
            }
            EscalationAction::NotifySupportCircle | EscalationAction::NotifyAllContacts => {
                if active.is_none() {
                    active = Some(members::active_members(pool, &user.guid).await?);
                }
                let broadcast = action == EscalationAction::NotifyAllContacts;

                for member in eligible_members(active.as_deref().unwrap_or(&[])) {
                    let (subject, body) = templates::escalation_message(
                        &member.name,
                        &user.display_name,
                        &goal.title,
                        misses,
                    );

                    let mut messages: Vec<OutboundMessage> = Vec::new();
                    if let Some(msg) = message_for(member, subject.clone(), body.clone()) {
                        messages.push(msg);
                    }
                    if broadcast {
                        // Sustained streak: reach the member on every channel
                        // with an address, not just the preferred one
                        if let Some(email) = &member.email {
                            if !messages.iter().any(|m| m.channel == ChannelKind::Email) {
                                messages.push(OutboundMessage {
                                    channel: ChannelKind::Email,
                                    to: email.clone(),
                                    subject: subject.clone(),
                                    body: body.clone(),
                                });
                            }
                        }
                        if let Some(phone) = &member.phone {
                            if !messages.iter().any(|m| m.channel == ChannelKind::Sms) {
                                messages.push(OutboundMessage {
                                    channel: ChannelKind::Sms,
                                    to: phone.clone(),
                                    subject: subject.clone(),
                                    body: body.clone(),
                                });
                            }
                        }
                    }

                    for message in &messages {
                        match notifier.deliver(message).await {
                            Ok(_) => {
                                summary.notifications_sent += 1;
                                contacted.push(member.guid.clone());
                            }
                            Err(e) => {
                                // Best-effort: log and move on to the next contact
                                error!(
                                    member = %member.guid,
                                    goal = %goal.guid,
                                    "Notification dispatch failed: {}",
                                    e
                                );
                                summary.notifications_failed += 1;
                            }
                        }
                    }
                }
            }
        }
    }

    // Counter write-back as one unit of work
    if !contacted.is_empty() {
        members::increment_contact_counts(pool, &contacted).await?;
    }

    Ok(())
}

/// Encourage the goal owner directly (no external contacts)
async fn send_self_nudge(notifier: &Notifier, user: &User, goal_title: &str, summary: &mut RunSummary) {
    let (subject, body) = templates::self_nudge_message(&user.display_name, goal_title);
    let message = OutboundMessage {
        channel: ChannelKind::Email,
        to: user.email.clone(),
        subject,
        body,
    };
    match notifier.deliver(&message).await {
        Ok(_) => summary.nudges_sent += 1,
        Err(e) => {
            error!(user = %user.guid, "Self-nudge dispatch failed: {}", e);
            summary.notifications_failed += 1;
        }
    }
}
