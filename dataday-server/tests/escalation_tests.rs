//! Integration tests for the escalation pipeline
//!
//! Exercises the full daily run against an in-memory database: miss
//! detection, tier thresholds, the consent gate, broadcast fan-out,
//! contact counters, and same-day idempotency.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

use dataday_common::db::init::{create_schema, init_default_settings};
use dataday_common::db::models::{ContactChannel, GoalFrequency, SubscriptionTier};
use dataday_server::db::{goals, logs, members, users};
use dataday_server::escalation::process_escalations;
use dataday_server::notify::{ChannelKind, Messenger, Notifier, OutboundMessage};

/// Messenger double that records every dispatch and always succeeds
#[derive(Clone, Default)]
struct RecordingMessenger {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl RecordingMessenger {
    fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: &OutboundMessage) -> dataday_common::Result<String> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(format!("test-{}", sent.len()))
    }
}

/// Messenger double that always fails
struct FailingMessenger;

#[async_trait]
impl Messenger for FailingMessenger {
    async fn send(&self, _message: &OutboundMessage) -> dataday_common::Result<String> {
        Err(dataday_common::Error::provider("test", "simulated outage"))
    }
}

async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    create_schema(&pool).await.expect("Should create schema");
    init_default_settings(&pool)
        .await
        .expect("Should seed settings");
    pool
}

fn recording_notifier() -> (Notifier, RecordingMessenger) {
    let recorder = RecordingMessenger::default();
    let notifier = Notifier::new(Box::new(recorder.clone()), Box::new(recorder.clone()));
    (notifier, recorder)
}

/// Seed a user with one daily goal created `goal_age_days` ago and no logs,
/// which yields `goal_age_days` consecutive misses (capped by the window).
async fn seed_user_with_goal(
    pool: &SqlitePool,
    email: &str,
    tier: SubscriptionTier,
    goal_age_days: i64,
) -> (String, String) {
    let user_guid = users::create_user(pool, email, "Goal Owner", "UTC", tier, "hunter2")
        .await
        .expect("Should create user");
    let goal_guid = goals::create_goal(pool, &user_guid, "Morning run", GoalFrequency::Daily)
        .await
        .expect("Should create goal");

    let created_at = (Utc::now() - Duration::days(goal_age_days)).to_rfc3339();
    sqlx::query("UPDATE goals SET created_at = ? WHERE guid = ?")
        .bind(&created_at)
        .bind(&goal_guid)
        .execute(pool)
        .await
        .expect("Should backdate goal");

    (user_guid, goal_guid)
}

async fn add_consented_member(
    pool: &SqlitePool,
    user_guid: &str,
    name: &str,
    email: Option<&str>,
    phone: Option<&str>,
    channel: ContactChannel,
) -> String {
    let guid = members::add_member(pool, user_guid, name, None, channel, email, phone)
        .await
        .expect("Should add member");
    members::record_consent(pool, &guid, true, "web_link")
        .await
        .expect("Should record consent");
    guid
}

#[tokio::test]
async fn test_consent_gate_filters_non_consented_members() {
    let pool = setup_pool().await;
    let (notifier, recorder) = recording_notifier();

    // Free tier, 3 misses: support circle stage
    let (user_guid, _) = seed_user_with_goal(&pool, "owner@example.com", SubscriptionTier::Free, 3).await;
    let consented = add_consented_member(
        &pool,
        &user_guid,
        "Consented",
        Some("consented@example.com"),
        None,
        ContactChannel::Email,
    )
    .await;
    // Never responded to the consent request
    let silent = members::add_member(
        &pool,
        &user_guid,
        "Silent",
        None,
        ContactChannel::Email,
        Some("silent@example.com"),
        None,
    )
    .await
    .unwrap();

    let summary = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(summary.users_processed, 1);
    assert_eq!(summary.notifications_sent, 1);
    assert_eq!(summary.notifications_failed, 0);

    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, ChannelKind::Email);
    assert_eq!(sent[0].to, "consented@example.com");
    assert!(sent[0].body.contains("Goal Owner"));
    assert!(sent[0].body.contains("Morning run"));

    // Counter moved only for the contacted member
    let m = members::get_member(&pool, &consented).await.unwrap().unwrap();
    assert_eq!(m.contact_count, 1);
    let m = members::get_member(&pool, &silent).await.unwrap().unwrap();
    assert_eq!(m.contact_count, 0);
}

#[tokio::test]
async fn test_duplicate_trigger_same_day_sends_nothing() {
    let pool = setup_pool().await;
    let (notifier, recorder) = recording_notifier();

    let (user_guid, _) = seed_user_with_goal(&pool, "owner@example.com", SubscriptionTier::Free, 3).await;
    add_consented_member(
        &pool,
        &user_guid,
        "Consented",
        Some("consented@example.com"),
        None,
        ContactChannel::Email,
    )
    .await;

    let first = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(first.users_processed, 1);
    assert_eq!(recorder.sent().len(), 1);

    let second = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(second.users_processed, 0);
    assert_eq!(second.users_skipped, 1);
    assert_eq!(second.notifications_sent, 0);
    // No new messages on the duplicate run
    assert_eq!(recorder.sent().len(), 1);
}

#[tokio::test]
async fn test_single_miss_free_tier_is_a_self_nudge() {
    let pool = setup_pool().await;
    let (notifier, recorder) = recording_notifier();

    let (user_guid, _) = seed_user_with_goal(&pool, "owner@example.com", SubscriptionTier::Free, 1).await;
    add_consented_member(
        &pool,
        &user_guid,
        "Consented",
        Some("consented@example.com"),
        None,
        ContactChannel::Email,
    )
    .await;

    let summary = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(summary.nudges_sent, 1);
    assert_eq!(summary.notifications_sent, 0);

    // Only the owner hears about a single miss
    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "owner@example.com");
}

#[tokio::test]
async fn test_premium_tier_escalates_on_first_miss() {
    let pool = setup_pool().await;
    let (notifier, recorder) = recording_notifier();

    let (user_guid, _) =
        seed_user_with_goal(&pool, "premium@example.com", SubscriptionTier::Premium, 1).await;
    add_consented_member(
        &pool,
        &user_guid,
        "Consented",
        Some("consented@example.com"),
        None,
        ContactChannel::Email,
    )
    .await;

    let summary = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(summary.nudges_sent, 0);
    assert_eq!(summary.notifications_sent, 1);
    assert_eq!(recorder.sent()[0].to, "consented@example.com");
}

#[tokio::test]
async fn test_sustained_misses_broadcast_on_every_channel() {
    let pool = setup_pool().await;
    let (notifier, recorder) = recording_notifier();

    // 10 misses: past the broadcast threshold (2 + 3) for free tier
    let (user_guid, _) = seed_user_with_goal(&pool, "owner@example.com", SubscriptionTier::Free, 10).await;
    let member = add_consented_member(
        &pool,
        &user_guid,
        "Both Channels",
        Some("both@example.com"),
        Some("+15551234567"),
        ContactChannel::Email,
    )
    .await;

    let summary = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(summary.notifications_sent, 2);

    let sent = recorder.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent
        .iter()
        .any(|m| m.channel == ChannelKind::Email && m.to == "both@example.com"));
    assert!(sent
        .iter()
        .any(|m| m.channel == ChannelKind::Sms && m.to == "+15551234567"));

    // One counter increment per dispatch
    let m = members::get_member(&pool, &member).await.unwrap().unwrap();
    assert_eq!(m.contact_count, 2);
}

#[tokio::test]
async fn test_completed_today_triggers_nothing() {
    let pool = setup_pool().await;
    let (notifier, recorder) = recording_notifier();

    let (user_guid, goal_guid) =
        seed_user_with_goal(&pool, "owner@example.com", SubscriptionTier::Free, 10).await;
    add_consented_member(
        &pool,
        &user_guid,
        "Consented",
        Some("consented@example.com"),
        None,
        ContactChannel::Email,
    )
    .await;
    logs::record_log(
        &pool,
        &goal_guid,
        &user_guid,
        Utc::now().date_naive(),
        true,
        None,
    )
    .await
    .unwrap();

    let summary = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(summary.users_processed, 1);
    assert_eq!(summary.notifications_sent, 0);
    assert_eq!(summary.nudges_sent, 0);
    assert!(recorder.sent().is_empty());
}

#[tokio::test]
async fn test_provider_failure_counts_and_skips_counter() {
    let pool = setup_pool().await;
    let notifier = Notifier::new(Box::new(FailingMessenger), Box::new(FailingMessenger));

    let (user_guid, _) = seed_user_with_goal(&pool, "owner@example.com", SubscriptionTier::Free, 3).await;
    let member = add_consented_member(
        &pool,
        &user_guid,
        "Consented",
        Some("consented@example.com"),
        None,
        ContactChannel::Email,
    )
    .await;

    let summary = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(summary.notifications_sent, 0);
    assert_eq!(summary.notifications_failed, 1);

    // A failed dispatch never moves the contact counter
    let m = members::get_member(&pool, &member).await.unwrap().unwrap();
    assert_eq!(m.contact_count, 0);
}

#[tokio::test]
async fn test_weekly_goals_are_never_escalated() {
    let pool = setup_pool().await;
    let (notifier, recorder) = recording_notifier();

    let user_guid = users::create_user(
        &pool,
        "owner@example.com",
        "Goal Owner",
        "UTC",
        SubscriptionTier::Free,
        "hunter2",
    )
    .await
    .unwrap();
    let goal_guid = goals::create_goal(&pool, &user_guid, "Weekly review", GoalFrequency::Weekly)
        .await
        .unwrap();
    sqlx::query("UPDATE goals SET created_at = ? WHERE guid = ?")
        .bind((Utc::now() - Duration::days(10)).to_rfc3339())
        .bind(&goal_guid)
        .execute(&pool)
        .await
        .unwrap();
    add_consented_member(
        &pool,
        &user_guid,
        "Consented",
        Some("consented@example.com"),
        None,
        ContactChannel::Email,
    )
    .await;

    let summary = process_escalations(&pool, &notifier).await.unwrap();
    assert_eq!(summary.notifications_sent, 0);
    assert!(recorder.sent().is_empty());
}
