//! Notification dispatch
//!
//! The provider seam is the [`Messenger`] trait; production wires in
//! [`ResendClient`] for email and [`TwilioClient`] for SMS, tests substitute
//! a recording double. Dispatch is best-effort with at-most-one attempt per
//! contact per run: a provider failure is logged and counted but never
//! retried and never blocks the remaining contacts.

pub mod resend;
pub mod templates;
pub mod twilio;

pub use resend::ResendClient;
pub use twilio::TwilioClient;

use async_trait::async_trait;
use dataday_common::db::init::setting_string;
use dataday_common::Result;
use sqlx::SqlitePool;

/// Delivery channel of an outbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Email,
    Sms,
}

/// A rendered message ready for dispatch
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub channel: ChannelKind,
    /// Email address or E.164 phone number, depending on channel
    pub to: String,
    /// Ignored by the SMS channel
    pub subject: String,
    pub body: String,
}

/// A single provider-backed delivery channel
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Dispatch one message; returns the provider message id on success
    async fn send(&self, message: &OutboundMessage) -> Result<String>;
}

/// Notification dispatcher holding one messenger per channel
pub struct Notifier {
    email: Box<dyn Messenger>,
    sms: Box<dyn Messenger>,
}

impl Notifier {
    pub fn new(email: Box<dyn Messenger>, sms: Box<dyn Messenger>) -> Self {
        Self { email, sms }
    }

    /// Build the production notifier: Resend for email, Twilio for SMS.
    /// Credentials come from the environment, sender identities from settings.
    pub async fn from_env(pool: &SqlitePool) -> Result<Self> {
        let email_from = setting_string(pool, "email_from", "MyDataday <support@mydataday.app>").await?;
        let sms_from = setting_string(pool, "sms_from", "").await?;

        let resend_key = std::env::var("RESEND_API_KEY").unwrap_or_default();
        let twilio_sid = std::env::var("TWILIO_ACCOUNT_SID").unwrap_or_default();
        let twilio_token = std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default();

        Ok(Self::new(
            Box::new(ResendClient::new(resend_key, email_from)),
            Box::new(TwilioClient::new(twilio_sid, twilio_token, sms_from)),
        ))
    }

    /// Dispatch one message on its channel (single attempt, no retry)
    pub async fn deliver(&self, message: &OutboundMessage) -> Result<String> {
        match message.channel {
            ChannelKind::Email => self.email.send(message).await,
            ChannelKind::Sms => self.sms.send(message).await,
        }
    }
}
