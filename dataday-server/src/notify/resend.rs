//! Resend email client
//!
//! Sends transactional email through the Resend REST API.
//!
//! # API Reference
//! - Endpoint: POST https://api.resend.com/emails
//! - Auth: `Authorization: Bearer <api key>`
//! - Success response: `{"id": "..."}`

use async_trait::async_trait;
use dataday_common::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{Messenger, OutboundMessage};

/// Resend API base URL
const RESEND_API_URL: &str = "https://api.resend.com";

/// Default timeout for Resend API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Resend email client
pub struct ResendClient {
    http_client: Client,
    api_key: String,
    /// Sender identity, e.g. `MyDataday <support@mydataday.app>`
    from: String,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendClient {
    /// Create new Resend client
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Messenger for ResendClient {
    async fn send(&self, message: &OutboundMessage) -> Result<String> {
        debug!(to = %message.to, subject = %message.subject, "Sending email via Resend");

        let url = format!("{}/emails", RESEND_API_URL);
        let payload = json!({
            "from": self.from,
            "to": [message.to],
            "subject": message.subject,
            "text": message.body,
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider("resend", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(
                "resend",
                format!("API returned {}: {}", status, body),
            ));
        }

        let parsed: ResendResponse = response
            .json()
            .await
            .map_err(|e| Error::provider("resend", format!("failed to parse response: {}", e)))?;

        Ok(parsed.id)
    }
}
