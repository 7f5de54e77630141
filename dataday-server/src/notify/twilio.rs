//! Twilio SMS client
//!
//! Sends SMS through the Twilio Messages REST API.
//!
//! # API Reference
//! - Endpoint: POST https://api.twilio.com/2010-04-01/Accounts/{sid}/Messages.json
//! - Auth: HTTP basic (account SID / auth token)
//! - Body: form-encoded To / From / Body
//! - Success response includes `{"sid": "..."}`

use async_trait::async_trait;
use dataday_common::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Messenger, OutboundMessage};

/// Twilio API base URL
const TWILIO_API_URL: &str = "https://api.twilio.com/2010-04-01";

/// Default timeout for Twilio API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Twilio SMS client
pub struct TwilioClient {
    http_client: Client,
    account_sid: String,
    auth_token: String,
    /// Sending phone number in E.164 form
    from: String,
}

#[derive(Debug, Deserialize)]
struct TwilioResponse {
    sid: String,
}

impl TwilioClient {
    /// Create new Twilio client
    pub fn new(account_sid: String, auth_token: String, from: String) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            account_sid,
            auth_token,
            from,
        }
    }
}

#[async_trait]
impl Messenger for TwilioClient {
    async fn send(&self, message: &OutboundMessage) -> Result<String> {
        debug!(to = %message.to, "Sending SMS via Twilio");

        if self.from.is_empty() {
            return Err(Error::provider("twilio", "no sending number configured"));
        }

        let url = format!(
            "{}/Accounts/{}/Messages.json",
            TWILIO_API_URL, self.account_sid
        );
        let params = [
            ("To", message.to.as_str()),
            ("From", self.from.as_str()),
            ("Body", message.body.as_str()),
        ];

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::provider("twilio", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(
                "twilio",
                format!("API returned {}: {}", status, body),
            ));
        }

        let parsed: TwilioResponse = response
            .json()
            .await
            .map_err(|e| Error::provider("twilio", format!("failed to parse response: {}", e)))?;

        Ok(parsed.sid)
    }
}
