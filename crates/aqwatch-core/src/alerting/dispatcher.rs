//! Alert delivery
//!
//! Sends composed messages through the configured channel and reports the
//! outcome without raising past its boundary: a failed delivery becomes a
//! [`DispatchResult`] for the pipeline to log, never an error that blocks
//! future cycles. No built-in retry: the next trigger retries naturally
//! because a failed dispatch leaves the alert state untouched.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{AlertMessage, Category};

/// Errors a delivery attempt can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The channel rejected the message or was unreachable.
    #[error("delivery channel rejected the message: {0}")]
    ChannelRejected(String),

    /// The delivery request did not complete within the configured timeout.
    #[error("delivery request timed out")]
    Timeout,

    /// The channel rejected our credentials.
    #[error("delivery channel rejected credentials (HTTP {0})")]
    AuthFailure(u16),
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    /// Whether the channel accepted the message
    pub success: bool,

    /// What went wrong, when it didn't
    pub error: Option<DispatchError>,
}

impl DispatchResult {
    fn delivered() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: DispatchError) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

/// Delivery channel configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliveryChannel {
    /// Twilio-style SMS provider API.
    Sms {
        /// Provider API base URL
        api_url: String,
        /// Account identifier
        account_sid: String,
        /// API auth token (secret, environment-sourced)
        auth_token: String,
        /// Sender phone number
        from: String,
    },
    /// Generic JSON webhook.
    Webhook {
        /// Webhook URL
        url: String,
    },
}

impl DeliveryChannel {
    /// Short channel name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryChannel::Sms { .. } => "sms",
            DeliveryChannel::Webhook { .. } => "webhook",
        }
    }
}

// auth_token is a credential; keep it out of Debug output
impl fmt::Debug for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryChannel::Sms {
                api_url,
                account_sid,
                from,
                ..
            } => f
                .debug_struct("Sms")
                .field("api_url", api_url)
                .field("account_sid", account_sid)
                .field("auth_token", &"[redacted]")
                .field("from", from)
                .finish(),
            DeliveryChannel::Webhook { url } => {
                f.debug_struct("Webhook").field("url", url).finish()
            }
        }
    }
}

/// Sends alerts through the configured delivery channel.
pub struct AlertDispatcher {
    client: Client,
    channel: DeliveryChannel,
}

impl AlertDispatcher {
    /// Create a dispatcher with a bounded per-request timeout.
    pub fn new(channel: DeliveryChannel, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, channel }
    }

    /// Deliver a composed message to `recipient`.
    ///
    /// Channel failures are returned, not raised: a failed dispatch is the
    /// caller's to log and must never block the next cycle.
    pub async fn dispatch(&self, message: &AlertMessage, recipient: &str) -> DispatchResult {
        let result = match &self.channel {
            DeliveryChannel::Sms {
                api_url,
                account_sid,
                auth_token,
                from,
            } => {
                self.send_sms(api_url, account_sid, auth_token, from, recipient, message)
                    .await
            }
            DeliveryChannel::Webhook { url } => self.send_webhook(url, recipient, message).await,
        };

        match result {
            Ok(()) => DispatchResult::delivered(),
            Err(e) => {
                warn!(channel = self.channel.kind(), error = %e, "dispatch failed");
                DispatchResult::failed(e)
            }
        }
    }

    async fn send_sms(
        &self,
        api_url: &str,
        account_sid: &str,
        auth_token: &str,
        from: &str,
        recipient: &str,
        message: &AlertMessage,
    ) -> Result<(), DispatchError> {
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            api_url.trim_end_matches('/'),
            account_sid
        );
        let params = [
            ("To", recipient),
            ("From", from),
            ("Body", message.text.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response.status())?;
        info!(to = recipient, "SMS alert dispatched");
        Ok(())
    }

    async fn send_webhook(
        &self,
        url: &str,
        recipient: &str,
        message: &AlertMessage,
    ) -> Result<(), DispatchError> {
        let payload = WebhookPayload {
            event_id: Uuid::new_v4(),
            recipient: recipient.to_string(),
            category: message.category,
            value: message.value,
            message: message.text.clone(),
            sent_at: Utc::now(),
        };

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response.status())?;
        info!(url = %url, "webhook alert dispatched");
        Ok(())
    }
}

fn map_transport_error(e: reqwest::Error) -> DispatchError {
    if e.is_timeout() {
        DispatchError::Timeout
    } else {
        DispatchError::ChannelRejected(e.without_url().to_string())
    }
}

fn check_status(status: StatusCode) -> Result<(), DispatchError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(DispatchError::AuthFailure(status.as_u16()))
    } else {
        Err(DispatchError::ChannelRejected(format!("HTTP {status}")))
    }
}

/// Payload posted to webhook channels.
#[derive(Debug, Serialize)]
struct WebhookPayload {
    event_id: Uuid,
    recipient: String,
    category: Category,
    value: f64,
    message: String,
    sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_pass() {
        assert_eq!(check_status(StatusCode::OK), Ok(()));
        assert_eq!(check_status(StatusCode::CREATED), Ok(()));
        assert_eq!(check_status(StatusCode::NO_CONTENT), Ok(()));
    }

    #[test]
    fn auth_statuses_map_to_auth_failure() {
        assert_eq!(
            check_status(StatusCode::UNAUTHORIZED),
            Err(DispatchError::AuthFailure(401))
        );
        assert_eq!(
            check_status(StatusCode::FORBIDDEN),
            Err(DispatchError::AuthFailure(403))
        );
    }

    #[test]
    fn other_failures_map_to_channel_rejected() {
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(DispatchError::ChannelRejected(_))
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(DispatchError::ChannelRejected(_))
        ));
    }

    #[test]
    fn debug_output_redacts_the_auth_token() {
        let channel = DeliveryChannel::Sms {
            api_url: "https://sms.example".to_string(),
            account_sid: "AC123".to_string(),
            auth_token: "super-secret".to_string(),
            from: "+15550001111".to_string(),
        };

        let rendered = format!("{channel:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
