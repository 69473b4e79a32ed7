//! Air quality feed client
//!
//! Fetches the current PM2.5 AQI for a configured city from a WAQI-style
//! feed and normalizes transport and parse failures into [`FetchError`].
//! A response that decodes but carries no usable pollutant entry yields a
//! [`Reading`] with an absent value rather than an error; a momentarily
//! missing field is not an operational failure.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::Reading;

/// Errors raised while fetching a reading from the feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure or non-success HTTP status from the feed.
    #[error("feed request failed: {0}")]
    Network(String),

    /// The feed did not respond within the configured timeout.
    #[error("feed request timed out")]
    Timeout,

    /// The response body could not be decoded as a feed envelope.
    #[error("feed response could not be decoded: {0}")]
    MalformedResponse(String),
}

// --- Feed response schema -------------------------------------------------

/// Top-level feed envelope. `data` is an object on success and a bare
/// string on feed-level errors, so it stays raw until `status` is checked.
#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    status: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct FeedData {
    #[serde(default)]
    iaqi: PollutantMap,
    time: Option<FeedTime>,
}

/// Per-pollutant entries; only PM2.5 is read.
#[derive(Debug, Default, Deserialize)]
struct PollutantMap {
    pm25: Option<PollutantValue>,
}

#[derive(Debug, Deserialize)]
struct PollutantValue {
    v: f64,
}

#[derive(Debug, Deserialize)]
struct FeedTime {
    iso: Option<String>,
}

// --- Client ---------------------------------------------------------------

/// Client for the remote air quality feed.
pub struct AirQualitySource {
    client: Client,
    base_url: String,
    city: String,
    token: String,
}

impl AirQualitySource {
    /// Create a source for one city.
    ///
    /// The token is supplied out of band (environment-sourced config) and
    /// rides in the query string; it must never appear in logs or errors.
    pub fn new(
        base_url: impl Into<String>,
        city: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            city: city.into(),
            token: token.into(),
        }
    }

    /// Fetch the current reading for the configured city.
    ///
    /// A single GET, no retry. Retries are the caller's responsibility.
    pub async fn fetch(&self) -> Result<Reading, FetchError> {
        let url = format!("{}/feed/{}/", self.base_url.trim_end_matches('/'), self.city);

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    // strip the URL: the token rides in the query string
                    FetchError::Network(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {status}")));
        }

        let fetched_at = Utc::now();
        let envelope: FeedEnvelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::MalformedResponse(e.without_url().to_string())
            }
        })?;

        self.reading_from_envelope(envelope, fetched_at)
    }

    fn reading_from_envelope(
        &self,
        envelope: FeedEnvelope,
        fetched_at: DateTime<Utc>,
    ) -> Result<Reading, FetchError> {
        if envelope.status != "ok" {
            debug!(city = %self.city, feed_status = %envelope.status, "feed returned no data");
            return Ok(Reading::absent(&self.city, fetched_at));
        }

        let data: FeedData = serde_json::from_value(envelope.data)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        let observed_at = data
            .time
            .as_ref()
            .and_then(|t| t.iso.as_deref())
            .and_then(|iso| DateTime::parse_from_rfc3339(iso).ok())
            .map_or(fetched_at, |dt| dt.with_timezone(&Utc));

        let value = data.iaqi.pm25.map(|p| p.v);
        if value.is_none() {
            debug!(city = %self.city, "pm25 entry missing from feed response");
        }

        Ok(Reading {
            location: self.city.clone(),
            value,
            observed_at,
        })
    }
}
