//! Configuration management for aqwatch
//!
//! An optional TOML file layered under `AQWATCH_*` environment variables.
//! Secrets (the feed token, delivery credentials) come from the
//! environment, are redacted from `Debug` output, and are never logged.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::alerting::DeliveryChannel;
use crate::error::{Error, Result};

/// Shortest permitted message limit: the fixed prefix, an AQI value, and
/// the longest category label must always survive truncation untouched.
pub const MESSAGE_LEN_FLOOR: usize = 120;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Feed configuration
    pub source: SourceConfig,

    /// Delivery configuration
    pub delivery: DeliveryConfig,

    /// Pipeline configuration
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Feed configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Feed base URL
    pub base_url: String,

    /// City (feed station) to monitor
    pub city: String,

    /// Feed API token; set `AQWATCH_SOURCE__TOKEN`, never a config file
    pub token: String,

    /// Timeout for one fetch request
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.waqi.info".to_string(),
            city: "beijing".to_string(),
            token: String::new(),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

// the token is a credential; keep it out of Debug output
impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("base_url", &self.base_url)
            .field("city", &self.city)
            .field("token", &"[redacted]")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

/// Delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Delivery channel
    pub channel: DeliveryChannel,

    /// Recipient identifier (phone number or webhook-side routing key)
    pub recipient: String,

    /// Timeout for one delivery request
    #[serde(with = "humantime_serde")]
    pub dispatch_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            channel: DeliveryChannel::Webhook { url: String::new() },
            recipient: String::new(),
            dispatch_timeout: Duration::from_secs(30),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Interval between cycles in `run` mode
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Character limit for composed messages (SMS constraint)
    pub message_max_len: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(600),
            message_max_len: 160,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Sources, later ones winning: the named TOML file (or `aqwatch.toml`
    /// in the working directory, if present), then `AQWATCH_*` environment
    /// variables with `__` separating nested fields, e.g.
    /// `AQWATCH_SOURCE__TOKEN`, `AQWATCH_PIPELINE__POLL_INTERVAL=10m`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => builder.add_source(config::File::with_name("aqwatch").required(false)),
        };

        let settings = builder
            .add_source(config::Environment::with_prefix("AQWATCH").separator("__"))
            .build()
            .map_err(|e| Error::config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Validate invariants that should fail fast at startup rather than
    /// surface mid-cycle.
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.source.base_url)
            .map_err(|e| Error::config(format!("source.base_url: {e}")))?;

        if self.source.city.is_empty() {
            return Err(Error::config("source.city must not be empty"));
        }
        if self.source.token.is_empty() {
            return Err(Error::config(
                "source.token must be set (AQWATCH_SOURCE__TOKEN)",
            ));
        }

        if self.pipeline.poll_interval.is_zero() {
            return Err(Error::config("pipeline.poll_interval must be non-zero"));
        }
        if self.pipeline.message_max_len < MESSAGE_LEN_FLOOR {
            return Err(Error::config(format!(
                "pipeline.message_max_len must be at least {MESSAGE_LEN_FLOOR}"
            )));
        }

        match &self.delivery.channel {
            DeliveryChannel::Sms {
                api_url,
                account_sid,
                auth_token,
                from,
            } => {
                Url::parse(api_url)
                    .map_err(|e| Error::config(format!("delivery.channel.api_url: {e}")))?;
                if account_sid.is_empty() || auth_token.is_empty() {
                    return Err(Error::config(
                        "delivery.channel credentials must be set \
                         (AQWATCH_DELIVERY__CHANNEL__ACCOUNT_SID / __AUTH_TOKEN)",
                    ));
                }
                if from.is_empty() {
                    return Err(Error::config("delivery.channel.from must not be empty"));
                }
            }
            DeliveryChannel::Webhook { url } => {
                Url::parse(url).map_err(|e| Error::config(format!("delivery.channel.url: {e}")))?;
            }
        }

        if self.delivery.recipient.is_empty() {
            return Err(Error::config("delivery.recipient must not be empty"));
        }

        Ok(())
    }
}
