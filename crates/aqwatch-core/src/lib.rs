//! # aqwatch
//!
//! Threshold-driven air quality alerting.
//!
//! aqwatch polls a WAQI-style feed for one city's PM2.5 AQI, classifies the
//! value against the fixed health-category table, decides whether the
//! category transition warrants a new alert, composes a bounded SMS-shaped
//! message, and delivers it through the configured channel. Every cycle
//! emits one structured log record, whether or not an alert was sent.
//!
//! ## Architecture
//!
//! - **Source**: async feed client that normalizes transport and parse
//!   failures into a typed result
//! - **Alerting**: classifier → decider → composer → dispatcher, driven by
//!   a pipeline that owns the last-alerted state
//! - **Models**: shared domain types, no logic or I/O
//!
//! ## Quick Start
//!
//! ```bash
//! # Token comes from the environment, never from code
//! export AQWATCH_SOURCE__TOKEN=your-feed-token
//!
//! # One cycle
//! aqwatch once
//!
//! # Poll on the configured interval
//! aqwatch run
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod config;
pub mod error;
pub mod models;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{AlertDispatcher, AlertPipeline, CycleRecord, DeliveryChannel};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::source::AirQualitySource;
}
