//! Reading data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single PM2.5 AQI observation for one location.
///
/// Produced by the feed client once per fetch cycle and discarded after
/// classification. An unavailable measurement is `value: None`; an absent
/// value is never conflated with zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Location identifier the reading was fetched for
    pub location: String,

    /// Observed AQI value, or `None` if the feed had no usable measurement
    pub value: Option<f64>,

    /// When the value was observed, per the feed (falls back to fetch time)
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    /// A reading whose measurement was unavailable.
    pub fn absent(location: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            location: location.into(),
            value: None,
            observed_at,
        }
    }
}
