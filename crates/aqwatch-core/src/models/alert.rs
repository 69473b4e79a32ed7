//! Alert data models

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Air quality health category, in ascending order of severity.
///
/// The boundary each category owns lives in
/// [`crate::alerting::classifier`]; this type carries the display label and
/// the vetted advisory text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// AQI 0-50
    Good,
    /// AQI 50-100
    Moderate,
    /// AQI 100-150
    UnhealthySensitive,
    /// AQI 150-200
    Unhealthy,
    /// AQI 200-300
    VeryUnhealthy,
    /// AQI 300+
    Hazardous,
}

impl Category {
    /// Display label used in composed messages.
    pub fn label(self) -> &'static str {
        match self {
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthySensitive => "Unhealthy for Sensitive Groups",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
            Category::Hazardous => "Hazardous",
        }
    }

    /// Health advisory for the category.
    ///
    /// Always looked up here, never inferred or generated ad hoc, so the
    /// guidance recipients see stays consistent and vetted.
    pub fn advisory(self) -> &'static str {
        match self {
            Category::Good => {
                "Air quality is satisfactory, and air pollution poses little or no risk."
            }
            Category::Moderate => {
                "Air quality is acceptable; however, there may be a risk for some people, \
                 particularly those who are unusually sensitive to air pollution."
            }
            Category::UnhealthySensitive => {
                "Members of sensitive groups may experience health effects. The general \
                 public is less likely to be affected."
            }
            Category::Unhealthy => {
                "Some members of the general public may experience health effects; members \
                 of sensitive groups may experience more serious health effects."
            }
            Category::VeryUnhealthy => {
                "Health alert: The risk of health effects is increased for everyone."
            }
            Category::Hazardous => {
                "Health warning of emergency conditions: everyone is more likely to be \
                 affected."
            }
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Last-alerted state for one monitored location.
///
/// Owned exclusively by the pipeline. Initialized to none/none at startup;
/// both fields are updated together, and only after a successful dispatch;
/// a failed dispatch leaves the state untouched so the same alert is
/// retried on the next trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    /// Location this state tracks
    pub location: String,

    /// Category of the last successfully delivered alert
    pub last_alerted_category: Option<Category>,

    /// When that alert was delivered
    pub last_alerted_at: Option<DateTime<Utc>>,
}

impl AlertState {
    /// Fresh state for a location: no alert sent yet.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            last_alerted_category: None,
            last_alerted_at: None,
        }
    }

    /// Record a successfully delivered alert. Both fields move together;
    /// a partial update is not expressible through this method.
    pub fn record_alert(&mut self, category: Category, at: DateTime<Utc>) {
        self.last_alerted_category = Some(category);
        self.last_alerted_at = Some(at);
    }
}

/// A composed alert, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMessage {
    /// Category the alert reports
    pub category: Category,

    /// The AQI value that was classified
    pub value: f64,

    /// Advisory text as looked up from the category table (untruncated)
    pub advisory_text: String,

    /// Rendered message text, bounded by the configured character limit
    pub text: String,

    /// When the message was composed
    pub composed_at: DateTime<Utc>,
}
