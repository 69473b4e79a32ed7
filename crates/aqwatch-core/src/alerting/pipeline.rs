//! Alert pipeline orchestration
//!
//! One full cycle per external trigger: fetch → classify → decide →
//! compose → dispatch → record. The pipeline owns the last-alerted state;
//! mutating it is the final step of a successful cycle, so a failed or
//! abandoned cycle leaves state untouched and the next trigger retries
//! from scratch.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::dispatcher::{AlertDispatcher, DispatchResult};
use super::{classifier, composer, decider};
use crate::models::{AlertState, Category};
use crate::source::{AirQualitySource, FetchError};

/// Fetch outcome recorded for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A usable reading was fetched and classified
    Ok,
    /// Transport failure or non-success HTTP status
    Network,
    /// The feed did not respond in time
    Timeout,
    /// Undecodable body, or a decoded response with no classifiable value
    MalformedResponse,
}

impl FetchOutcome {
    fn from_error(e: &FetchError) -> Self {
        match e {
            FetchError::Network(_) => FetchOutcome::Network,
            FetchError::Timeout => FetchOutcome::Timeout,
            FetchError::MalformedResponse(_) => FetchOutcome::MalformedResponse,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::Network => "network",
            FetchOutcome::Timeout => "timeout",
            FetchOutcome::MalformedResponse => "malformed_response",
        }
    }
}

/// The structured record emitted once per cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleRecord {
    /// Location the cycle ran for
    pub location: String,

    /// How the fetch went
    pub fetch_outcome: FetchOutcome,

    /// Classified category, when classification was possible
    pub category: Option<Category>,

    /// Whether an alert was delivered this cycle
    pub alerted: bool,

    /// Delivery outcome, when a dispatch was attempted
    pub dispatch_outcome: Option<DispatchResult>,
}

impl CycleRecord {
    fn no_alert(location: String, fetch_outcome: FetchOutcome, category: Option<Category>) -> Self {
        Self {
            location,
            fetch_outcome,
            category,
            alerted: false,
            dispatch_outcome: None,
        }
    }
}

/// Orchestrates one alert cycle per trigger and owns the alert state.
///
/// `run_cycle` takes `&mut self`, so overlapping cycles for the same
/// location cannot compile; scheduling lives outside this type.
pub struct AlertPipeline {
    source: AirQualitySource,
    dispatcher: AlertDispatcher,
    state: AlertState,
    recipient: String,
    message_max_len: usize,
}

impl AlertPipeline {
    /// Assemble a pipeline around injected collaborators and state.
    pub fn new(
        source: AirQualitySource,
        dispatcher: AlertDispatcher,
        state: AlertState,
        recipient: impl Into<String>,
        message_max_len: usize,
    ) -> Self {
        Self {
            source,
            dispatcher,
            state,
            recipient: recipient.into(),
            message_max_len,
        }
    }

    /// Current alert state, for inspection.
    pub fn state(&self) -> &AlertState {
        &self.state
    }

    /// Run one full cycle.
    ///
    /// Fetch and dispatch failures are converted to logged outcomes. This
    /// never propagates an error or panics, and it always emits exactly one
    /// structured record.
    pub async fn run_cycle(&mut self) -> CycleRecord {
        let record = self.cycle_inner().await;

        info!(
            location = %record.location,
            fetch_outcome = record.fetch_outcome.as_str(),
            category = record.category.map(Category::label),
            alerted = record.alerted,
            dispatch_outcome = ?record.dispatch_outcome,
            "cycle complete"
        );

        record
    }

    async fn cycle_inner(&mut self) -> CycleRecord {
        let location = self.state.location.clone();

        let reading = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(location = %location, error = %e, "fetch failed");
                return CycleRecord::no_alert(location, FetchOutcome::from_error(&e), None);
            }
        };

        // An absent value after a successful fetch means no classification
        // is possible; recorded like a malformed response.
        let Some(value) = reading.value else {
            warn!(location = %location, "feed response carried no PM2.5 value");
            return CycleRecord::no_alert(location, FetchOutcome::MalformedResponse, None);
        };

        let category = match classifier::classify(Some(value)) {
            Ok(category) => category,
            Err(e) => {
                warn!(location = %location, error = %e, "reading could not be classified");
                return CycleRecord::no_alert(location, FetchOutcome::MalformedResponse, None);
            }
        };

        if !decider::should_alert(category, &self.state) {
            debug!(
                location = %location,
                category = category.label(),
                "category unchanged since last alert, debounced"
            );
            return CycleRecord::no_alert(location, FetchOutcome::Ok, Some(category));
        }

        let message = composer::compose(value, category, self.message_max_len, Utc::now());
        let outcome = self.dispatcher.dispatch(&message, &self.recipient).await;

        if outcome.success {
            // the only state mutation in a cycle, and the last step of it
            self.state.record_alert(category, Utc::now());
        }

        CycleRecord {
            location,
            fetch_outcome: FetchOutcome::Ok,
            category: Some(category),
            alerted: outcome.success,
            dispatch_outcome: Some(outcome),
        }
    }
}
