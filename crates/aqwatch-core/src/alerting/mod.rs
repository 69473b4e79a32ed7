//! Alerting pipeline for aqwatch
//!
//! Classification against the fixed category table, transition-based alert
//! decisions, message composition, delivery, and the per-cycle
//! orchestration that owns the last-alerted state.

mod classifier;
mod composer;
mod decider;
mod dispatcher;
mod pipeline;

pub use classifier::{bounds_for, classify, verify_bounds, ValueError};
pub use composer::compose;
pub use decider::should_alert;
pub use dispatcher::{AlertDispatcher, DeliveryChannel, DispatchError, DispatchResult};
pub use pipeline::{AlertPipeline, CycleRecord, FetchOutcome};
