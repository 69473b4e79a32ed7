//! Error types for aqwatch
//!
//! Fetch and dispatch failures carry their own local taxonomies
//! ([`crate::source::FetchError`], [`crate::alerting::DispatchError`]) and
//! are converted to logged outcomes at the pipeline boundary. The central
//! error type covers what genuinely aborts the process: configuration
//! problems caught at startup.

use thiserror::Error;

/// Result type alias using aqwatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal startup errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The category boundary table is malformed (gap, overlap, or missing
    /// coverage). Failing fast beats silently misclassifying.
    #[error("Category table error: {0}")]
    CategoryTable(String),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a category table error
    pub fn category_table(msg: impl Into<String>) -> Self {
        Self::CategoryTable(msg.into())
    }
}
