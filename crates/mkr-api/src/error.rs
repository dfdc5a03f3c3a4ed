//! Client error types.

use thiserror::Error;

/// Error type for timetable operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The embedded events payload failed to parse as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schedule response carried no events payload.
    #[error("No events data found in response; check the date range")]
    NoScheduleData,

    /// Markup could not be processed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if a schedule query returned a document without events.
    pub fn is_no_schedule_data(&self) -> bool {
        matches!(self, Error::NoScheduleData)
    }

    /// Check if the failure happened in transit rather than in parsing.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_))
    }
}

/// Result type for timetable operations.
pub type Result<T> = std::result::Result<T, Error>;
