/*!
 * Error types for the cantosub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to the correction service
#[derive(Error, Debug)]
pub enum CorrectionError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Endpoint rejected by the loopback-only policy
    #[error("Refused non-loopback endpoint: {0}")]
    EndpointRefused(String),
}

/// Errors that can occur while reconciling transcript and voice intervals
#[derive(Error, Debug)]
pub enum MergeError {
    /// A voice interval with an inverted or non-positive time range
    #[error("Invalid voice interval: start {start} >= end {end}")]
    InvalidInterval {
        /// Interval start in seconds
        start: f64,
        /// Interval end in seconds
        end: f64,
    },

    /// A timed word with an inverted time range
    #[error("Invalid timed word '{text}': start {start} > end {end}")]
    InvalidWord {
        /// The word text
        text: String,
        /// Word start in seconds
        start: f64,
        /// Word end in seconds
        end: f64,
    },
}

/// Errors that can occur when writing subtitle output
#[derive(Error, Debug)]
pub enum ExportError {
    /// Error from a file operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry that cannot be serialized (inverted times, empty text)
    #[error("Invalid subtitle entry: {0}")]
    InvalidEntry(String),
}

/// Errors that terminate a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The run was cancelled cooperatively; not a failure
    #[error("Run cancelled")]
    Cancelled,

    /// A stage violated an internal invariant
    #[error("Invariant violated in {stage}: {message}")]
    InvariantViolated {
        /// Pipeline stage name
        stage: String,
        /// Description of the violation
        message: String,
    },

    /// Error from merging
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Error from exporting
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the correction service
    #[error("Correction error: {0}")]
    Correction(#[from] CorrectionError),

    /// Error from segment merging
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    /// Error from a pipeline run
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from exporting subtitles
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
