//! Error types for the crash reporter.

use quincy_core::{ReportError, ValidationError};
use thiserror::Error;

/// Errors that leave a registration without uploads.
///
/// The capture hook is installed regardless; reports stay on disk.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// The configuration did not pass validation
    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Errors that stop a single report from being delivered.
///
/// None of these abort an upload pass; the report stays on disk.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The report file could not be read
    #[error("I/O error: {0:#}")]
    Io(#[from] anyhow::Error),

    /// The report content could not be split into log and description
    #[error("malformed report: {0}")]
    Malformed(#[from] ReportError),

    /// The request failed before a response arrived
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered, but not with an acknowledgement
    #[error("server rejected report (status {status}): {body:?}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body as received
        body: String,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
