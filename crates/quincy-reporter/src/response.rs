//! Collection server replies
//!
//! The server answers an upload with
//! `<?xml version="1.0" encoding="UTF-8"?><result>N</result>`, where `N` is
//! the status of the crash group the report was filed under. The status is
//! informational: delivery success is decided by the HTTP status and body
//! alone.

/// Status reported by the collection server for an uploaded crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    /// Stored, processing continues later
    Queued,
    /// The app version no longer accepts crash reports
    VersionDiscontinued,
    /// Sender or app version contains characters the server rejects
    InvalidVersionString,
    /// The server failed to store the crash
    StorageFailure,
    /// The POST did not carry a usable `xmlstring`
    InvalidPostData,
    /// The crash could not be attributed, e.g. unknown bundle identifier
    InvalidIncomingData,
    /// The server database is not reachable
    DatabaseUnavailable,
    /// No status known for this crash group
    Unknown,
    /// A fix is assigned to a developer
    Assigned,
    /// A fix has been submitted
    Submitted,
    /// A fix is available in a newer release
    Available,
    /// A code this client does not know
    Other(i32),
}

impl ServerStatus {
    /// Maps a numeric result code.
    pub fn from_code(code: i32) -> Self {
        match code {
            -80 => Self::Queued,
            -30 => Self::VersionDiscontinued,
            -21 | -20 => Self::InvalidVersionString,
            -18..=-10 => Self::StorageFailure,
            -3 => Self::InvalidPostData,
            -2 => Self::InvalidIncomingData,
            -1 => Self::DatabaseUnavailable,
            0 => Self::Unknown,
            1 => Self::Assigned,
            2 => Self::Submitted,
            3 => Self::Available,
            other => Self::Other(other),
        }
    }

    /// Extracts the status from a response body, if it carries one.
    pub fn parse(body: &str) -> Option<Self> {
        let start = body.find("<result>")? + "<result>".len();
        let len = body[start..].find("</result>")?;
        let code = body[start..start + len].trim().parse().ok()?;
        Some(Self::from_code(code))
    }

    /// `true` for codes the server uses to report its own failures.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::VersionDiscontinued
                | Self::InvalidVersionString
                | Self::StorageFailure
                | Self::InvalidPostData
                | Self::InvalidIncomingData
                | Self::DatabaseUnavailable
        ) || matches!(self, Self::Other(code) if *code < 0)
    }
}
