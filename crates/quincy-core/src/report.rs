//! On-disk crash report format
//!
//! A report is plain text: a block of `Key: value` header lines, a blank
//! line, then the trace, the sentinel, the cause and the trace again:
//!
//! ```text
//! Package: com.example.app
//! Version: 42
//! OS: linux 6.8.0
//! Manufacturer: LENOVO
//! Model: ThinkPad X1
//! Date: 2026-10-18T09:12:44.120+00:00
//!
//! thread 'main' panicked at src/main.rs:10:5:
//! index out of bounds
//! ____No cause recorded
//!
//! thread 'main' panicked at src/main.rs:10:5:
//! ...
//! ```
//!
//! Everything before the first sentinel is sent as the report log, everything
//! after it as the description.

use thiserror::Error;

use crate::snapshot::ContextSnapshot;

/// File extension of pending reports.
pub const REPORT_EXTENSION: &str = "stacktrace";

/// Separator between the log section and the description section.
pub const SENTINEL: &str = "____";

/// Description used when a failure has no cause.
pub const NO_CAUSE: &str = "No cause recorded";

const PACKAGE_KEY: &str = "Package";
const VERSION_KEY: &str = "Version";
const OS_KEY: &str = "OS";
const MANUFACTURER_KEY: &str = "Manufacturer";
const MODEL_KEY: &str = "Model";
const DATE_KEY: &str = "Date";

/// Errors raised while reading a stored report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The report body has no sentinel separating log and description
    #[error("report has no '____' separator between trace and cause")]
    MissingSentinel,
}

/// A captured unhandled failure, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Full rendered trace (message, location, backtrace)
    pub trace: String,
    /// String form of the underlying cause, if any
    pub cause: Option<String>,
}

impl Failure {
    pub fn new(trace: impl Into<String>, cause: Option<String>) -> Self {
        Self {
            trace: trace.into(),
            cause,
        }
    }

    /// Renders the trace/sentinel/cause body of a report.
    pub fn render_body(&self) -> String {
        let cause = self.cause.as_deref().unwrap_or(NO_CAUSE);
        format!("{}\n{SENTINEL}{cause}\n\n{}", self.trace, self.trace)
    }
}

/// Metadata header of a report.
///
/// Fields are `None` when parsing a report that lacks the line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportHeader {
    pub package: Option<String>,
    pub version: Option<String>,
    pub os_version: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub date: Option<String>,
}

impl ReportHeader {
    /// Header for a report captured now, from the snapshot.
    pub fn from_snapshot(snapshot: &ContextSnapshot, date: impl Into<String>) -> Self {
        Self {
            package: snapshot.app_package.clone(),
            version: snapshot.app_version.clone(),
            os_version: snapshot.os_version.clone(),
            manufacturer: snapshot.device_manufacturer.clone(),
            model: snapshot.device_model.clone(),
            date: Some(date.into()),
        }
    }

    /// One `Key: value` line per field; missing values are left empty.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in [
            (PACKAGE_KEY, &self.package),
            (VERSION_KEY, &self.version),
            (OS_KEY, &self.os_version),
            (MANUFACTURER_KEY, &self.manufacturer),
            (MODEL_KEY, &self.model),
            (DATE_KEY, &self.date),
        ] {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(ContextSnapshot::text(value));
            out.push('\n');
        }
        out
    }

    /// Parses the leading header lines, stopping at the first blank line.
    fn parse(content: &str) -> Self {
        let mut header = Self::default();
        for line in content.lines() {
            if line.is_empty() {
                break;
            }
            let Some((key, value)) = line
                .split_once(": ")
                .or_else(|| line.strip_suffix(':').map(|key| (key, "")))
            else {
                continue;
            };
            let slot = match key {
                PACKAGE_KEY => &mut header.package,
                VERSION_KEY => &mut header.version,
                OS_KEY => &mut header.os_version,
                MANUFACTURER_KEY => &mut header.manufacturer,
                MODEL_KEY => &mut header.model,
                DATE_KEY => &mut header.date,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        header
    }
}

/// Full text of a report file: header, blank line, body.
pub fn render(header: &ReportHeader, failure: &Failure) -> String {
    format!("{}\n{}", header.render(), failure.render_body())
}

/// A report file split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub header: ReportHeader,
    /// Everything before the first sentinel, header included
    pub log: String,
    /// Everything after the first sentinel
    pub description: String,
}

/// Splits report content at the first sentinel.
pub fn parse(content: &str) -> Result<ParsedReport, ReportError> {
    let (log, description) = content
        .split_once(SENTINEL)
        .ok_or(ReportError::MissingSentinel)?;

    Ok(ParsedReport {
        header: ReportHeader::parse(log),
        log: log.to_string(),
        description: description.to_string(),
    })
}
