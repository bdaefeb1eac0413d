//! Local report storage
//!
//! Manages the directory of pending `<uuid>.stacktrace` files. Nothing here
//! locks the directory: a report written while a listing is in progress is
//! simply picked up by the next pass.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::report::REPORT_EXTENSION;

/// Manages the local directory of pending crash report files.
#[derive(Debug, Clone)]
pub struct ReportStore {
    reports_dir: PathBuf,
}

impl ReportStore {
    /// Creates a new store pointing at `reports_dir`.
    pub fn new(reports_dir: PathBuf) -> Self {
        Self { reports_dir }
    }

    /// Returns the fallback reports directory, used when the host did not
    /// resolve one.
    pub fn default_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("quincy")
            .join("crashes")
    }

    /// Returns the reports directory path.
    pub fn dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Full path of the report called `name`.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.reports_dir.join(name)
    }

    /// Lists the file names of all pending reports.
    ///
    /// Creates the directory on first access. The order is whatever the
    /// directory enumeration yields.
    pub fn list(&self) -> anyhow::Result<Vec<String>> {
        std::fs::create_dir_all(&self.reports_dir).with_context(|| {
            format!("Failed to create {}", self.reports_dir.display())
        })?;

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.reports_dir)? {
            let path = entry?.path();
            if !path.is_file() || !path.extension().is_some_and(|e| e == REPORT_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        debug!(dir = %self.reports_dir.display(), count = names.len(), "Listed pending reports");
        Ok(names)
    }

    /// Returns `true` if at least one report is pending.
    ///
    /// A directory that cannot be read counts as empty.
    pub fn has_pending(&self) -> bool {
        match self.list() {
            Ok(names) => !names.is_empty(),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to list pending reports");
                false
            }
        }
    }

    /// Reads the full content of one report.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD.
    pub fn read(&self, name: &str) -> anyhow::Result<String> {
        let path = self.path_of(name);
        let bytes =
            std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Writes `contents` to a new report with a random unique name.
    ///
    /// The file is created exclusively, so two captures never share a file.
    pub fn create(&self, contents: &str) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.reports_dir).with_context(|| {
            format!("Failed to create {}", self.reports_dir.display())
        })?;

        loop {
            let path = self
                .reports_dir
                .join(format!("{}.{REPORT_EXTENSION}", Uuid::new_v4()));

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create {}", path.display()))
                }
            };

            file.write_all(contents.as_bytes())
                .and_then(|()| file.sync_all())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            return Ok(path);
        }
    }

    /// Deletes one report. Failures are logged, never returned.
    pub fn delete(&self, name: &str) -> bool {
        let path = self.path_of(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(report = name, "Deleted report");
                true
            }
            Err(e) => {
                warn!(report = name, error = %e, "Failed to delete report");
                false
            }
        }
    }

    /// Deletes every pending report without uploading it.
    ///
    /// Returns the number of files removed.
    pub fn delete_all(&self) -> u32 {
        let names = match self.list() {
            Ok(names) => names,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to list reports for purge");
                return 0;
            }
        };

        let mut count = 0;
        for name in names {
            if self.delete(&name) {
                count += 1;
            }
        }
        count
    }
}
