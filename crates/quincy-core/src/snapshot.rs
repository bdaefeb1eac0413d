//! Context snapshot of the host application and device
//!
//! Collected once per registration and shared read-only with the panic hook
//! and the uploader. Every field may be missing; consumers render missing
//! values as empty text.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, warn};

use crate::config::AppConfig;

// ============================================================================
// Host environment port
// ============================================================================

/// Package metadata resolved from the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Human readable application name
    pub name: String,
    /// Package / bundle identifier
    pub package: String,
    /// Application version string
    pub version: String,
    /// Directory where crash reports are kept
    pub files_dir: PathBuf,
}

/// Source of device and application metadata.
///
/// The system adapter reads the local machine; hosts embedding the reporter
/// in another runtime (or tests) provide their own implementation.
pub trait IHostEnvironment: Send + Sync {
    /// Operating system name and release, e.g. `linux 6.8.0`.
    fn os_version(&self) -> Option<String>;

    /// Hardware model name.
    fn device_model(&self) -> Option<String>;

    /// Hardware vendor name.
    fn device_manufacturer(&self) -> Option<String>;

    /// Resolve the host application's package metadata.
    fn package_info(&self) -> anyhow::Result<PackageInfo>;
}

// ============================================================================
// ContextSnapshot
// ============================================================================

/// Device and application metadata attached to every report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub app_name: Option<String>,
    pub app_package: Option<String>,
    pub app_version: Option<String>,
    pub os_version: Option<String>,
    pub device_model: Option<String>,
    pub device_manufacturer: Option<String>,
    pub files_dir: Option<PathBuf>,
    pub sender_version: String,
    pub contact: String,
    pub user_id: String,
}

impl ContextSnapshot {
    /// Reads the host environment and builds a fresh snapshot.
    ///
    /// Calling this again simply produces a new snapshot; the caller keeps
    /// whichever one it loaded last. A failure to resolve package metadata
    /// is logged and leaves the package fields unset.
    pub fn load(env: &dyn IHostEnvironment, app: &AppConfig) -> Self {
        let mut snapshot = Self {
            os_version: env.os_version(),
            device_model: env.device_model(),
            device_manufacturer: env.device_manufacturer(),
            sender_version: app.sender_version.clone(),
            contact: app.contact.clone(),
            user_id: app.user_id.clone(),
            ..Self::default()
        };

        match env.package_info() {
            Ok(info) => {
                snapshot.app_name = Some(info.name);
                snapshot.app_package = Some(info.package);
                snapshot.app_version = Some(info.version);
                snapshot.files_dir = Some(info.files_dir);
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to resolve package metadata");
            }
        }

        debug!(
            package = Self::text(&snapshot.app_package),
            version = Self::text(&snapshot.app_version),
            os = Self::text(&snapshot.os_version),
            "Loaded context snapshot"
        );
        snapshot
    }

    /// Renders an optional field, using empty text when it is missing.
    pub fn text(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or_default()
    }

    /// `"<manufacturer> <model>"`, as reported in `<platform>`.
    pub fn platform(&self) -> String {
        format!(
            "{} {}",
            Self::text(&self.device_manufacturer),
            Self::text(&self.device_model)
        )
    }
}

// ============================================================================
// SystemEnvironment adapter
// ============================================================================

/// [`IHostEnvironment`] backed by the local machine and the `app` section
/// of the configuration.
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
    app: AppConfig,
    reports_dir: Option<PathBuf>,
}

impl SystemEnvironment {
    /// Creates the adapter from configured app metadata and an optional
    /// explicit reports directory.
    pub fn new(app: AppConfig, reports_dir: Option<PathBuf>) -> Self {
        Self { app, reports_dir }
    }
}

impl IHostEnvironment for SystemEnvironment {
    fn os_version(&self) -> Option<String> {
        let os = std::env::consts::OS;
        match read_trimmed("/proc/sys/kernel/osrelease") {
            Some(release) => Some(format!("{os} {release}")),
            None => Some(os.to_string()),
        }
    }

    fn device_model(&self) -> Option<String> {
        read_trimmed("/sys/class/dmi/id/product_name")
    }

    fn device_manufacturer(&self) -> Option<String> {
        read_trimmed("/sys/class/dmi/id/sys_vendor")
    }

    fn package_info(&self) -> anyhow::Result<PackageInfo> {
        let package = self
            .app
            .package
            .clone()
            .context("no package identifier configured (app.package)")?;

        let files_dir = match &self.reports_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_local_dir()
                .context("no local data directory available")?
                .join(&package)
                .join("crashes"),
        };

        Ok(PackageInfo {
            name: self.app.name.clone().unwrap_or_else(|| package.clone()),
            version: self.app.version.clone().unwrap_or_default(),
            package,
            files_dir,
        })
    }
}

fn read_trimmed(path: &str) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
