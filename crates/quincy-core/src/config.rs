//! Configuration module for Quincy.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Connect timeout used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// User agent sent with every upload.
pub const DEFAULT_USER_AGENT: &str = "Quincy/Rust";

/// Protocol version reported in `<senderversion>`.
pub const DEFAULT_SENDER_VERSION: &str = "1";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for the crash reporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub app: AppConfig,
    pub reports: ReportsConfig,
    pub logging: LoggingConfig,
}

/// Where and how reports are delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Collection endpoint receiving the multipart POST.
    pub url: String,
    /// Seconds allowed for establishing the connection.
    pub connect_timeout_secs: u64,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Accept any server certificate and hostname.
    ///
    /// Only for legacy collection servers with self-signed certificates.
    /// Leave this off everywhere else.
    pub insecure_skip_tls_verify: bool,
}

/// Application metadata and reporter identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application identifier on the server. Defaults to the package id.
    pub identifier: Option<String>,
    /// Human readable application name. Defaults to the package id.
    pub name: Option<String>,
    /// Package / bundle identifier, e.g. `com.example.app`.
    pub package: Option<String>,
    /// Application version string.
    pub version: Option<String>,
    /// Value of `<userid>` in every report.
    pub user_id: String,
    /// Value of `<contact>` in every report.
    pub contact: String,
    /// Value of `<senderversion>` in every report.
    pub sender_version: String,
}

/// Local report storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Directory holding pending reports. `None` derives one from the package id.
    pub dir: Option<PathBuf>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/quincy/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("quincy")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            insecure_skip_tls_verify: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            identifier: None,
            name: None,
            package: None,
            version: None,
            user_id: "1".to_string(),
            contact: String::new(),
            sender_version: DEFAULT_SENDER_VERSION.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"endpoint.url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- endpoint ---
        match url::Url::parse(&self.endpoint.url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => errors.push(ValidationError {
                field: "endpoint.url".into(),
                message: format!(
                    "unsupported scheme '{}'; expected http or https",
                    parsed.scheme()
                ),
            }),
            Err(e) => errors.push(ValidationError {
                field: "endpoint.url".into(),
                message: format!("invalid URL '{}': {e}", self.endpoint.url),
            }),
        }
        if self.endpoint.connect_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "endpoint.connect_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.endpoint.user_agent.trim().is_empty() {
            errors.push(ValidationError {
                field: "endpoint.user_agent".into(),
                message: "must not be empty".into(),
            });
        }

        // --- app ---
        if self.app.sender_version.trim().is_empty() {
            errors.push(ValidationError {
                field: "app.sender_version".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use quincy_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .endpoint_url("https://crashes.example.com/crash_v300.php")
///     .app_package("com.example.app")
///     .app_version("1.2.0")
///     .build();
/// assert!(config.validate().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- endpoint ---

    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint.url = url.into();
        self
    }

    pub fn endpoint_connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.endpoint.connect_timeout_secs = seconds;
        self
    }

    pub fn endpoint_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.endpoint.user_agent = user_agent.into();
        self
    }

    pub fn endpoint_insecure_skip_tls_verify(mut self, insecure: bool) -> Self {
        self.config.endpoint.insecure_skip_tls_verify = insecure;
        self
    }

    // --- app ---

    pub fn app_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.config.app.identifier = Some(identifier.into());
        self
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config.app.name = Some(name.into());
        self
    }

    pub fn app_package(mut self, package: impl Into<String>) -> Self {
        self.config.app.package = Some(package.into());
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.config.app.version = Some(version.into());
        self
    }

    pub fn app_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.config.app.user_id = user_id.into();
        self
    }

    pub fn app_contact(mut self, contact: impl Into<String>) -> Self {
        self.config.app.contact = contact.into();
        self
    }

    // --- reports ---

    pub fn reports_dir(mut self, dir: PathBuf) -> Self {
        self.config.reports.dir = Some(dir);
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
