//! Quincy Core - crash report model and local storage
//!
//! Provides:
//! - `Config`: YAML configuration with validation and a builder
//! - `ContextSnapshot`: device/app metadata collected once per registration
//! - `report`: on-disk crash report format (render and parse)
//! - `ReportStore`: the directory of pending `.stacktrace` files
//!
//! The network side (panic hook, uploader, registration) lives in
//! `quincy-reporter`.

pub mod config;
pub mod report;
pub mod snapshot;
pub mod store;

pub use config::{Config, ConfigBuilder, ValidationError};
pub use report::{Failure, ParsedReport, ReportError, ReportHeader};
pub use snapshot::{ContextSnapshot, IHostEnvironment, PackageInfo, SystemEnvironment};
pub use store::ReportStore;
