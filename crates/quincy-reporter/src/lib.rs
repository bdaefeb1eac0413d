//! Quincy Reporter - panic capture and crash report delivery
//!
//! Provides:
//! - `hook`: a chained, process-wide panic hook writing reports to disk
//! - `payload`: the `<crashes>` XML document and its multipart envelope
//! - `response`: decoding of the collection server's status reply
//! - `uploader`: delivery of pending reports to the collection endpoint
//! - `manager`: `CrashManager`, the single registration entry point
//!
//! ```no_run
//! use quincy_core::ConfigBuilder;
//! use quincy_reporter::CrashManager;
//!
//! let config = ConfigBuilder::new()
//!     .endpoint_url("https://crashes.example.com/crash_v300.php")
//!     .app_package("com.example.app")
//!     .app_version("1.0.0")
//!     .build();
//! let mut manager = CrashManager::register(config);
//! if let Some(upload) = manager.take_upload() {
//!     upload.join();
//! }
//! ```

pub mod error;
pub mod hook;
pub mod manager;
pub mod payload;
pub mod response;
pub mod uploader;

pub use error::{ReporterError, UploadError};
pub use hook::{CaptureHook, Installation};
pub use manager::{CrashManager, UploadHandle};
pub use payload::CrashPayload;
pub use response::ServerStatus;
pub use uploader::{Delivery, UploadSummary, Uploader};
