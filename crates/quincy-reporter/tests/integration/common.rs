//! Shared helpers for uploader integration tests
//!
//! Each fixture owns a temporary report directory and a mock collection
//! server answering POSTs on [`CRASH_PATH`].

use std::sync::Arc;

use quincy_core::config::EndpointConfig;
use quincy_core::report::{self, Failure, ReportHeader};
use quincy_core::{ContextSnapshot, ReportStore};
use quincy_reporter::Uploader;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock server accepts crash uploads on.
pub const CRASH_PATH: &str = "/crash_v300.php";

/// Capture date written into test reports.
pub const REPORT_DATE: &str = "2026-10-18T09:12:44+00:00";

pub struct Fixture {
    pub server: MockServer,
    pub uploader: Uploader,
    pub store: ReportStore,
    _dir: TempDir,
}

/// Snapshot of the app the reports belong to.
pub fn snapshot() -> ContextSnapshot {
    ContextSnapshot {
        app_name: Some("Example".into()),
        app_package: Some("com.example.app".into()),
        app_version: Some("42".into()),
        os_version: Some("linux 6.8.0".into()),
        device_model: Some("ThinkPad X1".into()),
        device_manufacturer: Some("LENOVO".into()),
        files_dir: None,
        sender_version: "1".into(),
        contact: "dev@example.com".into(),
        user_id: "user-7".into(),
    }
}

/// Starts a mock server without any mounted routes and an uploader
/// pointing at it.
pub async fn setup_empty() -> Fixture {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ReportStore::new(dir.path().join("crashes"));

    let endpoint = EndpointConfig {
        url: format!("{}{CRASH_PATH}", server.uri()),
        ..EndpointConfig::default()
    };
    let uploader = Uploader::new(
        &endpoint,
        "com.example.app",
        Arc::new(snapshot()),
        store.clone(),
    )
    .expect("uploader");

    Fixture {
        server,
        uploader,
        store,
        _dir: dir,
    }
}

/// Starts a mock server that answers every upload with `response`.
pub async fn setup_with(response: ResponseTemplate) -> Fixture {
    let fixture = setup_empty().await;
    Mock::given(method("POST"))
        .and(path(CRASH_PATH))
        .respond_with(response)
        .mount(&fixture.server)
        .await;
    fixture
}

/// Writes a report captured with the fixture snapshot and returns its name.
pub fn write_report(store: &ReportStore, trace: &str, cause: Option<&str>) -> String {
    let header = ReportHeader::from_snapshot(&snapshot(), REPORT_DATE);
    let failure = Failure::new(trace, cause.map(str::to_string));
    let path = store
        .create(&report::render(&header, &failure))
        .expect("write report");
    file_name(&path)
}

pub fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .expect("file name")
        .to_string()
}
