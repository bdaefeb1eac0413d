//! Integration tests for delivery and retention of reports
//!
//! A report is deleted only after a response in [200, 400) with a non-empty
//! body; every other outcome keeps it on disk.

use std::sync::Arc;

use quincy_core::config::EndpointConfig;
use quincy_core::ReportStore;
use quincy_reporter::{ServerStatus, UploadError, Uploader};
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_acknowledged_report_is_deleted() {
    let fixture = common::setup_with(ResponseTemplate::new(200).set_body_string("ok")).await;
    let name = common::write_report(&fixture.store, "NullPointer at X", Some("IllegalState"));

    let summary = fixture.uploader.submit().await;

    assert_eq!(summary.delivered, vec![name]);
    assert!(summary.is_clean());
    assert!(fixture.store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_server_status_is_decoded() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?><result>-80</result>"#;
    let fixture = common::setup_with(ResponseTemplate::new(200).set_body_string(body)).await;
    let name = common::write_report(&fixture.store, "trace", None);

    let delivery = fixture
        .uploader
        .submit_report(&name)
        .await
        .expect("delivery");

    assert_eq!(delivery.status, 200);
    assert_eq!(delivery.server_status, Some(ServerStatus::Queued));
    assert!(!fixture.store.has_pending());
}

#[tokio::test]
async fn test_not_found_keeps_report() {
    let fixture =
        common::setup_with(ResponseTemplate::new(404).set_body_string("not found")).await;
    let name = common::write_report(&fixture.store, "trace", Some("cause"));

    let err = fixture.uploader.submit_report(&name).await.unwrap_err();

    match err {
        UploadError::Rejected { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fixture.store.list().unwrap(), vec![name]);
}

#[tokio::test]
async fn test_server_error_keeps_report() {
    let fixture = common::setup_with(ResponseTemplate::new(500).set_body_string("boom")).await;
    let name = common::write_report(&fixture.store, "trace", None);

    let summary = fixture.uploader.submit().await;

    assert!(summary.delivered.is_empty());
    assert_eq!(summary.retained.len(), 1);
    assert_eq!(summary.retained[0].0, name);
    assert!(fixture.store.has_pending());
}

#[tokio::test]
async fn test_empty_body_keeps_report() {
    let fixture = common::setup_with(ResponseTemplate::new(200)).await;
    let name = common::write_report(&fixture.store, "trace", None);

    let err = fixture.uploader.submit_report(&name).await.unwrap_err();

    assert!(matches!(err, UploadError::Rejected { status: 200, .. }));
    assert_eq!(fixture.store.list().unwrap(), vec![name]);
}

#[tokio::test]
async fn test_malformed_report_is_skipped() {
    let fixture = common::setup_empty().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let good = common::write_report(&fixture.store, "trace", Some("cause"));
    let bad_path = fixture
        .store
        .create("Package: com.example.app\n\nno separator here")
        .unwrap();
    let bad = common::file_name(&bad_path);

    let summary = fixture.uploader.submit().await;

    assert_eq!(summary.delivered, vec![good]);
    assert_eq!(summary.retained.len(), 1);
    assert_eq!(summary.retained[0].0, bad);
    assert!(summary.retained[0].1.starts_with("malformed report"));
    assert_eq!(fixture.store.list().unwrap(), vec![bad]);
}

#[tokio::test]
async fn test_each_report_is_posted_once() {
    let fixture = common::setup_empty().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(3)
        .mount(&fixture.server)
        .await;

    for i in 0..3 {
        common::write_report(&fixture.store, &format!("trace {i}"), None);
    }

    let summary = fixture.uploader.submit().await;

    assert_eq!(summary.delivered.len(), 3);
    assert!(!fixture.store.has_pending());
}

#[tokio::test]
async fn test_empty_store_sends_nothing() {
    let fixture = common::setup_empty().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(0)
        .mount(&fixture.server)
        .await;

    let summary = fixture.uploader.submit().await;

    assert!(summary.delivered.is_empty());
    assert!(summary.retained.is_empty());
}

#[tokio::test]
async fn test_unreachable_endpoint_keeps_report() {
    let dir = tempfile::tempdir().unwrap();
    let store = ReportStore::new(dir.path().to_path_buf());
    let name = common::write_report(&store, "trace", Some("cause"));

    let endpoint = EndpointConfig {
        url: "http://127.0.0.1:1/crash_v300.php".into(),
        ..EndpointConfig::default()
    };
    let uploader = Uploader::new(
        &endpoint,
        "com.example.app",
        Arc::new(common::snapshot()),
        store.clone(),
    )
    .unwrap();

    let err = uploader.submit_report(&name).await.unwrap_err();

    assert!(matches!(err, UploadError::Network(_)));
    assert_eq!(store.list().unwrap(), vec![name]);
}
