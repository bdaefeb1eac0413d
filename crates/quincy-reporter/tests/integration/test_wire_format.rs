//! Integration tests for the upload wire format
//!
//! Checks the multipart envelope, the request headers and the `<crash>`
//! fields as the collection server receives them.

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_request_envelope() {
    let fixture = common::setup_empty().await;
    Mock::given(method("POST"))
        .and(path(common::CRASH_PATH))
        .and(header("content-type", "multipart/form-data; boundary=----FOO"))
        .and(header("user-agent", "Quincy/Rust"))
        .and(body_string_contains(
            "------FOO\r\nContent-Disposition: form-data; name=\"xmlstring\"\r\n\r\n<crashes><crash>",
        ))
        .and(body_string_contains("</crash></crashes>\r\n------FOO--\r\n"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&fixture.server)
        .await;

    common::write_report(&fixture.store, "NullPointer at X", Some("IllegalState"));

    let summary = fixture.uploader.submit().await;
    assert_eq!(summary.delivered.len(), 1);
}

#[tokio::test]
async fn test_crash_fields() {
    let fixture = common::setup_with(ResponseTemplate::new(200).set_body_string("ok")).await;
    common::write_report(&fixture.store, "NullPointer at X", Some("IllegalState"));

    fixture.uploader.submit().await;

    let requests = fixture.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8(requests[0].body.clone()).unwrap();

    assert!(body.contains("<applicationname>Example</applicationname>"));
    assert!(body.contains("<bundleidentifier>com.example.app</bundleidentifier>"));
    assert!(body.contains("<systemversion>linux 6.8.0</systemversion>"));
    assert!(body.contains("<platform>LENOVO ThinkPad X1</platform>"));
    assert!(body.contains("<senderversion>1</senderversion>"));
    assert!(body.contains("<version>42</version>"));
    assert!(body.contains("<userid>user-7</userid>"));
    assert!(body.contains("<contact>dev@example.com</contact>"));
    assert!(body.contains("<description><![CDATA[IllegalState"));
}

#[tokio::test]
async fn test_log_carries_header_and_trace() {
    let fixture = common::setup_with(ResponseTemplate::new(200).set_body_string("ok")).await;
    common::write_report(&fixture.store, "NullPointer at X", Some("IllegalState"));

    fixture.uploader.submit().await;

    let requests = fixture.server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();

    let log_start = body.find("<log><![CDATA[").unwrap();
    let log_end = body.find("]]></log>").unwrap();
    let log = &body[log_start + "<log><![CDATA[".len()..log_end];

    assert!(log.starts_with("Package: com.example.app\nVersion: 42\n"));
    assert!(log.contains(&format!("Date: {}\n", common::REPORT_DATE)));
    assert!(log.ends_with("NullPointer at X\n"));
    assert!(!log.contains("IllegalState"));
}

#[tokio::test]
async fn test_missing_cause_is_reported() {
    let fixture = common::setup_with(ResponseTemplate::new(200).set_body_string("ok")).await;
    common::write_report(&fixture.store, "NullPointer at X", None);

    fixture.uploader.submit().await;

    let requests = fixture.server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("<description><![CDATA[No cause recorded"));
}
