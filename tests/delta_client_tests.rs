//! HTTP delta source tests against a wiremock server.

mod test_utils;

use std::time::Duration;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use serde_json::json;
use termsync::remote::http::EXPORT_DATE_HEADER;
use termsync::remote::{DeltaSource, FetchError, HttpDeltaSource};

use test_utils::{concept_record, export_zip, mapping_record, ts};

const EXPORT_DATE: &str = "2025-06-01T12:00:00+00:00";

fn source() -> HttpDeltaSource {
    HttpDeltaSource::new(Duration::from_secs(5)).expect("client builds")
}

fn zip_response(payload: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header(EXPORT_DATE_HEADER, EXPORT_DATE)
        .set_body_bytes(export_zip(&payload))
}

#[tokio::test]
async fn fetch_decodes_records_and_export_date() {
    let server = MockServer::start().await;
    let payload = json!({
        "records": [
            concept_record("00001001-0000-0000-0000-000000000000", "1001"),
            mapping_record(
                "697bf112-a7ca-3ae3-af4f-8b46e3af7f10",
                "00001001-0000-0000-0000-000000000000",
                "00001002-0000-0000-0000-000000000000"
            )
        ]
    });

    Mock::given(method("GET"))
        .and(path("/sources/ciel"))
        .respond_with(zip_response(payload))
        .mount(&server)
        .await;

    let response = source()
        .fetch_updates(&format!("{}/sources/ciel", server.uri()), None, None)
        .await
        .unwrap();

    assert_eq!(response.record_count, 2);
    assert_eq!(response.records.len(), 2);
    assert_eq!(response.updated_to, ts(EXPORT_DATE));
}

#[tokio::test]
async fn empty_export_decodes_to_zero_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sources/ciel"))
        .respond_with(zip_response(json!({})))
        .mount(&server)
        .await;

    let response = source()
        .fetch_updates(&format!("{}/sources/ciel", server.uri()), None, None)
        .await
        .unwrap();

    assert_eq!(response.record_count, 0);
    assert_eq!(response.updated_to, ts(EXPORT_DATE));
}

#[tokio::test]
async fn token_and_since_bound_ride_on_the_request() {
    let server = MockServer::start().await;
    let since = ts("2025-05-20T08:30:00Z");

    Mock::given(method("GET"))
        .and(path("/sources/ciel"))
        .and(header("Authorization", "Token secret-token"))
        .and(query_param("updatedSince", since.to_rfc3339()))
        .respond_with(zip_response(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    source()
        .fetch_updates(
            &format!("{}/sources/ciel", server.uri()),
            Some("secret-token"),
            Some(since),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn http_error_status_is_a_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sources/ciel"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = source()
        .fetch_updates(&format!("{}/sources/ciel", server.uri()), None, None)
        .await;

    match result {
        Err(FetchError::Transport { message }) => assert!(message.contains("503")),
        other => panic!("expected transport failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    // Nothing listens on this port.
    let result = source()
        .fetch_updates("http://127.0.0.1:9/sources/ciel", None, None)
        .await;

    assert!(matches!(result, Err(FetchError::Transport { .. })));
}

#[tokio::test]
async fn non_zip_body_is_a_protocol_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sources/ciel"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(EXPORT_DATE_HEADER, EXPORT_DATE)
                .set_body_string("{\"records\": []}"),
        )
        .mount(&server)
        .await;

    let result = source()
        .fetch_updates(&format!("{}/sources/ciel", server.uri()), None, None)
        .await;

    assert!(matches!(result, Err(FetchError::Protocol { .. })));
}

#[tokio::test]
async fn unparseable_export_date_is_a_protocol_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sources/ciel"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(EXPORT_DATE_HEADER, "yesterday-ish")
                .set_body_bytes(export_zip(&json!({}))),
        )
        .mount(&server)
        .await;

    let result = source()
        .fetch_updates(&format!("{}/sources/ciel", server.uri()), None, None)
        .await;

    match result {
        Err(FetchError::Protocol { message }) => assert!(message.contains("X-Export-Date")),
        other => panic!("expected protocol failure, got {other:?}"),
    }
}

#[tokio::test]
async fn archive_without_export_entry_is_a_protocol_failure() {
    use std::io::Write;
    use zip::write::FileOptions;

    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        writer
            .start_file("README.txt", FileOptions::default())
            .unwrap();
        writer.write_all(b"wrong entry").unwrap();
        writer.finish().unwrap();
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sources/ciel"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(EXPORT_DATE_HEADER, EXPORT_DATE)
                .set_body_bytes(buffer.into_inner()),
        )
        .mount(&server)
        .await;

    let result = source()
        .fetch_updates(&format!("{}/sources/ciel", server.uri()), None, None)
        .await;

    match result {
        Err(FetchError::Protocol { message }) => assert!(message.contains("export.json")),
        other => panic!("expected protocol failure, got {other:?}"),
    }
}
