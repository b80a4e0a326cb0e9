#![allow(clippy::unwrap_used)]
// Integration tests for `RedundaClient` using wiremock.

use bytes::Bytes;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use redunda_api::{Error, RedundaClient, TransportConfig, user_agent};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RedundaClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RedundaClient::new(
        base_url,
        SecretString::from("secret".to_owned()),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

// ── Status tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_report_status_with_version() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/status.json"))
        .and(header("user-agent", user_agent().as_str()))
        .and(body_string("key=secret&version=1.2.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "should_standby": true,
            "location": "eu-west"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client.report_status(Some("1.2.3")).await.unwrap();
    assert!(report.should_standby);
}

#[tokio::test]
async fn test_report_status_without_version() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/status.json"))
        .and(body_string("key=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "should_standby": false })))
        .expect(1)
        .mount(&server)
        .await;

    let report = client.report_status(None).await.unwrap();
    assert!(!report.should_standby);
}

#[tokio::test]
async fn test_report_status_missing_field() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "bad key" })))
        .mount(&server)
        .await;

    let result = client.report_status(None).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_report_status_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    match client.report_status(None).await {
        Err(Error::Status { status, ref body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

// ── Listing tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_files() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bots/data.json"))
        .and(query_param("key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "key": "data_slash_config.json", "updated_at": 1_700_000_000 },
            { "key": "notes.txt", "updated_at": 1_700_000_500, "size": 12 }
        ])))
        .mount(&server)
        .await;

    let files = client.list_files().await.unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].key, "data_slash_config.json");
    assert_eq!(files[0].updated_at.timestamp(), 1_700_000_000);
    assert_eq!(files[1].key, "notes.txt");
}

#[tokio::test]
async fn test_list_files_rejects_non_array() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bots/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = client.list_files().await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Content tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_download_file() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bots/data/data_slash_config.json"))
        .and(query_param("key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"a\":1}"))
        .mount(&server)
        .await;

    let content = client
        .download_file("data_slash_config.json")
        .await
        .unwrap();
    assert_eq!(content, Some(Bytes::from_static(b"{\"a\":1}")));
}

#[tokio::test]
async fn test_download_file_not_ok_is_absent() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bots/data/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bots/data/forbidden.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    assert_eq!(client.download_file("missing.txt").await.unwrap(), None);
    assert_eq!(client.download_file("forbidden.txt").await.unwrap(), None);
}

#[tokio::test]
async fn test_upload_file() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/bots/data/state.json"))
        .and(query_param("key", "secret"))
        .and(body_string("{\"running\":true}"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .upload_file("state.json", Bytes::from_static(b"{\"running\":true}"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_file_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
        .mount(&server)
        .await;

    let result = client.upload_file("state.json", Bytes::new()).await;
    assert!(
        matches!(result, Err(Error::Status { status: 401, .. })),
        "expected Status error, got: {result:?}"
    );
}
