//! Tests for the HTTP client

use super::*;
use crate::config::TapConfig;
use serde_json::json;
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> TapConfig {
    TapConfig::from_json(&format!(
        r#"{{
            "start_date": "2021-01-01",
            "base_url": "{base_url}",
            "api_key": "secret-key",
            "requests_per_second": 1000
        }}"#
    ))
    .unwrap()
}

#[tokio::test]
async fn test_get_json_with_auth_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/contacts"))
        .and(bearer_token("secret-key"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .mount(&server)
        .await;

    let client = HttpClient::from_config(&test_config(&server.uri())).unwrap();
    let body: serde_json::Value = client
        .get_json("/v1/contacts", RequestConfig::new().query("page", "2"))
        .await
        .unwrap();

    assert_eq!(body, json!([{ "id": 1 }]));
}

#[tokio::test]
async fn test_client_error_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/contacts"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::from_config(&test_config(&server.uri())).unwrap();
    let err = client.get("/v1/contacts").await.unwrap_err();

    match err {
        crate::error::Error::HttpStatus { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "missing");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/contacts"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/contacts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = HttpClient::from_config(&test_config(&server.uri())).unwrap();
    let response = client.get("/v1/contacts").await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_absolute_url_bypasses_base() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    // Config points at a base URL that is never contacted.
    let config = test_config("https://unused.invalid");
    let client = HttpClient::from_config(&config).unwrap();
    let response = client
        .get(&format!("{}/elsewhere", server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[test]
fn test_invalid_base_url_rejected() {
    let config = TapConfig {
        base_url: Some("not a url".to_string()),
        ..TapConfig::default()
    };
    assert!(HttpClient::from_config(&config).is_err());
}

#[test]
fn test_client_without_base_url() {
    let config = TapConfig::default();
    assert!(HttpClient::from_config(&config).is_ok());
}
