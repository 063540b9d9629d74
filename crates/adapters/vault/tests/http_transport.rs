//! HttpTransport against a fake Vault HTTP API

use secretary_common::{CheckState, HealthStatus};
use secretary_vault::{
    HttpTransport, SERVICE_NAME, Transport, TransportError, VaultClient, VaultConfigBuilder,
    VaultError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, retries: u32) -> VaultClient<HttpTransport> {
    let _ = secretary_telemetry::init_tracing("debug");
    let config = VaultConfigBuilder::new(server.uri())
        .with_token("hvs.test-token")
        .with_max_retries(retries)
        .with_retry_wait(1, 5)
        .build();
    VaultClient::new(&config).expect("Failed to create client")
}

#[tokio::test]
async fn test_read_sends_token_and_returns_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/shared/app/key"))
        .and(header("X-Vault-Token", "hvs.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "abc",
            "lease_duration": 2764800,
            "data": {"api_key": "xyz"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let value = client.read_key("secret/shared/app/key", "api_key").await.unwrap();
    assert_eq!(value, "xyz");
}

#[tokio::test]
async fn test_read_not_found_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let client = client(&server, 0);
    assert!(client.read("secret/missing").await.unwrap().is_empty());
    assert!(client.transport().read_path("secret/missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleted_version_keeps_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/deleted"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "data": {
                "data": null,
                "metadata": {"version": 3, "deletion_time": "2024-01-01T00:00:00Z", "destroyed": false}
            }
        })))
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let err = client.versioned_read("secret/data/deleted").await.unwrap_err();
    assert_eq!(err, VaultError::DataNotFound);
}

#[tokio::test]
async fn test_versioned_read_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "data": {"k": "v"},
                "metadata": {"version": 5, "created_time": "2024-01-01T00:00:00Z"}
            }
        })))
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let (value, version) = client.versioned_read_key("secret/data/app", "k").await.unwrap();
    assert_eq!(value, "v");
    assert_eq!(version, 5);
}

#[tokio::test]
async fn test_versioned_write_sends_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/secret/data/app"))
        .and(body_json(json!({"data": {"k": "v"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"version": 1, "created_time": "2024-01-01T00:00:00Z"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 0);
    client.versioned_write_key("secret/data/app", "k", "v").await.unwrap();
}

#[tokio::test]
async fn test_write_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/secret/app"))
        .and(body_json(json!({"k": "v"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 0);
    client.write_key("secret/app", "k", "v").await.unwrap();
}

#[tokio::test]
async fn test_permission_denied_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/forbidden"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 3);
    let err = client.read("secret/forbidden").await.unwrap_err();
    match err {
        VaultError::Transport(TransportError::Status { code, message }) => {
            assert_eq!(code, 403);
            assert!(message.contains("permission denied"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/flaky"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"errors": ["internal"]})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"k": "v"}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 2);
    assert_eq!(client.read_key("secret/flaky", "k").await.unwrap(), "v");
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server, 2);
    let err = client.read("secret/down").await.unwrap_err();
    assert!(matches!(
        err,
        VaultError::Transport(TransportError::Status { code: 503, .. })
    ));
}

#[tokio::test]
async fn test_health_reporter_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/health"))
        .and(query_param("uninitcode", "299"))
        .and(query_param("sealedcode", "299"))
        .respond_with(ResponseTemplate::new(299).set_body_json(json!({
            "initialized": false,
            "sealed": true,
            "standby": false,
            "version": "1.15.0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let state = CheckState::new(SERVICE_NAME);
    client.health_reporter().checker(&state).await;

    assert_eq!(state.status(), Some(HealthStatus::Critical));
    assert_eq!(state.message(), "vault not initialised");
}

#[tokio::test]
async fn test_health_document_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "initialized": true,
            "sealed": false,
            "standby": false,
            "performance_standby": false,
            "server_time_utc": 1700000000,
            "version": "1.15.0",
            "cluster_name": "vault-cluster-1",
            "cluster_id": "abc-123"
        })))
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let health = client.transport().health().await.unwrap();
    assert!(health.initialized);
    assert_eq!(health.version, "1.15.0");
    assert_eq!(health.cluster_name, "vault-cluster-1");

    let state = CheckState::new(SERVICE_NAME);
    client.health_reporter().checker(&state).await;
    assert!(state.snapshot().is_healthy());
}

#[tokio::test]
async fn test_unreachable_server_reports_critical() {
    let config = VaultConfigBuilder::new("http://127.0.0.1:1")
        .with_max_retries(0)
        .with_connection_timeout(1)
        .build();
    let client = VaultClient::new(&config).unwrap();
    let state = CheckState::new(SERVICE_NAME);

    client.health_reporter().checker(&state).await;

    let check = state.snapshot();
    assert_eq!(check.status, Some(HealthStatus::Critical));
    assert!(check.message.starts_with("connection error"));
}
