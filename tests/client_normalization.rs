//! Drives the API client against a local server to pin the error
//! normalization contract: one-shot body reads, status-specific defaults,
//! and a timeout error distinct from transport failures.

use ant_support::client::{ApiClient, ApiClientConfig};
use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/ok", get(|| async { Json(json!({"success": true, "data": [1, 2]})) }))
        .route("/empty-200", get(|| async { "" }))
        .route("/empty-409", get(|| async { (StatusCode::CONFLICT, "") }))
        .route(
            "/dup",
            get(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "success": false,
                        "error": "A device with this name already exists",
                        "errorType": "DUPLICATE_ERROR",
                    })),
                )
            }),
        )
        .route("/text-500", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: String) -> ApiClient {
    ApiClient::new(ApiClientConfig {
        base_url,
        timeout: Duration::from_secs(5),
    })
}

#[tokio::test]
async fn successful_response_returns_parsed_body() {
    let client = client(spawn_server().await);
    let body = client.get("/ok", &[]).await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([1, 2]));
}

#[tokio::test]
async fn empty_success_body_is_an_empty_object() {
    let client = client(spawn_server().await);
    let body = client.get("/empty-200", &[]).await.unwrap();
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn empty_conflict_gets_a_synthesized_body() {
    let client = client(spawn_server().await);
    let err = client.get("/empty-409", &[]).await.unwrap_err();
    assert_eq!(err.status, 409);
    assert_eq!(err.error_type, "EMPTY_RESPONSE");
    assert!(err.message.contains("Conflict"));
    assert!(err.body.get("suggestion").is_some());
}

#[tokio::test]
async fn server_error_type_is_carried_through() {
    let client = client(spawn_server().await);
    let err = client.get("/dup", &[]).await.unwrap_err();
    assert_eq!(err.status, 409);
    assert_eq!(err.error_type, "DUPLICATE_ERROR");
    assert!(err.message.contains("already exists"));
}

#[tokio::test]
async fn plain_text_error_body_becomes_the_message() {
    let client = client(spawn_server().await);
    let err = client.get("/text-500", &[]).await.unwrap_err();
    assert_eq!(err.status, 500);
    assert_eq!(err.message, "HTTP 500: boom");
    assert_eq!(err.body["message"], "boom");
}

#[tokio::test]
async fn timeout_raises_the_distinct_timeout_error() {
    let client = client(spawn_server().await);
    let err = client
        .request(
            reqwest::Method::GET,
            "/slow",
            &[],
            None,
            Some(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.status, 408);
    assert_ne!(err.error_type, "NETWORK_ERROR");
}

#[tokio::test]
async fn connection_refused_is_a_network_error_not_a_timeout() {
    // Bind-then-drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client(format!("http://{addr}"));
    let err = client.get("/ok", &[]).await.unwrap_err();
    assert!(!err.is_timeout());
    assert_eq!(err.status, 0);
    assert_eq!(err.error_type, "NETWORK_ERROR");
}
