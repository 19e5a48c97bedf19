//! Request client tests against a local mock backend.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};

use kms_server::http::{
    do_request, with_body, with_cancellation, with_gnap_token, with_http_client, with_method,
    with_signer, with_timeout, RequestError, RequestSigner, SignError,
};
use kms_server::lifecycle::Shutdown;

mod common;

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    Json(json!({
        "method": method.as_str(),
        "contentType": header("content-type"),
        "authorization": header("authorization"),
        "signature": header("x-signature"),
        "body": String::from_utf8_lossy(&body),
    }))
}

fn backend() -> Router {
    Router::new()
        .route("/ok", get(|| async { "hello" }))
        .route("/empty", get(|| async { StatusCode::OK }))
        .route(
            "/boom",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "errMessage": "boom" })),
                )
            }),
        )
        .route(
            "/fail-empty",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        )
        .route(
            "/not-json",
            get(|| async { (StatusCode::NOT_FOUND, "<html>missing</html>") }),
        )
        .route(
            "/created",
            get(|| async { (StatusCode::CREATED, "made it") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        )
        .route("/echo", any(echo))
}

fn echoed(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_ok_returns_raw_body() {
    let addr = common::start_mock_backend(backend()).await;

    let resp = do_request(&format!("http://{}/ok", addr), []).await.unwrap();

    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.status, "200 OK");
    assert_eq!(resp.body, b"hello".to_vec());
}

#[tokio::test]
async fn test_ok_with_empty_body() {
    let addr = common::start_mock_backend(backend()).await;

    let resp = do_request(&format!("http://{}/empty", addr), []).await.unwrap();

    assert_eq!(resp.status_code, 200);
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_error_message_is_unwrapped() {
    let addr = common::start_mock_backend(backend()).await;

    let err = do_request(&format!("http://{}/boom", addr), [])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "boom");
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn test_empty_error_body_reports_status_line() {
    let addr = common::start_mock_backend(backend()).await;

    let err = do_request(&format!("http://{}/fail-empty", addr), [])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "500 Internal Server Error");
}

#[tokio::test]
async fn test_unstructured_error_body_reports_status_line() {
    let addr = common::start_mock_backend(backend()).await;

    let err = do_request(&format!("http://{}/not-json", addr), [])
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::Status { status_code: 404, .. }));
    assert_eq!(err.to_string(), "404 Not Found");
}

#[tokio::test]
async fn test_non_200_success_is_an_error() {
    let addr = common::start_mock_backend(backend()).await;

    let err = do_request(&format!("http://{}/created", addr), [])
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "201 Created");
}

#[tokio::test]
async fn test_headers_method_and_body() {
    let addr = common::start_mock_backend(backend()).await;

    let resp = do_request(
        &format!("http://{}/echo", addr),
        [
            with_method(Method::POST),
            with_body(r#"{"keyType":"ED25519"}"#),
            with_gnap_token("abc123"),
        ],
    )
    .await
    .unwrap();

    let seen = echoed(&resp.body);
    assert_eq!(seen["method"], "POST");
    assert_eq!(seen["contentType"], "application/json");
    assert_eq!(seen["authorization"], "GNAP abc123");
    assert_eq!(seen["body"], r#"{"keyType":"ED25519"}"#);
}

#[tokio::test]
async fn test_defaults_to_get_without_auth() {
    let addr = common::start_mock_backend(backend()).await;

    let resp = do_request(&format!("http://{}/echo", addr), []).await.unwrap();

    let seen = echoed(&resp.body);
    assert_eq!(seen["method"], "GET");
    assert_eq!(seen["contentType"], "application/json");
    assert_eq!(seen["authorization"], Value::Null);
    assert_eq!(seen["body"], "");
}

/// Signs over the body length, taking the body the way a digesting signer would.
struct ConsumingSigner;

impl RequestSigner for ConsumingSigner {
    fn sign(&self, req: &mut reqwest::Request) -> Result<(), SignError> {
        let body = req.body_mut().take().ok_or("no body to sign")?;
        let len = body.as_bytes().map(<[u8]>::len).unwrap_or_default();
        req.headers_mut()
            .insert("x-signature", format!("len={len}").parse()?);
        Ok(())
    }
}

#[tokio::test]
async fn test_body_restored_after_signing() {
    let addr = common::start_mock_backend(backend()).await;
    let body = r#"{"message":"sign me"}"#;

    let resp = do_request(
        &format!("http://{}/echo", addr),
        [
            with_method(Method::POST),
            with_body(body),
            with_signer(Arc::new(ConsumingSigner)),
        ],
    )
    .await
    .unwrap();

    let seen = echoed(&resp.body);
    assert_eq!(seen["body"], body);
    assert_eq!(seen["signature"], format!("len={}", body.len()));
}

#[tokio::test]
async fn test_signer_failure() {
    let addr = common::start_mock_backend(backend()).await;
    let signer = |_: &mut reqwest::Request| -> Result<(), SignError> { Err("no key".into()) };

    let err = do_request(
        &format!("http://{}/echo", addr),
        [with_signer(Arc::new(signer))],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RequestError::Sign(_)));
    assert_eq!(err.to_string(), "sign http request: no key");
}

#[tokio::test]
async fn test_connection_refused() {
    let addr = common::closed_port().await;

    let err = do_request(&format!("http://{}/ok", addr), [])
        .await
        .unwrap_err();

    assert!(matches!(err, RequestError::Transport(_)));
    assert!(err.to_string().starts_with("http do: "));
}

#[tokio::test]
async fn test_timeout_is_a_transport_error() {
    let addr = common::start_mock_backend(backend()).await;

    let err = do_request(
        &format!("http://{}/slow", addr),
        [with_timeout(Duration::from_millis(100))],
    )
    .await
    .unwrap_err();

    match err {
        RequestError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_during_round_trip() {
    let addr = common::start_mock_backend(backend()).await;
    let shutdown = Arc::new(Shutdown::new());

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.trigger();
    });

    let err = do_request(
        &format!("http://{}/slow", addr),
        [with_cancellation(shutdown.subscribe())],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, RequestError::Cancelled));
}

#[tokio::test]
async fn test_concurrent_callers_share_a_client() {
    let addr = common::start_mock_backend(backend()).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/ok", addr);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..10 {
        let client = client.clone();
        let url = url.clone();
        tasks.spawn(async move { do_request(&url, [with_http_client(client)]).await });
    }

    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap().unwrap().body, b"hello".to_vec());
    }
}
