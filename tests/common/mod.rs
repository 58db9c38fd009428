//! Shared helpers for driving the router in-process
#![allow(dead_code)]

use acompany::{config::ServerConfig, server::build_router, AppContext};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const SUPERUSER_EMAIL: &str = "admin@gmail.com";
pub const SUPERUSER_PASSWORD: &str = "10101010";

/// Smallest byte string the format sniffer accepts as PNG
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

pub async fn app() -> Router {
    let ctx = AppContext::new(ServerConfig::in_memory(SECRET))
        .await
        .expect("context");
    build_router(ctx)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&value).unwrap())
        }
        None => Body::empty(),
    };
    dispatch(app, builder.body(body).unwrap()).await
}

pub async fn upload(
    app: &Router,
    uri: &str,
    token: &str,
    bytes: &[u8],
    content_type: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", content_type)
        .body(Body::from(bytes.to_vec()))
        .unwrap();
    dispatch(app, request).await
}

async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Register an account and return its token and id
pub async fn register(app: &Router, email: &str, password: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": password,
            "confirmPassword": password,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["identity"]["id"].as_str().unwrap().to_string(),
    )
}

/// Register and pick an element
pub async fn member(app: &Router, email: &str, element: &str) -> (String, String) {
    let (token, id) = register(app, email, "pw").await;
    let (status, body) = send(
        app,
        Method::POST,
        "/api/element-selection",
        Some(&token),
        Some(json!({ "element": element })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "selection failed: {}", body);
    (token, id)
}

pub async fn superuser(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": SUPERUSER_EMAIL, "password": SUPERUSER_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}
