//! Test utilities for integration tests
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, body::Body, http::Request};
use tempfile::TempDir;

use chatbot::anthropic::AnthropicClient;
use chatbot::api::{AUTH_COOKIE, AUTH_COOKIE_VALUE, AppState, app};
use chatbot::core::AppConfig;
use chatbot::core::db::{async_db, initialize_db};

pub const TEST_PASSWORD: &str = "test-password";
pub const TEST_MODEL: &str = "claude-test";

/// The app under test. The temporary directory holding the database
/// is removed when this is dropped.
pub struct TestApp {
    pub router: Router,
    pub static_dir: PathBuf,
    _dir: TempDir,
}

/// Creates a test application with a fresh database in a temporary
/// directory and the model API pointed at `model_host`, usually a
/// `mockito` server URL.
pub async fn test_app(model_host: &str) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("db").join("chatbot.db");
    let db_path = db_path.to_str().unwrap().to_string();

    let db = async_db(&db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let static_dir = dir.path().join("web-ui");
    std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");

    let app_config = AppConfig {
        db_path,
        static_dir: static_dir.display().to_string(),
        anthropic_api_hostname: model_host.to_string(),
        anthropic_api_key: String::from("test-api-key"),
        model: String::from(TEST_MODEL),
        max_tokens: 4096,
        system_message: String::from("You are a helpful assistant."),
        app_password: String::from(TEST_PASSWORD),
        secure_cookies: false,
    };
    let model = AnthropicClient::new(model_host, "test-api-key").unwrap();
    let app_state = AppState::new(db, Arc::new(model), app_config);

    TestApp {
        router: app(Arc::new(app_state)),
        static_dir,
        _dir: dir,
    }
}

pub fn auth_cookie() -> String {
    format!("{}={}", AUTH_COOKIE, AUTH_COOKIE_VALUE)
}

/// An authenticated request with an optional JSON body
pub fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("cookie", auth_cookie());
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    let body = body_to_string(body).await;
    serde_json::from_str(&body).unwrap()
}

/// A Messages API success body with a single text block
pub fn model_reply(text: &str) -> String {
    serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "model": TEST_MODEL,
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 10, "output_tokens": 5}
    })
    .to_string()
}
