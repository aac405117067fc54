//! Integration tests for the web demo routes.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use tinygen::server::{create_router, AppState, GenerateResponse};

fn test_state() -> AppState {
    AppState::new(common::tiny_generator_no_eos(), "test-model")
}

async fn post_generate(state: AppState, body: &str) -> (StatusCode, String) {
    let app = create_router(state);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn index_serves_the_demo_page() {
    let app = create_router(test_state());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("Generate"));
}

#[tokio::test]
async fn generate_returns_text_with_the_prompt_prefix() {
    let (status, body) = post_generate(
        test_state(),
        r#"{"prompt": "hello world", "max_length": 10, "temperature": 0.7, "top_p": 0.9}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: GenerateResponse = serde_json::from_str(&body).unwrap();
    assert!(
        response.text.starts_with("hello world"),
        "got: {}",
        response.text
    );
}

#[tokio::test]
async fn generate_applies_defaults_for_missing_fields() {
    let (status, body) = post_generate(test_state(), r#"{"prompt": "hello"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let response: GenerateResponse = serde_json::from_str(&body).unwrap();
    assert!(response.text.starts_with("hello"));
}

#[tokio::test]
async fn failed_generation_becomes_an_error_string() {
    // An empty prompt cannot be tokenized; the handler must still answer
    // 200 with the failure rendered into the text.
    let (status, body) = post_generate(test_state(), r#"{"prompt": ""}"#).await;

    assert_eq!(status, StatusCode::OK);
    let response: GenerateResponse = serde_json::from_str(&body).unwrap();
    assert!(
        response.text.starts_with("Error:"),
        "got: {}",
        response.text
    );
}

#[tokio::test]
async fn sequential_requests_share_one_generator() {
    let state = test_state();

    for _ in 0..3 {
        let (status, body) = post_generate(
            state.clone(),
            r#"{"prompt": "the quick", "max_length": 10}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let response: GenerateResponse = serde_json::from_str(&body).unwrap();
        assert!(response.text.starts_with("the quick"));
    }
}
