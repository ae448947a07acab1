//! Local model backend against a mock completion runtime
//!
//! The runtime is an OpenAI-compatible server; wiremock stands in for it.
//! Generation failures of any kind must degrade to the rule-based reply.

use concierge::backend::{GenerationBackend, LocalModelBackend, LocalRuntime, TextGenerator};
use concierge::config::LocalModelConfig;
use concierge::property::PropertyProfile;
use concierge::request::{RequestType, ResidentRequest};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn runtime_config(server: &MockServer) -> LocalModelConfig {
    LocalModelConfig {
        enabled: true,
        base_url: format!("{}/v1", server.uri()),
        ..LocalModelConfig::default()
    }
}

async fn mount_models(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{ "id": "bigscience/bloom-560m", "object": "model" }]
        })))
        .mount(server)
        .await;
}

async fn create_backend(server: &MockServer, timeout: Duration) -> LocalModelBackend {
    let config = runtime_config(server);
    let runtime = LocalRuntime::connect(&config)
        .await
        .expect("runtime probe should succeed");
    LocalModelBackend::new(
        Box::new(runtime),
        Arc::new(PropertyProfile::default()),
        timeout,
        config.max_reply_chars,
    )
}

fn heat_request() -> ResidentRequest {
    ResidentRequest::new("R1", "304", RequestType::Maintenance, "There is no heat in my bedroom")
}

#[tokio::test]
async fn test_connect_fails_without_runtime() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(LocalRuntime::connect(&runtime_config(&server)).await.is_err());
}

#[tokio::test]
async fn test_runtime_reports_configured_model() {
    let server = MockServer::start().await;
    mount_models(&server).await;
    let runtime = LocalRuntime::connect(&runtime_config(&server)).await.unwrap();
    assert_eq!(runtime.model_id(), "bigscience/bloom-560m");
}

#[tokio::test]
async fn test_completion_text_becomes_reply() {
    let server = MockServer::start().await;
    mount_models(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .and(body_partial_json(json!({
            "model": "bigscience/bloom-560m",
            "max_tokens": 128,
            "top_k": 50
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": " I've asked maintenance to check your heating today." }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = create_backend(&server, Duration::from_secs(5)).await;
    let reply = backend.generate_reply(&heat_request()).await;
    assert_eq!(reply, "I've asked maintenance to check your heating today.");
}

#[tokio::test]
async fn test_prompt_ends_with_delimiter() {
    let server = MockServer::start().await;
    mount_models(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "choices": [{ "text": "Sure." }] })),
        )
        .mount(&server)
        .await;

    create_backend(&server, Duration::from_secs(5))
        .await
        .generate_reply(&heat_request())
        .await;

    let requests = server.received_requests().await.unwrap();
    let completion = requests
        .iter()
        .find(|r| r.url.path() == "/v1/completions")
        .expect("completion request sent");
    let body: serde_json::Value = serde_json::from_slice(&completion.body).unwrap();
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("Unit 304"));
    assert!(prompt.trim_end().ends_with("Elysia:"));
}

#[tokio::test]
async fn test_long_completion_truncated() {
    let server = MockServer::start().await;
    mount_models(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "text": "x".repeat(2000) }]
        })))
        .mount(&server)
        .await;

    let reply = create_backend(&server, Duration::from_secs(5))
        .await
        .generate_reply(&heat_request())
        .await;
    assert_eq!(reply.chars().count(), 500);
}

#[tokio::test]
async fn test_runtime_error_falls_back_to_rules() {
    let server = MockServer::start().await;
    mount_models(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let reply = create_backend(&server, Duration::from_secs(5))
        .await
        .generate_reply(&heat_request())
        .await;
    assert!(reply.contains("HVAC concerns in Unit 304"));
}

#[tokio::test]
async fn test_slow_runtime_falls_back_to_rules() {
    let server = MockServer::start().await;
    mount_models(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "choices": [{ "text": "late" }] }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let reply = create_backend(&server, Duration::from_secs(1))
        .await
        .generate_reply(&heat_request())
        .await;
    assert!(reply.contains("HVAC concerns"));
}

#[tokio::test]
async fn test_empty_choices_fall_back_to_rules() {
    let server = MockServer::start().await;
    mount_models(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let reply = create_backend(&server, Duration::from_secs(5))
        .await
        .generate_reply(&heat_request())
        .await;
    assert!(reply.contains("Unit 304"));
}
