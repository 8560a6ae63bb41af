//! Non-streaming dispatch against a mock upstream.

mod test_utils;

use serde_json::json;
use std::time::{Duration, Instant};
use test_utils::{MockReply, MockUpstream};
use yuki_core::{ChatTurn, GenerationRequest};
use yuki_inference::{ApiMode, Endpoint, GatewayErrorKind, InferenceClient};

fn request() -> GenerationRequest {
    GenerationRequest::new(
        "Be brief.",
        "User: hi\nAssistant:",
        vec![ChatTurn::system("Be brief."), ChatTurn::user("hi")],
    )
}

fn generate_ok(text: &str) -> MockReply {
    MockReply::Json(json!({"response": text, "done": true}))
}

fn chat_ok(text: &str) -> MockReply {
    MockReply::Json(json!({"message": {"role": "assistant", "content": text}, "done": true}))
}

#[tokio::test]
async fn test_generate_mode_success() -> anyhow::Result<()> {
    let mock = MockUpstream::start(
        vec![MockReply::Json(json!({
            "response": "hello there",
            "prompt_eval_count": 10,
            "eval_count": 5,
            "done": true
        }))],
        vec![],
        vec![],
    )
    .await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 3))?;

    let result = client.complete_once(&request()).await?;

    assert_eq!(result.text(), "hello there");
    assert_eq!(*result.endpoint_used(), Endpoint::Generate);
    assert_eq!(result.model_id(), "test-model");
    assert_eq!(*result.token_estimate(), 15);
    assert_eq!(result.raw_payload()["eval_count"], 5);

    let sent = mock.generate.bodies();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["stream"], false);
    assert_eq!(sent[0]["model"], "test-model");
    assert_eq!(sent[0]["system"], "Be brief.");
    assert_eq!(sent[0]["prompt"], "User: hi\nAssistant:");
    Ok(())
}

#[tokio::test]
async fn test_chat_mode_sends_messages_and_estimates_tokens() -> anyhow::Result<()> {
    let mock = MockUpstream::start(vec![], vec![chat_ok("0123456789ab")], vec![]).await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Chat, 3))?;

    let result = client.complete_once(&request()).await?;

    assert_eq!(result.text(), "0123456789ab");
    assert_eq!(*result.endpoint_used(), Endpoint::Chat);
    // "Be brief." (9) + "hi" (2) + reply (12) = 23 chars
    assert_eq!(*result.token_estimate(), 5);
    let sent = mock.chat.bodies();
    assert_eq!(sent[0]["messages"][1], json!({"role": "user", "content": "hi"}));
    assert_eq!(mock.generate.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_repeated_server_errors_exhaust_budget() -> anyhow::Result<()> {
    let mock = MockUpstream::start(vec![MockReply::Status(500)], vec![], vec![]).await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 3))?;

    let err = client.complete_once(&request()).await.unwrap_err();

    assert_eq!(mock.generate.hits(), 3);
    assert!(matches!(err.kind, GatewayErrorKind::Exhausted { attempts: 3, .. }));
    assert_eq!(err.code(), "retries_exhausted");
    Ok(())
}

#[tokio::test]
async fn test_fewer_failures_than_budget_recover() -> anyhow::Result<()> {
    let mock = MockUpstream::start(
        vec![MockReply::Status(503), MockReply::Status(500), generate_ok("ok")],
        vec![],
        vec![],
    )
    .await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 5))?;

    let result = client.complete_once(&request()).await?;

    assert_eq!(result.text(), "ok");
    assert_eq!(mock.generate.hits(), 3);
    Ok(())
}

#[tokio::test]
async fn test_retry_after_hint_is_honoured() -> anyhow::Result<()> {
    let mock = MockUpstream::start(
        vec![MockReply::RateLimited("0.3".into()), generate_ok("ok")],
        vec![],
        vec![],
    )
    .await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 2))?;

    let started = Instant::now();
    let result = client.complete_once(&request()).await?;

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(result.text(), "ok");
    assert_eq!(mock.generate.hits(), 2);
    Ok(())
}

#[tokio::test]
async fn test_auto_mode_falls_back_on_not_found() -> anyhow::Result<()> {
    let mock = MockUpstream::start(vec![generate_ok("from generate")], vec![], vec![]).await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Auto, 3))?;

    let result = client.complete_once(&request()).await?;

    assert_eq!(*result.endpoint_used(), Endpoint::Generate);
    assert_eq!(result.text(), "from generate");
    assert_eq!(mock.chat.hits(), 1);
    assert_eq!(mock.generate.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn test_auto_mode_prefers_chat() -> anyhow::Result<()> {
    let mock = MockUpstream::start(vec![generate_ok("nope")], vec![chat_ok("yes")], vec![]).await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Auto, 3))?;

    let result = client.complete_once(&request()).await?;

    assert_eq!(*result.endpoint_used(), Endpoint::Chat);
    assert_eq!(mock.generate.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_auto_mode_does_not_fall_back_on_other_failures() -> anyhow::Result<()> {
    let mock = MockUpstream::start(
        vec![generate_ok("unused")],
        vec![MockReply::Status(500)],
        vec![],
    )
    .await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Auto, 2))?;

    let err = client.complete_once(&request()).await.unwrap_err();

    assert_eq!(err.code(), "retries_exhausted");
    assert_eq!(mock.chat.hits(), 2);
    assert_eq!(mock.generate.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_chat_mode_surfaces_not_found() -> anyhow::Result<()> {
    let mock = MockUpstream::start(vec![generate_ok("unused")], vec![], vec![]).await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Chat, 3))?;

    let err = client.complete_once(&request()).await.unwrap_err();

    assert_eq!(err.code(), "endpoint_not_found");
    assert_eq!(mock.chat.hits(), 1);
    assert_eq!(mock.generate.hits(), 0);
    Ok(())
}

#[tokio::test]
async fn test_client_error_is_not_retried() -> anyhow::Result<()> {
    let mock = MockUpstream::start(vec![MockReply::Status(400)], vec![], vec![]).await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 3))?;

    let err = client.complete_once(&request()).await.unwrap_err();

    assert!(matches!(err.kind, GatewayErrorKind::Http { status: 400, .. }));
    assert_eq!(mock.generate.hits(), 1);
    Ok(())
}

#[tokio::test]
async fn test_reported_error_is_retried_then_exhausted() -> anyhow::Result<()> {
    let mock = MockUpstream::start(
        vec![MockReply::Json(json!({"error": "model is loading"}))],
        vec![],
        vec![],
    )
    .await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 2))?;

    let err = client.complete_once(&request()).await.unwrap_err();

    assert_eq!(mock.generate.hits(), 2);
    assert_eq!(err.code(), "retries_exhausted");
    assert!(err.detail().contains("model is loading"));
    Ok(())
}

#[tokio::test]
async fn test_malformed_payload_is_retried() -> anyhow::Result<()> {
    let mock = MockUpstream::start(
        vec![MockReply::Json(json!({"unexpected": true})), generate_ok("fine")],
        vec![],
        vec![],
    )
    .await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 3))?;

    let result = client.complete_once(&request()).await?;

    assert_eq!(result.text(), "fine");
    assert_eq!(mock.generate.hits(), 2);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() -> anyhow::Result<()> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);

    let config = yuki_inference::InferenceConfigBuilder::default()
        .base_url(format!("http://{}", addr))
        .retry_max_attempts(2u32)
        .retry_backoff_base(0.0)
        .timeout_secs(2.0)
        .build()?;
    let client = InferenceClient::new(&config)?;

    let err = client.complete_once(&request()).await.unwrap_err();
    assert_eq!(err.code(), "unavailable");
    Ok(())
}

#[tokio::test]
async fn test_health_reports_tags() -> anyhow::Result<()> {
    let mock = MockUpstream::start(
        vec![],
        vec![],
        vec![MockReply::Json(json!({"models": [{"name": "test-model"}]}))],
    )
    .await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 1))?;

    let report = client.health().await;

    assert!(report.is_reachable());
    assert_eq!(*report.status_code(), Some(200));
    assert_eq!(report.tags().as_ref().unwrap()["models"][0]["name"], "test-model");
    Ok(())
}

#[tokio::test]
async fn test_health_never_fails() -> anyhow::Result<()> {
    let mock = MockUpstream::start(vec![], vec![], vec![MockReply::Status(503)]).await?;
    let client = InferenceClient::new(&mock.config(ApiMode::Generate, 1))?;

    let report = client.health().await;
    assert!(!report.is_reachable());
    assert_eq!(*report.status_code(), Some(503));

    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    let mut config = mock.config(ApiMode::Generate, 1);
    config.base_url = format!("http://{}", addr);
    let report = InferenceClient::new(&config)?.health().await;
    assert!(!report.is_reachable());
    assert!(report.error().is_some());
    Ok(())
}
