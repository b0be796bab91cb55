//! Chat judge against a mocked HTTP endpoint (requires `--features ai`).
#![cfg(feature = "ai")]

use gauge::judge::{ChatJudge, JudgeError, JudgeProvider, JudgeRequest, QualityJudge};
use gauge::PromptEvaluator;
use std::sync::Arc;
use std::time::Duration;

fn openai_reply(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

fn judge_for(server: &mockito::Server, provider: JudgeProvider, path: &str) -> ChatJudge {
    ChatJudge::with_key(provider, "test-key".to_string())
        .endpoint(&format!("{}{}", server.url(), path))
        .timeout(Duration::from_secs(5))
}

#[test]
fn judge_score_is_blended_into_report() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(openai_reply("Clear but lacks context.\n100/100"))
        .create();

    let judge = judge_for(&server, JudgeProvider::HuggingFace, "/v1/chat/completions");
    let report = PromptEvaluator::new()
        .with_judge(Arc::new(judge))
        .evaluate("Résume")
        .unwrap();

    mock.assert();
    assert_eq!(report.overall_score, 86.3);
}

#[test]
fn anthropic_reply_shape() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"content": [{"type": "text", "text": "Grade: 72/100"}]}"#)
        .create();

    let judge = judge_for(&server, JudgeProvider::Anthropic, "/v1/messages");
    let score = judge.judge(&JudgeRequest::prompt("Résume")).unwrap();

    mock.assert();
    assert_eq!(score, Some(72.0));
}

#[test]
fn azure_uses_api_key_header() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/openai/deployments/gpt/chat/completions")
        .match_header("api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(openai_reply("64/100"))
        .create();

    let judge = judge_for(
        &server,
        JudgeProvider::AzureOpenai,
        "/openai/deployments/gpt/chat/completions",
    );
    assert_eq!(judge.judge(&JudgeRequest::prompt("x")).unwrap(), Some(64.0));
    mock.assert();
}

#[test]
fn unparseable_reply_falls_back_to_rules() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(openai_reply("Looks fine to me."))
        .create();

    let judge = judge_for(&server, JudgeProvider::HuggingFace, "/v1/chat/completions");
    let report = PromptEvaluator::new()
        .with_judge(Arc::new(judge))
        .evaluate("Résume")
        .unwrap();
    assert_eq!(report.overall_score, 54.3);
}

#[test]
fn server_error_falls_back_to_rules() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create();

    let judge = judge_for(&server, JudgeProvider::HuggingFace, "/v1/chat/completions");
    assert!(matches!(
        judge.judge(&JudgeRequest::prompt("x")),
        Err(JudgeError::ApiError(_))
    ));

    let report = PromptEvaluator::new()
        .with_judge(Arc::new(judge))
        .evaluate("Résume")
        .unwrap();
    assert_eq!(report.overall_score, 54.3);
}

#[test]
fn rate_limit_is_reported() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .create();

    let judge = judge_for(&server, JudgeProvider::HuggingFace, "/v1/chat/completions");
    assert!(matches!(
        judge.judge(&JudgeRequest::prompt("x")),
        Err(JudgeError::RateLimited)
    ));
}

#[test]
fn missing_endpoint_is_unavailable() {
    let judge = ChatJudge::with_key(JudgeProvider::AzureOpenai, "k".to_string());
    assert!(matches!(
        judge.judge(&JudgeRequest::prompt("x")),
        Err(JudgeError::Unavailable(_))
    ));
}
