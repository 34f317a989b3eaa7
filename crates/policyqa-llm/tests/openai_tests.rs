use mockito::Matcher;
use serde_json::json;

use policyqa_core::traits::{CompletionRequest, LanguageModel};
use policyqa_llm::{LlmError, OpenAiClient};

fn request(temperature: Option<f32>) -> CompletionRequest {
    CompletionRequest {
        model: "gpt-4o-mini".to_string(),
        system: "Answer only from the context.".to_string(),
        user: "CONTEXT:\nabc\n\nQUESTION:\nq\n".to_string(),
        temperature,
    }
}

#[test]
fn chat_completion_returns_text_and_usage() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "Answer only from the context."},
                {"role": "user", "content": "CONTEXT:\nabc\n\nQUESTION:\nq\n"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "The exit criteria are met."}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 120, "completion_tokens": 7, "total_tokens": 127}
            }"#,
        )
        .create();

    let client = OpenAiClient::with_base_url("sk-test", &server.url()).expect("client");
    let completion = client.complete(&request(Some(0.0))).expect("completion");

    mock.assert();
    assert_eq!(completion.text, "The exit criteria are met.");
    assert_eq!(completion.input_tokens, 120);
    assert_eq!(completion.output_tokens, 7);
    assert_eq!(completion.total_tokens, 127);
}

#[test]
fn api_error_status_is_distinguishable_from_empty_answer() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"quota exceeded"}}"#)
        .create();

    let client = OpenAiClient::with_base_url("sk-test", &server.url()).expect("client");
    let err = client.chat(&request(None)).expect_err("429");
    match err {
        LlmError::Api { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("quota exceeded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_json_body_is_malformed() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create();

    let client = OpenAiClient::with_base_url("sk-test", &server.url()).expect("client");
    assert!(matches!(client.chat(&request(None)), Err(LlmError::Malformed(_))));
}

#[test]
fn empty_key_is_rejected() {
    assert!(matches!(OpenAiClient::new("  "), Err(LlmError::Config(_))));
}
