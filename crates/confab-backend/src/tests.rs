use crate::client::parse_reply;
use crate::error::Error;
use crate::types::{
    AgentReply, AgentRequest, BackendConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS,
    END_SESSION_QUESTION,
};
use serde_json::{json, Value};
use std::time::Duration;

#[test]
fn test_config_builder() {
    let config = BackendConfig::new()
        .with_endpoint("https://agents.example.com/invoke")
        .with_timeout(Duration::from_secs(120))
        .with_session_prefix("desk");

    assert_eq!(config.endpoint, "https://agents.example.com/invoke");
    assert_eq!(config.timeout, Duration::from_secs(120));
    assert_eq!(config.session_prefix, "desk");
}

#[test]
fn test_default_config() {
    let config = BackendConfig::default();

    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
}

#[test]
fn test_request_wire_format() {
    let request = AgentRequest::new("confab-123", "How many casual leaves per year?");
    let wire = serde_json::to_value(&request).unwrap();

    assert_eq!(
        wire,
        json!({
            "sessionId": "confab-123",
            "question": "How many casual leaves per year?",
        })
    );
    // endSession must be absent, not false, on ordinary questions
    assert!(wire.get("endSession").is_none());
}

#[test]
fn test_end_session_request() {
    let request = AgentRequest::end_session("confab-123");
    let wire = serde_json::to_value(&request).unwrap();

    assert_eq!(wire["sessionId"], "confab-123");
    assert_eq!(wire["question"], END_SESSION_QUESTION);
    assert_eq!(wire["endSession"], true);
}

#[test]
fn test_parse_reply_string_body() {
    let body = json!({
        "body": "{\"response\": \"You get 10 casual leaves.\", \"trace_data\": []}"
    })
    .to_string();

    let reply = parse_reply(&body).unwrap();
    assert_eq!(reply.answer(), "You get 10 casual leaves.");
    assert!(reply.traces().is_empty());
}

#[test]
fn test_parse_reply_inline_body() {
    let body = json!({
        "body": { "response": "hello", "trace_data": { "trace": {} } }
    })
    .to_string();

    let reply = parse_reply(&body).unwrap();
    assert_eq!(reply.answer(), "hello");
    assert_eq!(reply.traces().len(), 1);
}

#[test]
fn test_parse_reply_unwrapped_payload() {
    let body = json!({ "response": "direct", "trace_data": null }).to_string();

    let reply = parse_reply(&body).unwrap();
    assert_eq!(reply.answer(), "direct");
    assert!(reply.traces().is_empty());
}

#[test]
fn test_parse_reply_empty_body() {
    assert!(matches!(parse_reply(""), Err(Error::EmptyResponse)));
    assert!(matches!(
        parse_reply(&json!({ "body": "" }).to_string()),
        Err(Error::EmptyResponse)
    ));
    assert!(matches!(
        parse_reply(&json!({ "body": null }).to_string()),
        Err(Error::EmptyResponse)
    ));
}

#[test]
fn test_parse_reply_missing_response_field() {
    let body = json!({ "body": "{\"trace_data\": []}" }).to_string();
    assert!(matches!(parse_reply(&body), Err(Error::InvalidResponse(_))));
}

#[test]
fn test_parse_reply_malformed_json() {
    assert!(matches!(
        parse_reply("not json at all"),
        Err(Error::InvalidResponse(_))
    ));
}

#[test]
fn test_traces_from_string_payload() {
    // Backends that stringify trace_data still yield structured entries
    let reply: AgentReply = serde_json::from_value(json!({
        "response": "ok",
        "trace_data": "[{\"trace\": {}}, {\"trace\": {}}]"
    }))
    .unwrap();

    assert_eq!(reply.traces().len(), 2);
}

#[test]
fn test_traces_from_unparseable_string() {
    let reply: AgentReply = serde_json::from_value(json!({
        "response": "ok",
        "trace_data": "free-form trace text"
    }))
    .unwrap();

    let traces = reply.traces();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0], Value::String("free-form trace text".into()));
}

#[test]
fn test_non_string_answer() {
    let reply: AgentReply = serde_json::from_value(json!({
        "response": [{ "leaveId": 7, "status": "approved" }]
    }))
    .unwrap();

    // Array answers round-trip as JSON text for the table renderer
    let answer = reply.answer();
    let parsed: Value = serde_json::from_str(&answer).unwrap();
    assert_eq!(parsed[0]["status"], "approved");
}

#[test]
fn test_client_rejects_empty_endpoint() {
    let result = crate::BackendClient::new(BackendConfig::new().with_endpoint("  "));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_invoke_unreachable_backend_is_network_error() {
    // Port 1 is never bound; the connect error must map to a typed variant,
    // not bubble up as raw reqwest text.
    let client = crate::BackendClient::new(
        BackendConfig::new()
            .with_endpoint("http://127.0.0.1:1/invoke")
            .with_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let request = AgentRequest::new("confab-test", "hello");
    let result = tokio_test::block_on(client.invoke(&request));
    assert!(matches!(
        result,
        Err(Error::Network(_)) | Err(Error::Timeout(_))
    ));
}
