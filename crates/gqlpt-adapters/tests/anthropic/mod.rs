use gqlpt::{Adapter, Conversation, Message};
use gqlpt_adapters::{AnthropicAdapter, AnthropicOptions};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn message(id: &str, text: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn"
    })
}

fn adapter(server: &MockServer) -> AnthropicAdapter {
    AnthropicAdapter::new(AnthropicOptions::new("sk-ant-test").with_base_url(format!("{}/v1", server.uri()))).unwrap()
}

#[tokio::test]
async fn handshake() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-20240620",
            "max_tokens": 1024,
            "messages": [{ "role": "user", "content": "Ping" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("msg_1", "Pong")))
        .expect(1)
        .mount(&server)
        .await;

    adapter(&server).connect().await.unwrap();
}

#[tokio::test]
async fn handshake_with_unexpected_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("msg_1", "Ping?")))
        .mount(&server)
        .await;

    let error = adapter(&server).connect().await.unwrap_err();

    insta::assert_snapshot!(error, @"cannot connect to Anthropic");
}

#[tokio::test]
async fn new_conversation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(body_partial_json(json!({
            "messages": [{ "role": "user", "content": "find users" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("msg_7", "{}")))
        .expect(1)
        .mount(&server)
        .await;

    let response = adapter(&server).send_text("find users", None).await.unwrap();

    assert_eq!(response.content, "{}");
    assert_eq!(response.conversation.id(), "msg_7");
    assert_eq!(
        response.conversation.messages(),
        [Message::user("find users"), Message::assistant("{}")]
    );
}

#[tokio::test]
async fn continued_conversation_replays_the_history() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "user", "content": "find users" },
                { "role": "assistant", "content": "{}" },
                { "role": "user", "content": "fix it" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(message("msg_8", "{}")))
        .expect(1)
        .mount(&server)
        .await;

    let conversation = Conversation::new("msg_7").with_exchange("find users", "{}");
    let response = adapter(&server).send_text("fix it", Some(&conversation)).await.unwrap();

    assert_eq!(response.conversation.id(), "msg_7");
}

#[tokio::test]
async fn non_text_blocks_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_9",
            "content": [
                { "type": "tool_use", "id": "toolu_1", "name": "noop", "input": {} },
                { "type": "text", "text": "{\"query\":\"{ users { id } }\"}" }
            ]
        })))
        .mount(&server)
        .await;

    let response = adapter(&server).send_text("find users", None).await.unwrap();

    assert_eq!(response.content, "{\"query\":\"{ users { id } }\"}");
}

#[tokio::test]
async fn error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid x-api-key"))
        .mount(&server)
        .await;

    let error = adapter(&server).send_text("find users", None).await.unwrap_err();

    insta::assert_snapshot!(error, @"request failed: 401 Unauthorized: invalid x-api-key");
}
