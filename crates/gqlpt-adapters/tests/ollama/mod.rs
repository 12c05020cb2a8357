use gqlpt::{Adapter, Conversation};
use gqlpt_adapters::{OllamaAdapter, OllamaOptions};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn adapter(server: &MockServer) -> OllamaAdapter {
    OllamaAdapter::new(OllamaOptions::default().with_base_url(server.uri())).unwrap()
}

async fn mount_tags(server: &MockServer, names: &[&str]) {
    let models: Vec<_> = names.iter().map(|name| json!({ "name": name })).collect();

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": models })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn handshake_finds_a_tagged_model() {
    let server = MockServer::start().await;
    mount_tags(&server, &["mistral:latest", "llama2:latest"]).await;

    adapter(&server).connect().await.unwrap();
}

#[tokio::test]
async fn handshake_without_the_model() {
    let server = MockServer::start().await;
    mount_tags(&server, &["mistral:latest"]).await;

    let error = adapter(&server).connect().await.unwrap_err();

    insta::assert_snapshot!(error, @"cannot connect to Ollama model llama2");
}

#[tokio::test]
async fn handshake_with_unreachable_server() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = adapter(&server).connect().await.unwrap_err();

    insta::assert_snapshot!(error, @"cannot connect to Ollama");
}

#[tokio::test]
async fn system_prompt_leads_the_history() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama2",
            "stream": false,
            "messages": [
                { "role": "system", "content": "You are a helpful GraphQL query generator assistant." },
                { "role": "user", "content": "find users" },
                { "role": "assistant", "content": "{}" },
                { "role": "user", "content": "fix it" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama2",
            "created_at": "2024-06-01T10:00:00Z",
            "message": { "role": "assistant", "content": "{\"query\":\"{ users { id } }\"}" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conversation = Conversation::new("2024-06-01T09:59:00Z").with_exchange("find users", "{}");
    let response = adapter(&server).send_text("fix it", Some(&conversation)).await.unwrap();

    assert_eq!(response.content, "{\"query\":\"{ users { id } }\"}");
    assert_eq!(response.conversation.id(), "2024-06-01T09:59:00Z");
    assert_eq!(response.conversation.messages().len(), 4);
}

#[tokio::test]
async fn new_conversation_is_named_after_the_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created_at": "2024-06-01T10:00:00Z",
            "message": { "role": "assistant", "content": "{}" },
            "done": true
        })))
        .mount(&server)
        .await;

    let response = adapter(&server).send_text("find users", None).await.unwrap();

    assert_eq!(response.conversation.id(), "2024-06-01T10:00:00Z");
}
