use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gqlpt::{Error, Executor, GqlptClient, GraphqlRequest, GraphqlResponse, SendOptions};
use serde_json::json;
use url::Url;
use wiremock::{
    matchers::{body_json, body_string_contains, header, method},
    Mock, MockServer, ResponseTemplate,
};

use crate::{
    mock::{introspection_response, reply, MockAdapter},
    USER_SCHEMA,
};

const FIND_USER: &str = "{\n  user(id: \"1\") {\n    id\n    name\n  }\n}\n";

#[derive(Default)]
struct RecordingExecutor {
    requests: Mutex<Vec<GraphqlRequest>>,
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute(&self, request: GraphqlRequest) -> Result<GraphqlResponse, Error> {
        self.requests.lock().unwrap().push(request);

        Ok(GraphqlResponse {
            data: Some(json!({ "user": { "id": "1", "name": "Dan" } })),
            errors: None,
        })
    }
}

#[tokio::test]
async fn sends_to_the_introspected_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("__schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(introspection_response()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(header("x-api-key", "abc"))
        .and(body_json(json!({ "query": FIND_USER, "variables": {} })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "user": { "id": "1", "name": "Dan" } } })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = MockAdapter::new([reply(r#"{ user(id: "1") { name id } }"#)]);
    let options = adapter
        .options()
        .with_url(Url::parse(&server.uri()).unwrap())
        .with_headers([(String::from("x-api-key"), String::from("abc"))]);

    let mut client = GqlptClient::new(options).unwrap();
    client.connect().await.unwrap();

    let response = client
        .generate_and_send("find user 1", SendOptions::default())
        .await
        .unwrap();

    assert_eq!(response.data, Some(json!({ "user": { "id": "1", "name": "Dan" } })));
    assert_eq!(response.errors, None);
}

#[tokio::test]
async fn url_and_headers_can_be_overridden() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("authorization", "Bearer override"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null, "errors": [{ "message": "nope" }] })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = MockAdapter::new([reply(r#"{ user(id: "1") { name id } }"#)]);
    let mut client = GqlptClient::new(adapter.options().with_type_defs(USER_SCHEMA)).unwrap();
    client.connect().await.unwrap();

    let options = SendOptions::default()
        .with_url(Url::parse(&server.uri()).unwrap())
        .with_headers([(String::from("authorization"), String::from("Bearer override"))]);

    let response = client.generate_and_send("find user 1", options).await.unwrap();

    assert_eq!(response.data, None);
    assert_eq!(response.errors, Some(vec![json!({ "message": "nope" })]));
}

#[tokio::test]
async fn in_process_executor() {
    let executor = Arc::new(RecordingExecutor::default());
    let adapter = MockAdapter::new([json!({
        "query": "query Find($id: ID!) { user(id: $id) { name id } }",
        "variables": { "id": "1" }
    })
    .to_string()]);

    let options = adapter
        .options()
        .with_type_defs(USER_SCHEMA)
        .with_executor(executor.clone());

    let mut client = GqlptClient::new(options).unwrap();
    client.connect().await.unwrap();

    let response = client
        .generate_and_send("find user 1", SendOptions::default())
        .await
        .unwrap();

    assert_eq!(response.data, Some(json!({ "user": { "id": "1", "name": "Dan" } })));

    let requests = executor.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    insta::assert_snapshot!(requests[0].query, @r#"
    query($id: ID!) {
      user(id: $id) {
        id
        name
      }
    }
    "#);
    assert_eq!(serde_json::Value::Object(requests[0].variables.clone()), json!({ "id": "1" }));
}

#[tokio::test]
async fn a_target_is_required_before_asking_the_model() {
    let adapter = MockAdapter::new([reply(r#"{ user(id: "1") { name id } }"#)]);
    let mut client = GqlptClient::new(adapter.options().with_type_defs(USER_SCHEMA)).unwrap();
    client.connect().await.unwrap();

    let error = client
        .generate_and_send("find user 1", SendOptions::default())
        .await
        .unwrap_err();

    insta::assert_snapshot!(error, @"missing url or executor to send the generated query to");
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn error_status_is_an_execution_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let adapter = MockAdapter::new([reply(r#"{ user(id: "1") { name id } }"#)]);
    let mut client = GqlptClient::new(adapter.options().with_type_defs(USER_SCHEMA)).unwrap();
    client.connect().await.unwrap();

    let options = SendOptions::default().with_url(Url::parse(&server.uri()).unwrap());
    let error = client.generate_and_send("find user 1", options).await.unwrap_err();

    insta::assert_snapshot!(error, @"execution failed: 401 Unauthorized: unauthorized");
}
