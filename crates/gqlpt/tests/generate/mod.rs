use std::io::Write;

use gqlpt::{prompt::TYPE_GENERATION_RULES, Error, GqlptClient, NormalizedSchema};
use serde_json::json;

use crate::{
    mock::{reply, reply_with_type, MockAdapter},
    USER_SCHEMA,
};

const FIND_USER: &str = "{\n  user(id: \"1\") {\n    id\n    name\n  }\n}\n";

async fn connected(adapter: &std::sync::Arc<MockAdapter>, max_retries: usize, excluded: &[&str]) -> GqlptClient {
    let options = adapter
        .options()
        .with_type_defs(USER_SCHEMA)
        .with_max_retries(max_retries)
        .with_excluded_field_names(excluded.iter().copied());

    let mut client = GqlptClient::new(options).unwrap();
    client.connect().await.unwrap();

    client
}

#[tokio::test]
async fn end_to_end() {
    let adapter = MockAdapter::new([r#"{"query":"{ user(id: \"1\") { name id } }","variables":{}}"#]);
    let client = connected(&adapter, 5, &[]).await;

    let answer = client.generate_query_and_variables("find user 1").await.unwrap();

    assert_eq!(answer.query, FIND_USER);
    assert!(answer.variables.is_empty());

    let calls = adapter.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].conversation, None);
    assert!(calls[0].prompt.contains("\"find user 1\""));
    assert!(calls[0].prompt.contains("type Query { user(id: ID!): User users: [User!]! }"));
}

#[tokio::test]
async fn variables_are_returned() {
    let adapter = MockAdapter::new([json!({
        "query": "query GetUser($id: ID!) { user(id: $id) { name } }",
        "variables": { "id": "1" }
    })
    .to_string()]);
    let client = connected(&adapter, 5, &[]).await;

    let answer = client.generate_query_and_variables("find user 1").await.unwrap();

    insta::assert_snapshot!(answer.query, @r#"
    query($id: ID!) {
      user(id: $id) {
        name
      }
    }
    "#);
    assert_eq!(serde_json::Value::Object(answer.variables), json!({ "id": "1" }));
}

#[tokio::test]
async fn retries_are_bounded() {
    for max_retries in [0, 1, 3] {
        let adapter = MockAdapter::new([reply("{ invalidField { id } }")]);
        let client = connected(&adapter, max_retries, &[]).await;

        let error = client.generate_query_and_variables("find user 1").await.unwrap_err();

        let Error::RetryExhausted {
            attempts,
            query,
            errors,
        } = error
        else {
            unreachable!("expected retries to be exhausted, got {error:?}");
        };

        assert_eq!(adapter.calls().len(), max_retries + 1);
        assert_eq!(attempts, max_retries);
        assert_eq!(query, "{\n  invalidField {\n    id\n  }\n}\n");
        assert!(errors.iter().any(|error| error.contains("invalidField")), "{errors:?}");
    }
}

#[tokio::test]
async fn exhausted_error_message() {
    let adapter = MockAdapter::new([reply("{ invalidField }")]);
    let client = connected(&adapter, 1, &[]).await;

    let error = client.generate_query_and_variables("find user 1").await.unwrap_err();

    assert_eq!(adapter.calls().len(), 2);
    assert!(
        error
            .to_string()
            .starts_with("could not generate a valid query (repair attempts: 1): "),
        "{error}"
    );
}

#[tokio::test]
async fn repairs_continue_the_conversation() {
    let adapter = MockAdapter::new([
        reply("query Broken { invalidField { id } }"),
        reply("{ user { id } }"),
        reply(r#"{ user(id: "1") { name id } }"#),
    ]);
    let client = connected(&adapter, 5, &[]).await;

    let answer = client.generate_query_and_variables("find user 1").await.unwrap();
    assert_eq!(answer.query, FIND_USER);

    let calls = adapter.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].conversation, None);

    for (previous, call) in calls.iter().zip(calls.iter().skip(1)) {
        assert_eq!(call.conversation.as_ref(), Some(&previous.returned));
    }

    // the repair carries the canonical form of the rejected query and why it was rejected
    let repair = &calls[1].prompt;
    assert!(repair.starts_with("The previous GraphQL query attempt:"));
    assert!(repair.contains("{\n  invalidField {\n    id\n  }\n}\n"));
    assert!(repair.contains("invalidField"));
    assert!(!repair.contains("Given the following GraphQL schema"));

    assert!(calls[2].prompt.contains("{\n  user {\n    id\n  }\n}\n"));
}

#[tokio::test]
async fn excluded_fields_trigger_a_repair() {
    let adapter = MockAdapter::new([
        reply(r#"query Leak { user(id: "1") { id friends { secret } } }"#),
        reply(r#"{ user(id: "1") { name id } }"#),
    ]);
    let client = connected(&adapter, 5, &["secret"]).await;

    let answer = client.generate_query_and_variables("find user 1").await.unwrap();
    assert_eq!(answer.query, FIND_USER);

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);

    let repair = &calls[1].prompt;
    assert!(repair.contains(r#"query Leak { user(id: "1") { id friends { secret } } }"#));
    assert!(repair.contains(r#"- Field "secret" is excluded and cannot be used in a query"#));
    assert!(repair.contains("The following fields must never appear anywhere in the query:\nsecret"));
}

#[tokio::test]
async fn excluded_fields_share_the_retry_budget() {
    let adapter = MockAdapter::new([reply(r#"{ user(id: "1") { secret } }"#)]);
    let client = connected(&adapter, 2, &["secret"]).await;

    let error = client.generate_query_and_variables("find user 1").await.unwrap_err();

    assert_eq!(adapter.calls().len(), 3);
    insta::assert_snapshot!(
        error,
        @r#"could not generate a valid query (repair attempts: 2): Field "secret" is excluded and cannot be used in a query"#
    );
}

#[tokio::test]
async fn malformed_answers_use_a_retry() {
    let adapter = MockAdapter::new([
        String::from("Here is your query: { user(id: \"1\") { id name } }"),
        reply(r#"{ user(id: "1") { id name } }"#),
    ]);
    let client = connected(&adapter, 1, &[]).await;

    let answer = client.generate_query_and_variables("find user 1").await.unwrap();
    assert_eq!(answer.query, FIND_USER);

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].prompt.contains("Here is your query:"));
    assert!(calls[1].prompt.contains("- malformed response:"));
}

#[tokio::test]
async fn fenced_answers_are_accepted() {
    let fenced = format!("```json\n{}\n```", reply(r#"{ user(id: "1") { name id } }"#));
    let adapter = MockAdapter::new([fenced]);
    let client = connected(&adapter, 0, &[]).await;

    let answer = client.generate_query_and_variables("find user 1").await.unwrap();

    assert_eq!(answer.query, FIND_USER);
}

#[tokio::test]
async fn adapter_failures_are_not_retried() {
    let adapter = MockAdapter::failing_requests();
    let client = connected(&adapter, 5, &[]).await;

    let error = client.generate_query_and_variables("find user 1").await.unwrap_err();

    assert!(matches!(error, Error::Adapter(gqlpt::AdapterError::Request(_))), "{error:?}");
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn lookup_short_circuits_the_model() {
    let hash = NormalizedSchema::from_sdl(USER_SCHEMA).unwrap().hash().to_owned();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    let mut content = serde_json::Map::new();
    content.insert(
        hash.clone(),
        json!({ "find user 1": { "query": "{ user(id: \"1\") { id name } }", "variables": {} } }),
    );
    content.insert(
        String::from("some-other-schema"),
        json!({ "find all users": { "query": "{ users { id } }" } }),
    );
    let content = serde_json::Value::Object(content);
    file.write_all(content.to_string().as_bytes()).unwrap();

    let adapter = MockAdapter::new([reply("{ users { id } }")]);
    let options = adapter
        .options()
        .with_type_defs(USER_SCHEMA)
        .with_generated_path(file.path());

    let mut client = GqlptClient::new(options).unwrap();
    client.connect().await.unwrap();
    assert_eq!(client.schema_hash(), Some(hash.as_str()));

    let first = client.generate_query_and_variables("find user 1").await.unwrap();
    let second = client.generate_query_and_variables("find user 1").await.unwrap();

    assert_eq!(first.query, r#"{ user(id: "1") { id name } }"#);
    assert_eq!(first, second);
    assert!(adapter.calls().is_empty());

    // entries of other schemas are not used
    let answer = client.generate_query_and_variables("find all users").await.unwrap();
    assert_eq!(answer.query, "{\n  users {\n    id\n  }\n}\n");
    assert_eq!(adapter.calls().len(), 1);
}

#[tokio::test]
async fn generation_requires_connect() {
    let adapter = MockAdapter::new([reply("{ users { id } }")]);
    let client = GqlptClient::new(adapter.options().with_type_defs(USER_SCHEMA)).unwrap();

    let error = client.generate_query_and_variables("find user 1").await.unwrap_err();

    insta::assert_snapshot!(error, @"missing typeDefs, url or schema - have you called connect?");
    assert!(adapter.calls().is_empty());
}

#[tokio::test]
async fn build_answers_carry_a_type_definition() {
    let type_definition = "{ data: { user?: { id: string; name: string; } }; errors?: any[]; }";
    let adapter = MockAdapter::new([reply_with_type(r#"query Q { user(id: "1") { name id } }"#, type_definition)]);
    let client = connected(&adapter, 5, &[]).await;

    let answer = client.generate_query_and_type_for_build("find user 1").await.unwrap();

    assert_eq!(answer.query, FIND_USER);
    assert_eq!(answer.type_definition, type_definition);

    let calls = adapter.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains(TYPE_GENERATION_RULES));
    assert!(calls[0].prompt.contains("\"typeDefinition\""));
}

#[tokio::test]
async fn build_answers_without_type_definition_are_repaired() {
    let adapter = MockAdapter::new([
        reply(r#"{ user(id: "1") { name id } }"#),
        reply_with_type(r#"{ user(id: "1") { name id } }"#, "{ data: { user?: { id: string; name: string; } }; }"),
    ]);
    let client = connected(&adapter, 5, &[]).await;

    let answer = client.generate_query_and_type_for_build("find user 1").await.unwrap();

    assert_eq!(answer.type_definition, "{ data: { user?: { id: string; name: string; } }; }");

    let calls = adapter.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].prompt.contains("missing field `typeDefinition`"));
}
