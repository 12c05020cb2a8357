//! Prompts sent to the model.
//!
//! A fresh prompt carries the compressed schema and the question. A repair
//! prompt carries the rejected query and the reasons it was rejected, but not
//! the schema: it is sent on the same conversation, so the model already has it.

use std::{collections::BTreeSet, sync::OnceLock};

use indoc::{formatdoc, indoc};
use regex::Regex;

/// Rules for the shape of the generated operation.
pub const QUERY_GENERATION_RULES: &str = r#"Rules for generating the GraphQL query:
1. Structure:
   - Start with the operation type (query, mutation, or subscription).
   - Do not include an operation name.
   - Declare all GraphQL variables at the top of the query.

2. Fields:
   - Only include fields that are explicitly requested or necessary for the query, however, if an 'id' field is available, it should be included.
   - For nested objects, only traverse if specifically asked or crucial for the query.

3. Arguments and Input Types:
   - Always check if there's a defined input type for arguments.
   - If an input type exists (e.g., UserWhereInput), use it as the variable type and in the query.
   - Use the exact field and argument names as defined in the schema.
   - For variable arguments, use $variableName syntax.
   - Examples:
     - If schema defines: users(where: UserWhereInput): [User]
       Use: query($where: UserWhereInput) { users(where: $where) { ... } }
     - If no input type is defined: user(id: ID!): User
       Use: query($id: ID!) { user(id: $id) { ... } }

4. Variables:
   - Define all variables used in the query with their correct types.
   - For input types, declare the variable as the input type, not as an inline object.

5. Formatting:
   - Use consistent indentation (2 spaces) for nested fields.
   - Place each field and argument on a new line.

6. Fragments:
   - Only use fragments if explicitly requested or if it significantly improves query readability.

7. Always prefer input types when available:
   - Correct:   query($where: UserWhereInput) { users(where: $where) { id name } }
   - Incorrect: query($name: String) { users(where: { name: $name }) { id name } }
   - If the input type is required in the schema, it must also be required in the query."#;

/// Rules for the TypeScript type that describes the operation's result.
pub const TYPE_GENERATION_RULES: &str = r#"Rules for generating the TypeScript type definition:
1. Structure:
   - Use TypeScript syntax.
   - Provide the type definition as a plain object type.
   - Wrap the main query result in a 'data' property.
   - Include an optional 'errors' array of type 'any[]'.
2. Nesting:
   - Nest types inline (don't use separate interface declarations).
3. Types:
   - Use specific types (string, number, boolean) where appropriate.
   - Use 'any' only as a last resort for unknown types.
4. Arrays:
   - Use Type[] syntax for arrays, e.g., 'field: { id: string; name: string; }[]'.
5. Optionality:
   - Make properties optional (?) if the schema field does not have a !.
   - If the operation return type is required (annotated with !), make the 'data' property required.
   - If the operation return type is optional, make the 'data' property optional using ?.
6. Ordering:
   - Place the 'data' type before the 'errors' type.
7. Example formats:
   - Required data: { data: { user: { id: string; name: string; } }; errors?: any[]; }
   - Optional data: { data?: { user: { id: string; name: string; } }; errors?: any[]; }
8. Do not include:
   - Type aliases (e.g., 'type QueryResponse =').
   - Separate interface declarations."#;

/// The envelope the model answers with when only a query is requested.
pub const QUERY_JSON_RESPONSE_FORMAT: &str = r#"Provide your response in the following JSON format:
{
  "query": "The generated GraphQL query",
  "variables": { "key": "value" }
}

Example:
{
  "query": "query($id: ID!) { user(id: $id) { id name email } }",
  "variables": { "id": "123" }
}

Do not include any additional text or formatting outside of this JSON object."#;

/// The envelope the model answers with when a query and its result type are requested.
pub const JSON_RESPONSE_FORMAT: &str = r#"Provide your response in the following JSON format:
{
  "query": "The generated GraphQL query",
  "variables": { "key": "value" },
  "typeDefinition": "The TypeScript type definition as a plain object type"
}

Examples:
{
  "query": "query($where: UserWhereInput) { users(where: $where) { id name email } }",
  "variables": { "where": { "name": "John" } },
  "typeDefinition": "{ data: { users: { id: string; name: string; email: string; }[] }; errors?: any[]; }"
}

{
  "query": "mutation($where: PostWhereUniqueInput!, $data: PostUpdateInput!) { updatePost(where: $where, data: $data) { id title content } }",
  "variables": {
    "where": { "id": "123" },
    "data": { "title": "Updated Title", "content": "New content" }
  },
  "typeDefinition": "{ data: { updatePost: { id: string; title: string; content: string; } }; errors?: any[]; }"
}

{
  "query": "query($id: ID!) { user(id: $id) { id name posts { id title } } }",
  "variables": { "id": "456" },
  "typeDefinition": "{ data: { user: { id: string; name: string; posts: { id: string; title: string; }[] } }; errors?: any[]; }"
}

Do not include any additional text or formatting outside of this JSON object."#;

const RETURN_JSON_ONLY: &str = "Return only the JSON object and nothing else.";

/// Which JSON envelope the model is asked to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `query` and `variables`
    Query,
    /// `query`, `variables` and `typeDefinition`
    QueryWithType,
}

/// Shrinks type definitions before they are embedded in a prompt.
///
/// This is purely textual: comments go, whitespace runs collapse to one space,
/// whitespace next to quotes and escaped newlines are removed.
pub fn compress_type_defs(type_defs: &str) -> String {
    static COMMENTS: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    static AFTER_QUOTE: OnceLock<Regex> = OnceLock::new();
    static BEFORE_QUOTE: OnceLock<Regex> = OnceLock::new();

    // comments have to go first, they end at the newline that the whitespace pass removes
    let comments = COMMENTS.get_or_init(|| Regex::new(r"(?m)[ \t]*#.*$").expect("valid regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let after_quote = AFTER_QUOTE.get_or_init(|| Regex::new(r#""\s+"#).expect("valid regex"));
    let before_quote = BEFORE_QUOTE.get_or_init(|| Regex::new(r#"\s+""#).expect("valid regex"));

    let compressed = comments.replace_all(type_defs, "");
    let compressed = whitespace.replace_all(&compressed, " ");
    let compressed = after_quote.replace_all(&compressed, "\"");
    let compressed = before_quote.replace_all(&compressed, "\"");

    compressed.replace("\\n", "").trim().to_owned()
}

/// The prompt of the first attempt for a question.
pub fn build_initial_prompt(compressed_schema: &str, question: &str, format: ResponseFormat) -> String {
    let tasks = match format {
        ResponseFormat::Query => indoc! {"
            1. Generate a GraphQL query that answers the plain text query.
            2. Provide any necessary variables for the query."},
        ResponseFormat::QueryWithType => indoc! {"
            1. Generate a GraphQL query that answers the plain text query.
            2. Provide any necessary variables for the query.
            3. Based on the generated query, create a TypeScript type definition that represents the expected structure of the query result."},
    };

    formatdoc! {r#"
        Given the following GraphQL schema:

        {compressed_schema}

        And this plain text query:
        "{question}"

        Please perform the following tasks:

        {tasks}

        {rules}"#,
        rules = rules(format),
    }
}

/// The prompt that asks the model to fix its previous answer.
pub fn build_repair_prompt(
    previous_query: &str,
    errors: &[String],
    excluded_field_names: &BTreeSet<String>,
    format: ResponseFormat,
) -> String {
    let errors = errors.iter().map(|error| format!("- {error}")).collect::<Vec<_>>().join("\n");

    let exclusions = if excluded_field_names.is_empty() {
        String::new()
    } else {
        let fields = excluded_field_names.iter().map(String::as_str).collect::<Vec<_>>();
        format!(
            "\nThe following fields must never appear anywhere in the query:\n{}\n",
            fields.join(", ")
        )
    };

    formatdoc! {r#"
        The previous GraphQL query attempt:

        {previous_query}

        Failed with the following validation errors:

        {errors}
        {exclusions}
        Please generate a corrected GraphQL query that answers the original plain text query and fixes these errors.

        {rules}"#,
        rules = rules(format),
    }
}

fn rules(format: ResponseFormat) -> String {
    match format {
        ResponseFormat::Query => {
            format!("{QUERY_GENERATION_RULES}\n\n{QUERY_JSON_RESPONSE_FORMAT}\n\n{RETURN_JSON_ONLY}")
        }
        ResponseFormat::QueryWithType => format!(
            "{QUERY_GENERATION_RULES}\n\n{TYPE_GENERATION_RULES}\n\n{JSON_RESPONSE_FORMAT}\n\n{RETURN_JSON_ONLY}"
        ),
    }
}
